extern crate gif2header;

use clap::Parser;
use gif2header::convert::{self, Config};
use std::path::PathBuf;
use std::process;

/// Convert an animated GIF into monochrome bitmap arrays for firmware
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Input GIF
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output header file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Frame width in pixels
    #[arg(short = 'W', long, default_value_t = 128, allow_negative_numbers = true)]
    width: i32,

    /// Frame height in pixels
    #[arg(short = 'H', long, default_value_t = 32, allow_negative_numbers = true)]
    height: i32,

    /// Pixels with at least this luminance (0-255) are on
    #[arg(short, long, default_value_t = 128, allow_negative_numbers = true)]
    threshold: i32,

    /// Array name prefix
    #[arg(short, long, default_value = "frame")]
    prefix: String,

    /// Storage qualifier for the arrays, empty to omit
    #[arg(short, long, default_value = "PROGMEM")]
    qualifier: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            input: args.input,
            output: args.output,
            width: args.width,
            height: args.height,
            threshold: args.threshold,
            prefix: args.prefix,
            qualifier: args.qualifier,
        }
    }
}

fn main() {
    env_logger::init();

    let config: Config = Args::parse().into();
    match convert::convert(&config) {
        Ok(count) => {
            if let Some(output) = &config.output {
                println!("Generated {} frames in: {}", count, output.display());
            }
        },
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
