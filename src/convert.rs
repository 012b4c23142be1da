use crate::emit::{self, EmitError, Emitter};
use crate::frames::{self, FrameError, Size};
use log::{debug, info};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConvertError {
    MissingInput,
    MissingOutput,
    DecodeFailure(FrameError),
    InvalidDimension(i32, i32),
    InvalidIdentifier(String),
    TooManyFrames(usize),
    WriteFailure(std::io::Error),
}

impl From<FrameError> for ConvertError {
    fn from(error: FrameError) -> Self {
        match error {
            FrameError::InvalidDimension(width, height) => ConvertError::InvalidDimension(width, height),
            error => ConvertError::DecodeFailure(error),
        }
    }
}

impl From<EmitError> for ConvertError {
    fn from(error: EmitError) -> Self {
        match error {
            EmitError::InvalidIdentifier(name) => ConvertError::InvalidIdentifier(name),
            EmitError::TooManyFrames(count) => ConvertError::TooManyFrames(count),
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::MissingInput => write!(f, "please choose an input GIF"),
            ConvertError::MissingOutput => write!(f, "please choose an output header file"),
            ConvertError::DecodeFailure(FrameError::IoError(e)) => write!(f, "cannot read input: {}", e),
            ConvertError::DecodeFailure(FrameError::DecodeError(e)) => write!(f, "cannot decode input: {}", e),
            ConvertError::DecodeFailure(FrameError::EmptyCanvas) => write!(f, "cannot decode input: image has no pixels"),
            ConvertError::DecodeFailure(e) => write!(f, "cannot decode input: {:?}", e),
            ConvertError::InvalidDimension(width, height) => write!(f, "invalid size {}x{}: width and height must be positive", width, height),
            ConvertError::InvalidIdentifier(name) => write!(f, "'{}' is not a valid identifier", name),
            ConvertError::TooManyFrames(count) => write!(f, "{} frames do not fit the uint8_t frame count (at most 255)", count),
            ConvertError::WriteFailure(e) => write!(f, "cannot write output: {}", e),
        }
    }
}

impl std::error::Error for ConvertError { }

/// Everything one conversion needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub width: i32,
    pub height: i32,
    pub threshold: i32,
    pub prefix: String,
    pub qualifier: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: None,
            output: None,
            width: 128,
            height: 32,
            threshold: 128,
            prefix: "frame".to_string(),
            qualifier: emit::DEFAULT_QUALIFIER.to_string(),
        }
    }
}

fn given_path(path: &Option<PathBuf>) -> Option<PathBuf> {
    let path = path.as_ref()?;
    let path = match path.to_str() {
        Some(s) => PathBuf::from(s.trim()),
        None => path.clone(),
    };
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `contents` to `path` such that `path` either keeps its previous
/// state or holds all of `contents`.
pub fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = temporary_path(path);
    let result = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Runs one conversion and returns the number of frames written.
pub fn convert(config: &Config) -> Result<usize, ConvertError> {
    let input = given_path(&config.input).ok_or(ConvertError::MissingInput)?;
    let output = given_path(&config.output).ok_or(ConvertError::MissingOutput)?;
    let size = Size::new(config.width, config.height)?;
    let emitter = Emitter::new(config.prefix.trim(), config.qualifier.trim())?;

    let frames = frames::load_frames(&input, config.width, config.height, config.threshold)?;
    info!("{}: {} frames at {}x{}", input.display(), frames.len(), size.width, size.height);

    let source = emitter.emit(&frames, size.width, size.height)?;
    write_atomically(&output, source.as_bytes()).map_err(ConvertError::WriteFailure)?;
    debug!("wrote {} bytes to {}", source.len(), output.display());
    Ok(frames.len())
}
