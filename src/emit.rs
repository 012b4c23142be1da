use crate::frames::MonochromeFrame;

pub const DEFAULT_QUALIFIER: &str = "PROGMEM";

/// The count constant is a `uint8_t`.
pub const MAX_FRAMES: usize = u8::MAX as usize;

#[derive(Debug, PartialEq)]
pub enum EmitError {
    InvalidIdentifier(String),
    TooManyFrames(usize),
}

/// True if `name` is usable as a C identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => { },
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

pub fn validate_identifier(name: &str) -> Result<(), EmitError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(EmitError::InvalidIdentifier(name.to_string()))
    }
}

/// Packs one row of pixels MSB-first, 8 pixels per byte. The unused low bits
/// of a trailing partial byte stay zero.
pub fn pack_row(row: &[bool]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((row.len() + 7) / 8);
    let mut byte: u8 = 0;
    for (x, pixel) in row.iter().enumerate() {
        if *pixel {
            byte |= 1 << (7 - (x % 8));
        }
        if x % 8 == 7 || x == row.len() - 1 {
            bytes.push(byte);
            byte = 0;
        }
    }
    bytes
}

pub fn pack_frame(frame: &MonochromeFrame) -> Vec<Vec<u8>> {
    (0..frame.height()).map(|y| pack_row(frame.row(y))).collect()
}

fn format_row(bytes: &[u8]) -> String {
    let literals: Vec<String> = bytes.iter().map(|b| format!("0b{:08b}", b)).collect();
    literals.join(", ")
}

pub struct Emitter<'a> {
    prefix: &'a str,
    qualifier: &'a str,
}

impl<'a> Emitter<'a> {
    /// `qualifier` is the storage qualifier placed after each declarator;
    /// an empty string omits it.
    pub fn new(prefix: &'a str, qualifier: &'a str) -> Result<Self, EmitError> {
        validate_identifier(prefix)?;
        if !qualifier.is_empty() {
            validate_identifier(qualifier)?;
        }
        Ok(Emitter{ prefix, qualifier })
    }

    fn qualified(&self, declarator: &str) -> String {
        if self.qualifier.is_empty() {
            declarator.to_string()
        } else {
            format!("{} {}", declarator, self.qualifier)
        }
    }

    fn frame_name(&self, index: usize) -> String {
        format!("{}{}", self.prefix, index)
    }

    fn emit_frame(&self, lines: &mut Vec<String>, index: usize, frame: &MonochromeFrame) {
        let declarator = format!("{}[]", self.frame_name(index));
        lines.push(format!("const uint8_t {} = {{", self.qualified(&declarator)));
        let rows = pack_frame(frame);
        for (y, row) in rows.iter().enumerate() {
            let comma = if y < rows.len() - 1 { "," } else { "" };
            lines.push(format!("  {}{}", format_row(row), comma));
        }
        lines.push("};\n".to_string());
    }

    pub fn emit(&self, frames: &[MonochromeFrame], width: usize, height: usize) -> Result<String, EmitError> {
        if frames.len() > MAX_FRAMES {
            return Err(EmitError::TooManyFrames(frames.len()));
        }
        let mut lines = vec![ format!("// Generated from GIF: {} frames, size {}x{}", frames.len(), width, height) ];
        for (index, frame) in frames.iter().enumerate() {
            self.emit_frame(&mut lines, index, frame);
        }

        let names: Vec<String> = (0..frames.len()).map(|n| self.frame_name(n)).collect();
        let declarator = format!("{}List[]", self.prefix);
        lines.push(format!("const uint8_t* const {} = {{{}}};", self.qualified(&declarator), names.join(", ")));

        lines.push(format!("const uint8_t {}Count = {};", self.prefix, frames.len()));
        Ok(lines.join("\n"))
    }
}

/// Renders `frames` as C source using the default storage qualifier.
pub fn emit_source(frames: &[MonochromeFrame], width: usize, height: usize, prefix: &str) -> Result<String, EmitError> {
    let emitter = Emitter::new(prefix, DEFAULT_QUALIFIER)?;
    emitter.emit(frames, width, height)
}
