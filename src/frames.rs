use image::codecs::gif::GifDecoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;

#[derive(Debug)]
pub enum FrameError {
    IoError(std::io::Error),
    DecodeError(image::ImageError),
    EmptyCanvas,
    InvalidDimension(i32, i32),
}

impl From<std::io::Error> for FrameError {
    fn from(error: std::io::Error) -> Self {
       FrameError::IoError(error)
    }
}

impl From<image::ImageError> for FrameError {
    fn from(error: image::ImageError) -> Self {
       FrameError::DecodeError(error)
    }
}

/// Target resolution of the extracted frames; both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Result<Size, FrameError> {
        if width <= 0 || height <= 0 {
            return Err(FrameError::InvalidDimension(width, height));
        }
        Ok(Size{ width: width as usize, height: height as usize })
    }
}

/// Grid of on/off pixels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct MonochromeFrame {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl MonochromeFrame {
    /// `pixels` holds `width * height` entries.
    pub(crate) fn from_pixels(width: usize, height: usize, pixels: Vec<bool>) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        MonochromeFrame{ width, height, pixels }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn row(&self, y: usize) -> &[bool] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }
}

/// A pixel is on iff its luminance is at least `threshold`. Thresholds at or
/// below 0 turn everything on, thresholds above 255 turn everything off.
pub fn is_pixel_on(luminance: u8, threshold: i32) -> bool {
    luminance as i32 >= threshold
}

fn to_monochrome(image: DynamicImage, size: Size, threshold: i32) -> MonochromeFrame {
    let luma = image
        .resize_exact(size.width as u32, size.height as u32, FilterType::Nearest)
        .to_luma8();
    let pixels = luma.pixels().map(|p| is_pixel_on(p[0], threshold)).collect();
    MonochromeFrame::from_pixels(size.width, size.height, pixels)
}

/// Decodes every frame of the GIF in `reader`, composited as a viewer would
/// show it, resized to `width` x `height` and thresholded.
pub fn extract_frames<R: BufRead + Seek>(reader: R, width: i32, height: i32, threshold: i32) -> Result<Vec<MonochromeFrame>, FrameError> {
    let size = Size::new(width, height)?;

    let decoder = GifDecoder::new(reader)?;
    let mut frames = Vec::new();
    for frame in decoder.into_frames() {
        let buffer = frame?.into_buffer();
        if buffer.width() == 0 || buffer.height() == 0 {
            return Err(FrameError::EmptyCanvas);
        }
        debug!("frame {}: {}x{}", frames.len(), buffer.width(), buffer.height());
        frames.push(to_monochrome(DynamicImage::ImageRgba8(buffer), size, threshold));
    }
    Ok(frames)
}

pub fn load_frames(path: &Path, width: i32, height: i32, threshold: i32) -> Result<Vec<MonochromeFrame>, FrameError> {
    let file = BufReader::new(File::open(path)?);
    extract_frames(file, width, height, threshold)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use gif::{DisposalMethod, Encoder, Frame};
    use std::io::Cursor;

    // Palette indices used by the fixtures
    pub const BLACK: u8 = 0;
    pub const WHITE: u8 = 1;
    pub const GRAY_128: u8 = 2;
    pub const GRAY_127: u8 = 3;

    const PALETTE: [u8; 12] = [
        0x00, 0x00, 0x00,
        0xff, 0xff, 0xff,
        0x80, 0x80, 0x80,
        0x7f, 0x7f, 0x7f,
    ];

    pub fn encode_gif(width: u16, height: u16, frames: &[Frame]) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let mut encoder = Encoder::new(&mut data, width, height, &PALETTE).unwrap();
            for frame in frames {
                encoder.write_frame(frame).unwrap();
            }
        }
        data
    }

    pub fn solid_frame(width: u16, height: u16, color: u8) -> Frame<'static> {
        let pixels = vec![ color; width as usize * height as usize ];
        Frame::from_indexed_pixels(width, height, &pixels, None)
    }

    fn decode(data: &[u8], width: i32, height: i32, threshold: i32) -> Result<Vec<MonochromeFrame>, FrameError> {
        extract_frames(Cursor::new(data), width, height, threshold)
    }

    fn row_bits(frame: &MonochromeFrame, y: usize) -> Vec<bool> {
        frame.row(y).to_vec()
    }

    #[test]
    fn rows_are_slices_of_pixels() {
        let pixels = vec![ true, false, false, false, true, true ];
        let frame = MonochromeFrame::from_pixels(3, 2, pixels);
        assert_eq!(frame.row(0), &[ true, false, false ]);
        assert_eq!(frame.row(1), &[ false, true, true ]);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(is_pixel_on(128, 128));
        assert!(!is_pixel_on(127, 128));
    }

    #[test]
    fn threshold_out_of_range() {
        for l in [ 0u8, 1, 127, 255 ].iter() {
            assert!(is_pixel_on(*l, 0));
            assert!(is_pixel_on(*l, -20));
            assert!(!is_pixel_on(*l, 256));
            assert!(!is_pixel_on(*l, 1000));
        }
    }

    #[test]
    fn invalid_dimensions() {
        let data = encode_gif(4, 1, &[ solid_frame(4, 1, WHITE) ]);
        for &(w, h) in [ (0, 32), (128, 0), (-1, 32), (128, -5) ].iter() {
            match decode(&data, w, h, 128) {
                Err(FrameError::InvalidDimension(ew, eh)) => assert_eq!((ew, eh), (w, h)),
                other => panic!("expected InvalidDimension, got {:?}", other),
            }
        }
    }

    #[test]
    fn no_frames_is_empty() {
        let data = encode_gif(16, 1, &[]);
        let frames = decode(&data, 16, 1, 128).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn frames_in_source_order() {
        let data = encode_gif(16, 1, &[ solid_frame(16, 1, BLACK), solid_frame(16, 1, WHITE) ]);
        let frames = decode(&data, 16, 1, 128).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].row(0).iter().all(|p| !*p));
        assert!(frames[1].row(0).iter().all(|p| *p));
    }

    #[test]
    fn boundary_luminance() {
        let pixels = [ GRAY_128, GRAY_127, GRAY_128, GRAY_127 ];
        let frame = Frame::from_indexed_pixels(4, 1, &pixels, None);
        let data = encode_gif(4, 1, &[ frame ]);
        let frames = decode(&data, 4, 1, 128).unwrap();
        assert_eq!(row_bits(&frames[0], 0), vec![ true, false, true, false ]);
    }

    #[test]
    fn resized_to_target() {
        // Left half white, right half black
        let mut pixels = Vec::new();
        for _ in 0..4 {
            pixels.extend_from_slice(&[ WHITE, WHITE, BLACK, BLACK ]);
        }
        let frame = Frame::from_indexed_pixels(4, 4, &pixels, None);
        let data = encode_gif(4, 4, &[ frame ]);

        let frames = decode(&data, 8, 2, 128).unwrap();
        let frame = &frames[0];
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.height(), 2);
        for y in 0..2 {
            assert_eq!(row_bits(frame, y), vec![ true, true, true, true, false, false, false, false ]);
        }
    }

    #[test]
    fn partial_frames_are_composited() {
        let first = solid_frame(4, 1, WHITE);
        let mut second = Frame::from_indexed_pixels(2, 1, &[ BLACK, BLACK ], None);
        second.left = 2;
        let data = encode_gif(4, 1, &[ first, second ]);

        let frames = decode(&data, 4, 1, 128).unwrap();
        assert_eq!(row_bits(&frames[0], 0), vec![ true, true, true, true ]);
        assert_eq!(row_bits(&frames[1], 0), vec![ true, true, false, false ]);
    }

    #[test]
    fn background_disposal_clears() {
        let mut first = solid_frame(4, 1, WHITE);
        first.dispose = DisposalMethod::Background;
        let mut second = Frame::from_indexed_pixels(1, 1, &[ WHITE ], None);
        second.left = 3;
        let data = encode_gif(4, 1, &[ first, second ]);

        let frames = decode(&data, 4, 1, 128).unwrap();
        assert_eq!(row_bits(&frames[1], 0), vec![ false, false, false, true ]);
    }

    #[test]
    fn previous_disposal_restores() {
        let first = solid_frame(4, 1, BLACK);
        let mut second = solid_frame(4, 1, WHITE);
        second.dispose = DisposalMethod::Previous;
        let third = Frame::from_indexed_pixels(1, 1, &[ WHITE ], None);
        let data = encode_gif(4, 1, &[ first, second, third ]);

        let frames = decode(&data, 4, 1, 128).unwrap();
        assert_eq!(row_bits(&frames[1], 0), vec![ true, true, true, true ]);
        assert_eq!(row_bits(&frames[2], 0), vec![ true, false, false, false ]);
    }

    #[test]
    fn transparent_pixels_read_black() {
        let frame = Frame::from_indexed_pixels(2, 1, &[ WHITE, GRAY_127 ], Some(GRAY_127));
        let data = encode_gif(2, 1, &[ frame ]);
        let frames = decode(&data, 2, 1, 1).unwrap();
        assert_eq!(row_bits(&frames[0], 0), vec![ true, false ]);
    }

    #[test]
    fn garbage_is_decode_error() {
        let data = b"definitely not a gif";
        match decode(data, 16, 1, 128) {
            Err(FrameError::DecodeError(_)) | Err(FrameError::IoError(_)) => { },
            other => panic!("expected decode failure, got {:?}", other),
        }
    }

    #[test]
    fn deterministic() {
        let data = encode_gif(16, 1, &[ solid_frame(16, 1, GRAY_128), solid_frame(16, 1, WHITE) ]);
        let a = decode(&data, 10, 3, 128).unwrap();
        let b = decode(&data, 10, 3, 128).unwrap();
        assert_eq!(a, b);
    }
}
