//! Frame image codec.
//!
//! Decoding reads any 8-bit image the `image` crate understands and scales it
//! into a normalized [`FrameBuffer`]. Encoding scales back, clamps, rounds and
//! picks the container from the destination extension: `jpg` is written as a
//! quality-100 JPEG, every other extension (including `jpeg`) as PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

use slowmo_models::encoding::JPEG_QUALITY;
use slowmo_models::naming::LOSSY_EXTENSION;
use slowmo_models::FrameBuffer;

use crate::error::{MediaError, MediaResult};

const U8_MAX_F: f32 = u8::MAX as f32;

/// Container used when writing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEncoding {
    Jpeg,
    Png,
}

impl FrameEncoding {
    /// Pick the encoding for a destination path.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext == LOSSY_EXTENSION => FrameEncoding::Jpeg,
            _ => FrameEncoding::Png,
        }
    }
}

/// Decode an image file into a normalized RGB buffer.
pub fn decode_frame(path: impl AsRef<Path>) -> MediaResult<FrameBuffer> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| MediaError::codec(path, e.to_string()))?;
    decode_frame_bytes(&bytes, path)
}

/// Decode in-memory image bytes. `origin` is only used in error reports.
pub fn decode_frame_bytes(bytes: &[u8], origin: &Path) -> MediaResult<FrameBuffer> {
    let image =
        image::load_from_memory(bytes).map_err(|e| MediaError::codec(origin, e.to_string()))?;
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let data = rgb
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / U8_MAX_F)
        .collect();

    FrameBuffer::new(width, height, data).map_err(|e| MediaError::codec(origin, e.to_string()))
}

/// Encode a buffer and write it to `path`, returning the path.
pub fn encode_frame(path: impl AsRef<Path>, buffer: &FrameBuffer) -> MediaResult<PathBuf> {
    let path = path.as_ref();
    let bytes = encode_frame_bytes(buffer, FrameEncoding::for_path(path))
        .map_err(|e| MediaError::codec(path, e))?;
    std::fs::write(path, bytes)?;
    Ok(path.to_path_buf())
}

/// Encode a buffer into image bytes.
pub fn encode_frame_bytes(
    buffer: &FrameBuffer,
    encoding: FrameEncoding,
) -> Result<Vec<u8>, String> {
    let pixels = quantize(buffer.data());
    let (width, height) = buffer.dimensions();
    let mut out = Cursor::new(Vec::new());

    let result = match encoding {
        FrameEncoding::Jpeg => JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
            .write_image(&pixels, width, height, ColorType::Rgb8),
        FrameEncoding::Png => {
            PngEncoder::new(&mut out).write_image(&pixels, width, height, ColorType::Rgb8)
        }
    };

    result.map_err(|e| e.to_string())?;
    Ok(out.into_inner())
}

/// Scale `[0, 1]` samples to bytes: clamp to `[0, 255]`, then add 0.5 and truncate.
fn quantize(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|&v| ((v * U8_MAX_F).clamp(0.0, U8_MAX_F) + 0.5) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32) -> FrameBuffer {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.push(x as f32 / (width - 1) as f32);
                data.push(y as f32 / (height - 1) as f32);
                data.push(((x + y) % 256) as f32 / 255.0);
            }
        }
        FrameBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn test_encoding_dispatch_is_loose() {
        assert_eq!(FrameEncoding::for_path(Path::new("a/frame.jpg")), FrameEncoding::Jpeg);
        assert_eq!(FrameEncoding::for_path(Path::new("frame.png")), FrameEncoding::Png);
        assert_eq!(FrameEncoding::for_path(Path::new("frame.jpeg")), FrameEncoding::Png);
        assert_eq!(FrameEncoding::for_path(Path::new("frame.JPG")), FrameEncoding::Png);
        assert_eq!(FrameEncoding::for_path(Path::new("frame")), FrameEncoding::Png);
    }

    #[test]
    fn test_quantize_rounds_and_clamps() {
        assert_eq!(quantize(&[0.0, 1.0, -0.5, 2.0]), vec![0, 255, 0, 255]);
        assert_eq!(quantize(&[0.5]), vec![128]);
        assert_eq!(quantize(&[10.0 / 255.0, 10.4 / 255.0, 10.6 / 255.0]), vec![10, 10, 11]);
    }

    #[test]
    fn test_png_round_trip_is_within_one() {
        let dir = TempDir::new().unwrap();
        let original = gradient(16, 9);

        let path = encode_frame(dir.path().join("frame.png"), &original).unwrap();
        let first = decode_frame(&path).unwrap();
        assert_eq!(first.dimensions(), (16, 9));
        for (a, b) in original.data().iter().zip(first.data()) {
            assert!((a * 255.0 - b * 255.0).abs() <= 1.0);
        }

        // A second pass over 8-bit values is exact.
        let path = encode_frame(dir.path().join("again.png"), &first).unwrap();
        let second = decode_frame(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_jpeg_flat_color_round_trip() {
        let dir = TempDir::new().unwrap();
        let original = FrameBuffer::filled(16, 16, [200.0 / 255.0, 40.0 / 255.0, 90.0 / 255.0]);

        let path = encode_frame(dir.path().join("frame.jpg"), &original).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "jpg destination must hold JPEG data");

        let decoded = decode_frame(&path).unwrap();
        for (a, b) in original.data().iter().zip(decoded.data()) {
            assert!((a * 255.0 - b * 255.0).abs() <= 3.0);
        }
    }

    #[test]
    fn test_unknown_extension_writes_png() {
        let dir = TempDir::new().unwrap();
        let frame = FrameBuffer::filled(2, 2, [0.0; 3]);
        let path = encode_frame(dir.path().join("frame.bmp"), &frame).unwrap();
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_decode_rejects_corrupt_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(matches!(decode_frame(&path), Err(MediaError::Codec { .. })));
        assert!(matches!(
            decode_frame(dir.path().join("missing.jpg")),
            Err(MediaError::Codec { .. })
        ));
    }
}
