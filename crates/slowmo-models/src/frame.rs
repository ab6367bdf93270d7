//! In-memory frame representation.
//!
//! Frames are 3-channel RGB images with `f32` samples normalized to `[0, 1]`.
//! A [`FrameSequence`] owns its frames and assigns indices itself, so the
//! index of every frame always equals its position in temporal order.

use thiserror::Error;

/// Number of color channels carried by every frame buffer (RGB).
pub const CHANNELS: usize = 3;

/// Errors raised when constructing a frame buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameBufferError {
    #[error("buffer holds {actual} samples, expected {expected} for {width}x{height} RGB")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A 3-channel RGB image with samples in `[0, 1]`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl FrameBuffer {
    /// Wrap raw interleaved RGB samples.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self, FrameBufferError> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(FrameBufferError::SizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Create a buffer where every pixel has the same color.
    pub fn filled(width: u32, height: u32, rgb: [f32; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Interleaved samples, `width * height * 3` long.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// RGB samples of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    pub fn same_dimensions(&self, other: &FrameBuffer) -> bool {
        self.dimensions() == other.dimensions()
    }
}

/// A frame at a fixed position of the final sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: usize,
    pub buffer: FrameBuffer,
}

/// Ordered list of frames where insertion order is temporal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
        }
    }

    /// Append a buffer as the next frame and return its index.
    pub fn push(&mut self, buffer: FrameBuffer) -> usize {
        let index = self.frames.len();
        self.frames.push(Frame { index, buffer });
        index
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Drop the indices and keep the buffers in order.
    pub fn into_buffers(self) -> Vec<FrameBuffer> {
        self.frames.into_iter().map(|frame| frame.buffer).collect()
    }
}

impl Extend<FrameBuffer> for FrameSequence {
    fn extend<T: IntoIterator<Item = FrameBuffer>>(&mut self, iter: T) {
        for buffer in iter {
            self.push(buffer);
        }
    }
}

impl FromIterator<FrameBuffer> for FrameSequence {
    fn from_iter<T: IntoIterator<Item = FrameBuffer>>(iter: T) -> Self {
        let mut sequence = FrameSequence::new();
        sequence.extend(iter);
        sequence
    }
}

impl IntoIterator for FrameSequence {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer_rejects_wrong_size() {
        let err = FrameBuffer::new(2, 2, vec![0.0; 11]).unwrap_err();
        assert_eq!(
            err,
            FrameBufferError::SizeMismatch {
                width: 2,
                height: 2,
                expected: 12,
                actual: 11
            }
        );
    }

    #[test]
    fn test_filled_buffer_pixels() {
        let buffer = FrameBuffer::filled(3, 2, [1.0, 0.5, 0.0]);
        assert_eq!(buffer.data().len(), 18);
        assert_eq!(buffer.pixel(2, 1), Some([1.0, 0.5, 0.0]));
        assert_eq!(buffer.pixel(3, 0), None);
    }

    #[test]
    fn test_sequence_assigns_contiguous_indices() {
        let sequence: FrameSequence = (0..4)
            .map(|i| FrameBuffer::filled(1, 1, [i as f32 / 4.0; 3]))
            .collect();

        let indices: Vec<usize> = sequence.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(sequence.frames()[2].buffer.pixel(0, 0), Some([0.5; 3]));
    }
}
