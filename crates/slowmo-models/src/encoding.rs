//! Fixed encoding parameters for frame files and assembled videos.

/// JPEG quality used when writing lossy frames.
pub const JPEG_QUALITY: u8 = 100;

/// `-qmin` passed to FFmpeg when extracting frames.
pub const EXTRACT_QMIN: u8 = 1;
/// `-q:v` passed to FFmpeg when extracting frames (1 = best).
pub const EXTRACT_QSCALE: u8 = 1;

/// Video codec used to reassemble frames into a video.
pub const ASSEMBLY_VIDEO_CODEC: &str = "libx264";
/// Pixel format used to reassemble frames (full-range, as JPEG frames are).
pub const ASSEMBLY_PIXEL_FORMAT: &str = "yuvj420p";
/// Default output frame rate for reassembled videos.
pub const DEFAULT_FRAME_RATE: u32 = 60;
