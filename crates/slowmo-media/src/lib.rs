//! Frame codec, archives and FFmpeg CLI wrapper.
//!
//! This crate provides:
//! - Decoding and encoding of frame images to normalized buffers
//! - Unique working directory allocation
//! - Frame archive packing and unpacking
//! - Type-safe FFmpeg command building with progress parsing
//! - Frame extraction from, and reassembly into, videos

pub mod archive;
pub mod codec;
pub mod command;
pub mod error;
pub mod progress;
pub mod video;
pub mod workdir;

pub use archive::{make_archive, unpack_archive};
pub use codec::{decode_frame, encode_frame, FrameEncoding};
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
pub use video::{create_video, extract_frames, VideoAssembler};
pub use workdir::{allocate_workdir, allocate_workdir_with};
