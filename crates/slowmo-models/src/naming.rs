//! File naming conventions shared by every stage of the pipeline.
//!
//! Frame files are numbered with a fixed width so lexicographic order equals
//! temporal order.

use std::path::Path;

/// Well-known archive member holding the run configuration.
pub const CONFIG_MEMBER: &str = "config.json";

/// Digits in every frame number.
pub const FRAME_NUMBER_WIDTH: usize = 7;

/// Extension that selects lossy (JPEG) encoding. Anything else is written lossless.
pub const LOSSY_EXTENSION: &str = "jpg";

/// Extensions recognized as input frames inside an archive.
pub const INPUT_FRAME_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// FFmpeg output pattern used when extracting frames from a video.
pub const EXTRACTED_FRAME_PATTERN: &str = "frame-%07d.jpg";

/// Glob FFmpeg reads when reassembling a frame directory into a video.
pub const ASSEMBLY_FRAME_GLOB: &str = "frame*.jpg";

/// Default name of an archive built from a frame folder.
pub const DEFAULT_ARCHIVE_NAME: &str = "input_frames.tar.gz";

/// File name of the output frame at `index`.
pub fn output_frame_name(index: usize) -> String {
    format!(
        "frame_{:0width$}.{}",
        index,
        LOSSY_EXTENSION,
        width = FRAME_NUMBER_WIDTH
    )
}

/// Whether `path` names an input frame (by extension, case-insensitive).
pub fn is_input_frame(path: &Path) -> bool {
    if path.file_name().and_then(|n| n.to_str()) == Some(CONFIG_MEMBER) {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            INPUT_FRAME_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
