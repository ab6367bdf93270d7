//! Frame archives.
//!
//! Input frame sets travel as tar archives, optionally compressed with gzip,
//! bzip2 or xz. The compression is detected from the magic bytes, not from a
//! file name.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, info};
use xz2::read::XzDecoder;

use crate::error::{MediaError, MediaResult};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const BZIP2_MAGIC: [u8; 3] = *b"BZh";
const XZ_MAGIC: [u8; 6] = [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];

/// Wrap `bytes` in the decompressor its magic bytes call for.
fn decompressed(bytes: &[u8]) -> Box<dyn Read + '_> {
    if bytes.starts_with(&GZIP_MAGIC) {
        Box::new(GzDecoder::new(bytes))
    } else if bytes.starts_with(&BZIP2_MAGIC) {
        Box::new(BzDecoder::new(bytes))
    } else if bytes.starts_with(&XZ_MAGIC) {
        Box::new(XzDecoder::new(bytes))
    } else {
        Box::new(bytes)
    }
}

/// Unpack archive bytes into `dest`, returning the number of members written.
///
/// Fails with [`MediaError::Extraction`] when the bytes are not a valid tar
/// stream (plain or compressed), or when a member would land outside `dest`.
pub fn unpack_archive(bytes: &[u8], dest: &Path) -> MediaResult<usize> {
    if bytes.is_empty() {
        return Err(MediaError::extraction("archive is empty"));
    }

    let mut archive = tar::Archive::new(decompressed(bytes));
    let entries = archive
        .entries()
        .map_err(|e| MediaError::extraction(e.to_string()))?;

    let mut members = 0;
    for entry in entries {
        let mut entry = entry.map_err(|e| MediaError::extraction(e.to_string()))?;
        let member = entry
            .path()
            .map_err(|e| MediaError::extraction(e.to_string()))?
            .into_owned();

        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| MediaError::extraction(format!("{}: {}", member.display(), e)))?;
        if !unpacked {
            return Err(MediaError::extraction(format!(
                "member {} escapes the extraction directory",
                member.display()
            )));
        }

        debug!(member = %member.display(), "Unpacked archive member");
        members += 1;
    }

    Ok(members)
}

/// Pack the contents of `folder` into a gzip-compressed tar at `output`.
///
/// Entries are stored at the archive root under their own names, in name
/// order. The output file is skipped if it lives inside `folder`.
pub fn make_archive(folder: impl AsRef<Path>, output: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let folder = folder.as_ref();
    let output = output.as_ref();

    if !folder.is_dir() {
        return Err(MediaError::FileNotFound(folder.to_path_buf()));
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(folder)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();

    let encoder = GzEncoder::new(File::create(output)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut added = 0usize;
    for path in entries {
        if path == output {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };

        if path.is_dir() {
            builder.append_dir_all(name, &path)?;
        } else {
            builder.append_path_with_name(&path, name)?;
        }
        added += 1;
    }

    builder.into_inner()?.finish()?;

    info!(
        folder = %folder.display(),
        output = %output.display(),
        entries = added,
        "Created frame archive"
    );
    Ok(output.to_path_buf())
}
