//! Saving the accepted preview to disk.
//!
//! Writes are all-or-nothing. The bytes go to a temporary file created in the
//! destination's own directory (so the final rename never crosses a
//! filesystem), the file is synced, and only then renamed over the
//! destination. If anything fails the temporary is deleted when its
//! [`NamedTempFile`] handle drops, and the destination keeps whatever it held
//! before, or stays absent.

use crate::error::{CompressorError, PreconditionError};
use crate::types::CompressionResult;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot create a file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot replace {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Persist the accepted result to `destination`, returning the bytes written.
///
/// Fails with [`PreconditionError::NothingEncoded`] when there is no result,
/// before touching the filesystem.
pub fn save(
    result: Option<&CompressionResult>,
    destination: &Path,
) -> Result<u64, CompressorError> {
    let result = result.ok_or(PreconditionError::NothingEncoded)?;
    write_atomic(&result.bytes, destination)?;
    log::info!(
        "Saved {} ({} bytes, {}% compression)",
        destination.display(),
        result.byte_size(),
        result.quality.compression_percent()
    );
    Ok(result.byte_size())
}

/// Atomically replace `destination` with `bytes`.
pub fn write_atomic(bytes: &[u8], destination: &Path) -> Result<(), WriteError> {
    write_atomic_with(bytes, destination, |file, bytes| file.write_all(bytes))
}

/// [`write_atomic`] with the data-writing step supplied by the caller.
///
/// Lets tests inject failures in the middle of the write.
fn write_atomic_with<F>(bytes: &[u8], destination: &Path, fill: F) -> Result<(), WriteError>
where
    F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".img-compressor-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|source| WriteError::Create {
            dir: dir.to_path_buf(),
            source,
        })?;

    let write_err = |source: io::Error| WriteError::Write {
        path: destination.to_path_buf(),
        source,
    };
    fill(tmp.as_file_mut(), bytes).map_err(write_err)?;
    tmp.as_file_mut().flush().map_err(write_err)?;
    match_permissions(&tmp, destination).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    tmp.persist(destination)
        .map_err(|e| WriteError::Replace {
            path: destination.to_path_buf(),
            source: e.error,
        })?;
    Ok(())
}

/// Temp files are created `0600`; give the saved image the destination's
/// existing mode, or the usual `0644` for a new file.
#[cfg(unix)]
fn match_permissions(tmp: &NamedTempFile, destination: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(destination)
        .map(|m| m.permissions().mode() & 0o7777)
        .unwrap_or(0o644);
    tmp.as_file()
        .set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn match_permissions(_tmp: &NamedTempFile, _destination: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn result_with(bytes: Vec<u8>) -> CompressionResult {
        CompressionResult {
            sequence: 1,
            quality: Quality::new(0.4),
            bytes: Arc::new(bytes),
        }
    }

    /// Entries in `dir` other than the named file, e.g. leftover temp files.
    fn stray_files(dir: &Path, keep: &str) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name != keep)
            .collect()
    }

    #[test]
    fn save_without_result_is_a_precondition_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.jpg");

        let err = save(None, &dest).unwrap_err();
        assert!(matches!(
            err,
            CompressorError::Precondition(PreconditionError::NothingEncoded)
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn save_writes_exact_bytes() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.jpg");
        let result = result_with(vec![1, 2, 3, 4, 5]);

        let written = save(Some(&result), &dest).unwrap();
        assert_eq!(written, 5);
        assert_eq!(std::fs::read(&dest).unwrap(), vec![1, 2, 3, 4, 5]);
        assert!(stray_files(tmp.path(), "out.jpg").is_empty());
    }

    #[test]
    fn save_overwrites_existing_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.jpg");
        std::fs::write(&dest, b"previous content that is longer").unwrap();

        save(Some(&result_with(b"new".to_vec())), &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn missing_parent_directory_fails_cleanly() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("no-such-dir").join("out.jpg");

        let err = save(Some(&result_with(vec![9; 10])), &dest).unwrap_err();
        assert!(matches!(err, CompressorError::Write(WriteError::Create { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn destination_that_is_a_directory_fails_without_leftovers() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("taken");
        std::fs::create_dir(&dest).unwrap();

        let err = write_atomic(&[1, 2, 3], &dest).unwrap_err();
        assert!(matches!(err, WriteError::Replace { .. }));
        assert!(dest.is_dir());
        assert!(stray_files(tmp.path(), "taken").is_empty());
    }

    #[test]
    fn failure_mid_write_keeps_previous_content() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.jpg");
        std::fs::write(&dest, b"original image").unwrap();

        let err = write_atomic_with(&[7u8; 4096], &dest, |file, bytes| {
            file.write_all(&bytes[..1024])?;
            Err(io::Error::other("no space left on device"))
        })
        .unwrap_err();

        assert!(matches!(err, WriteError::Write { .. }));
        assert_eq!(std::fs::read(&dest).unwrap(), b"original image");
        assert!(stray_files(tmp.path(), "out.jpg").is_empty());
    }

    #[test]
    fn failure_mid_write_leaves_new_destination_absent() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("fresh.jpg");

        write_atomic_with(&[7u8; 4096], &dest, |file, bytes| {
            file.write_all(&bytes[..100])?;
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();

        assert!(!dest.exists());
        assert!(stray_files(tmp.path(), "fresh.jpg").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn new_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.jpg");
        write_atomic(&[1], &dest).unwrap();

        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
