//! Creating and pre-sizing destination files.

use std::fs::File;
use std::path::Path;

#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

use crate::error::WriteError;

/// Creates `path` if absent and sizes it to exactly `size` bytes.
///
/// An existing file is not truncated to zero first; it is grown or shrunk to
/// `size`. On Linux, blocks are then reserved with `posix_fallocate`
/// when the filesystem supports it.
pub fn prepare_destination(path: &Path, size: u64) -> Result<(), WriteError> {
    let file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|source| WriteError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    file.set_len(size).map_err(|source| WriteError::Presize {
        path: path.to_path_buf(),
        size,
        source,
    })?;

    #[cfg(target_os = "linux")]
    {
        if size > 0 {
            let fd = file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r != 0 {
                tracing::debug!(errno = r, path = %path.display(), "posix_fallocate failed, keeping sparse file");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_and_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.bin");
        prepare_destination(&path, 1234).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1234);
    }

    #[test]
    fn resizes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.bin");
        std::fs::write(&path, vec![1u8; 500]).unwrap();
        prepare_destination(&path, 100).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1u8; 100]);
    }

    #[test]
    fn zero_size_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        prepare_destination(&path, 0).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn missing_directory_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/file.bin");
        assert!(matches!(
            prepare_destination(&path, 10),
            Err(WriteError::Open { .. })
        ));
    }
}
