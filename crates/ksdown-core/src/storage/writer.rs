//! Segment Writer: positional writes into the destination file.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::WriteError;

/// Writes `data` at `offset` of the file at `path`, creating it if absent.
///
/// The file is never truncated and the handle is closed before returning on
/// every path. The write does not use or move a shared cursor.
pub fn write_segment(path: &Path, offset: u64, data: &[u8]) -> Result<(), WriteError> {
    let file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|source| WriteError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    write_all_at(&file, data, offset).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        offset,
        len: data.len(),
        source,
    })
}

#[cfg(unix)]
fn write_all_at(file: &File, data: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(data, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut data: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !data.is_empty() {
        match file.seek_write(data, offset) {
            Ok(0) => return Err(io::Error::new(io::ErrorKind::WriteZero, "short positional write")),
            Ok(n) => {
                data = &data[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
