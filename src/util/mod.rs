//! File-system helpers shared by `set::Set` — create/open/lock/sync
//! wrappers that tag every failure through `err_at!`, adapted from the
//! teacher's `util::files` module.

use std::ffi;
use std::fs;
use std::path;

use fs2::FileExt;

use crate::err_at;
use crate::error::Result;

/// Create `file` for writing, truncating any existing contents, creating
/// parent directories as needed.
pub fn create_file_w(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    if let Some(parent) = os_file.parent() {
        if !parent.as_os_str().is_empty() {
            err_at!(IOError, fs::create_dir_all(parent), "creating {:?}", parent)?;
        }
    }
    let mut opts = fs::OpenOptions::new();
    err_at!(IOError, opts.write(true).create(true).truncate(true).open(os_file), "creating {:?}", file)
}

/// Open an existing file for reading.
pub fn open_file_r(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    err_at!(IOError, fs::OpenOptions::new().read(true).open(os_file), "opening {:?}", file)
}

/// Write `data` in full and fsync, failing loudly on a short write rather
/// than silently leaving a truncated file behind.
pub fn sync_write(file: &mut fs::File, data: &[u8]) -> Result<usize> {
    use std::io::Write;

    let n = err_at!(IOError, file.write(data), "writing")?;
    if n != data.len() {
        return err_at!(Fatal, msg: "partial write: {} of {} bytes", n, data.len());
    }
    err_at!(IOError, file.sync_all(), "fsync")?;
    Ok(n)
}

/// Hold an advisory exclusive lock on `file` for the duration of `body`,
/// so two writers never race to rename a Set file into place at once.
pub fn with_exclusive_lock<T>(file: &fs::File, body: impl FnOnce() -> Result<T>) -> Result<T> {
    err_at!(IOError, file.lock_exclusive(), "locking")?;
    let result = body();
    let _ = file.unlock();
    result
}
