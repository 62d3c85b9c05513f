use std::fs::File;
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::WriteError;

const BACKOFF_MIN: Duration = Duration::from_millis(1);
const BACKOFF_MAX: Duration = Duration::from_millis(16);

/// Advisory exclusive lock over a file, held for the duration of one append
/// and released on drop.
///
/// Other processes appending to the same file through this engine respect the
/// lock; a write never lands in the middle of a record written elsewhere.
pub struct FileLock {
    #[cfg(unix)]
    fd: std::os::unix::io::RawFd,
    #[cfg(not(unix))]
    marker: std::path::PathBuf,
}

impl FileLock {
    /// Takes the lock, retrying with capped backoff until `timeout` passes.
    pub fn acquire(file: &File, path: &Path, timeout: Duration) -> Result<FileLock, WriteError> {
        let deadline = Instant::now() + timeout;
        let mut backoff = BACKOFF_MIN;

        loop {
            if let Some(lock) = try_lock(file, path)? {
                return Ok(lock);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WriteError::LockTimeout(path.to_owned(), timeout));
            }

            thread::sleep(backoff.min(deadline - now));
            backoff = (backoff * 2).min(BACKOFF_MAX);
        }
    }
}

#[cfg(unix)]
fn try_lock(file: &File, _path: &Path) -> Result<Option<FileLock>, WriteError> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();

    loop {
        let rc = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };

        if rc == 0 {
            return Ok(Some(FileLock { fd }));
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EWOULDBLOCK) => return Ok(None),
            Some(libc::EINTR) => continue,
            _ => return Err(WriteError::Io(err)),
        }
    }
}

#[cfg(unix)]
impl Drop for FileLock {
    fn drop(&mut self) {
        unsafe {
            libc::flock(self.fd, libc::LOCK_UN);
        }
    }
}

// Platforms without flock fall back to a sibling marker file. Slower under
// contention, same exclusion guarantee.
#[cfg(not(unix))]
fn try_lock(_file: &File, path: &Path) -> Result<Option<FileLock>, WriteError> {
    use std::fs::OpenOptions;

    let marker = marker_path(path);

    match OpenOptions::new().write(true).create_new(true).open(&marker) {
        Ok(..) => Ok(Some(FileLock { marker })),
        Err(ref err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(err) => Err(WriteError::Io(err)),
    }
}

#[cfg(not(unix))]
fn marker_path(path: &Path) -> std::path::PathBuf {
    // Appended, not substituted: "app.log" pairs with "app.log.lock".
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");

    name.into()
}

#[cfg(not(unix))]
impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.marker);
    }
}
