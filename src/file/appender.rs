use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::WriteResult;
use crate::file::cache::{self, CachedFile, FileCache};
use crate::file::lock::FileLock;
use crate::line_ending::LineEnding;

#[derive(Clone, Debug)]
pub struct AppendOptions {
    /// Terminator written after each record.
    pub line_ending: LineEnding,
    /// Keep handles open between appends through the shared cache.
    pub keep_open: bool,
    /// Hold the cross-process lock around each write.
    pub concurrent: bool,
    /// Upper bound on waiting for a contended lock.
    pub lock_timeout: Duration,
    /// Create missing parent directories on open.
    pub create_dirs: bool,
}

impl Default for AppendOptions {
    fn default() -> AppendOptions {
        AppendOptions {
            line_ending: LineEnding::Default,
            keep_open: true,
            concurrent: true,
            lock_timeout: Duration::from_secs(1),
            create_dirs: false,
        }
    }
}

/// Appends whole records to files, one OS write per record.
///
/// Writers in this process serialize on the cached handle's mutex; writers in
/// other processes are held off by the advisory file lock. Either way a
/// record and its terminator land as one contiguous write, so concurrent
/// output never tears a line.
pub struct Appender {
    cache: Arc<FileCache>,
    options: AppendOptions,
}

impl Appender {
    pub fn new(cache: Arc<FileCache>, options: AppendOptions) -> Appender {
        Appender { cache, options }
    }

    pub fn append(&self, path: &Path, message: &[u8]) -> WriteResult {
        let terminator = self.options.line_ending.as_bytes();

        let mut buf = Vec::with_capacity(message.len() + terminator.len());
        buf.extend_from_slice(message);
        buf.extend_from_slice(terminator);

        if self.options.keep_open {
            self.append_cached(path, &buf)
        } else {
            self.append_oneshot(path, &buf)
        }
    }

    /// Flushes every handle the shared cache holds.
    pub fn flush(&self) -> WriteResult {
        self.cache.flush()
    }

    pub fn shutdown(&self) {
        self.cache.shutdown();
    }

    fn append_cached(&self, path: &Path, buf: &[u8]) -> WriteResult {
        let mut handle = self.cache.acquire(path)?;

        // Rotation or removal by another program leaves the cached handle
        // attached to the old inode. Reopen once and write there instead.
        if !handle.is_current() {
            self.cache.invalidate(path);
            handle = self.cache.acquire(path)?;
        }

        match self.write_locked(&handle, buf) {
            Ok(()) => Ok(()),
            Err(err) => {
                // The next append reopens instead of hitting a broken handle.
                self.cache.invalidate(path);
                Err(err)
            }
        }
    }

    fn append_oneshot(&self, path: &Path, buf: &[u8]) -> WriteResult {
        if self.options.create_dirs {
            cache::ensure_parent(path)?;
        }

        let mut file = OpenOptions::new().append(true).create(true).open(path)?;

        let _lock = if self.options.concurrent {
            Some(FileLock::acquire(&file, path, self.options.lock_timeout)?)
        } else {
            None
        };

        file.write_all(buf)?;

        Ok(())
    }

    fn write_locked(&self, handle: &CachedFile, buf: &[u8]) -> WriteResult {
        handle.locked(|file| {
            let _lock = if self.options.concurrent {
                Some(FileLock::acquire(file, handle.path(), self.options.lock_timeout)?)
            } else {
                None
            };

            file.write_all(buf)?;

            Ok(())
        })
    }
}
