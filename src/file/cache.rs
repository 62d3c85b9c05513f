use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::WriteError;

#[derive(Clone, Debug)]
pub struct CacheOptions {
    /// Most handles kept open at once. Normalized to at least 1.
    pub capacity: usize,
    /// Handles idle longer than this are closed. `None` keeps them forever.
    pub idle_timeout: Option<Duration>,
    /// Create missing parent directories on open.
    pub create_dirs: bool,
}

impl Default for CacheOptions {
    fn default() -> CacheOptions {
        CacheOptions {
            capacity: 1,
            idle_timeout: None,
            create_dirs: false,
        }
    }
}

/// An open append handle owned by the cache.
///
/// Handed out as `Arc`, so eviction only drops the cache's reference; the OS
/// handle closes once the last in-flight append lets go of it.
pub struct CachedFile {
    path: PathBuf,
    ino: u64,
    opened: Instant,
    file: Mutex<File>,
}

impl CachedFile {
    fn open(path: &Path, create_dirs: bool) -> Result<CachedFile, WriteError> {
        if create_dirs {
            ensure_parent(path)?;
        }

        let file = OpenOptions::new().append(true).create(true).open(path)?;
        let ino = inode_of(&file.metadata()?);

        Ok(CachedFile {
            path: path.to_owned(),
            ino,
            opened: Instant::now(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When this handle was opened.
    pub fn opened(&self) -> Instant {
        self.opened
    }

    /// Whether the handle still points at the file its path names.
    ///
    /// Rotation or removal by another program leaves the handle attached to
    /// the old inode; such a handle must be reopened, not written.
    pub fn is_current(&self) -> bool {
        match fs::metadata(&self.path) {
            Ok(meta) => self.ino == inode_of(&meta),
            Err(..) => false,
        }
    }

    /// Serializes in-process appends to this handle and passes the open file
    /// to `f`.
    pub fn locked<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut File) -> R,
    {
        let mut file = self.file.lock().unwrap();

        f(&mut file)
    }

    fn flush(&self) -> Result<(), WriteError> {
        self.file.lock().unwrap().flush()?;

        Ok(())
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn inode_of(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;

    meta.ino()
}

#[cfg(not(unix))]
fn inode_of(_meta: &fs::Metadata) -> u64 {
    0
}

struct Slot {
    handle: Arc<CachedFile>,
    last_used: Instant,
}

/// Bounded pool of open append handles, keyed by path.
///
/// At most one handle exists per path. When the pool is full the least
/// recently used handle is evicted before a new one is opened, and handles
/// idle past the configured timeout are swept on the way in.
///
/// # Note
///
/// Double locking keeps appends to different files concurrent: the table
/// mutex is held for bookkeeping and opens only, each handle serializes its
/// own writers.
pub struct FileCache {
    options: CacheOptions,
    inner: Mutex<Inner>,
}

struct Inner {
    slots: HashMap<PathBuf, Slot>,
    closed: bool,
}

impl FileCache {
    pub fn new(options: CacheOptions) -> FileCache {
        let options = CacheOptions {
            capacity: options.capacity.max(1),
            ..options
        };

        FileCache {
            options,
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// Returns the open handle for `path`, opening one if needed.
    pub fn acquire(&self, path: &Path) -> Result<Arc<CachedFile>, WriteError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.closed {
            return Err(WriteError::Closed);
        }

        let now = Instant::now();
        sweep_expired(&mut inner.slots, self.options.idle_timeout, now);

        if let Some(slot) = inner.slots.get_mut(path) {
            slot.last_used = now;
            return Ok(slot.handle.clone());
        }

        if inner.slots.len() >= self.options.capacity {
            evict_lru(&mut inner.slots);
        }

        // Opening under the table lock keeps a second caller from racing a
        // duplicate handle for the same path.
        let handle = Arc::new(CachedFile::open(path, self.options.create_dirs)?);

        inner.slots.insert(path.to_owned(), Slot {
            handle: handle.clone(),
            last_used: now,
        });

        Ok(handle)
    }

    /// Forgets the handle for `path`; the next acquire reopens it.
    pub fn invalidate(&self, path: &Path) {
        let mut inner = self.inner.lock().unwrap();

        if let Some(slot) = inner.slots.remove(path) {
            let _ = slot.handle.flush();
        }
    }

    pub fn flush(&self) -> Result<(), WriteError> {
        let inner = self.inner.lock().unwrap();

        for slot in inner.slots.values() {
            slot.handle.flush()?;
        }

        Ok(())
    }

    /// Closes handles idle longer than the configured timeout.
    pub fn sweep(&self) {
        if self.options.idle_timeout.is_some() {
            let mut inner = self.inner.lock().unwrap();
            let now = Instant::now();

            sweep_expired(&mut inner.slots, self.options.idle_timeout, now);
        }
    }

    /// Flushes and drops every handle. Further acquires fail with `Closed`.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;

        for (_, slot) in inner.slots.drain() {
            let _ = slot.handle.flush();
        }
    }

    /// Number of handles currently held open.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sweep_expired(slots: &mut HashMap<PathBuf, Slot>, idle_timeout: Option<Duration>, now: Instant) {
    let idle_timeout = match idle_timeout {
        Some(idle_timeout) => idle_timeout,
        None => return,
    };

    slots.retain(|_, slot| {
        if now.duration_since(slot.last_used) < idle_timeout {
            true
        } else {
            let _ = slot.handle.flush();
            false
        }
    });
}

fn evict_lru(slots: &mut HashMap<PathBuf, Slot>) {
    let victim = slots
        .iter()
        .min_by_key(|&(_, slot)| slot.last_used)
        .map(|(path, _)| path.clone());

    if let Some(path) = victim {
        if let Some(slot) = slots.remove(&path) {
            let _ = slot.handle.flush();
        }
    }
}
