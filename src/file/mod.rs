//! Concurrent-safe shared-file append engine.

mod appender;
mod cache;
mod lock;

pub use self::appender::{AppendOptions, Appender};
pub use self::cache::{CacheOptions, CachedFile, FileCache};
pub use self::lock::FileLock;
