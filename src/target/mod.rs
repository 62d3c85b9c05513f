use crate::error::WriteResult;
use crate::record::Record;

mod call;
mod file;
mod memory;
mod null;
mod proxy;

pub use self::call::{CallFn, CallTarget, CallTargetFactory};
pub use self::file::{FileTarget, FileTargetFactory, PathSource};
pub use self::memory::{MemoryTarget, MemoryTargetFactory, MemoryView};
pub use self::null::{NullTarget, NullTargetFactory};
pub use self::proxy::{Proxy, ProxyOptions, ProxyTarget};

/// Targets are responsible for delivering log events to their destination.
///
/// A target is owned by the worker of exactly one dispatcher, which is why
/// writing takes `&mut self` and implementations need no locking of their
/// own.
pub trait Target: Send {
    fn write(&mut self, rec: &Record) -> WriteResult;

    /// Pushes anything buffered out to the destination.
    fn flush(&mut self) -> WriteResult {
        Ok(())
    }
}
