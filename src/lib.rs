pub mod bridge;
pub mod dispatch;
pub mod file;
pub mod target;

mod completion;
mod error;
mod factory;
mod line_ending;
mod record;
mod registry;
mod severity;
mod thread;

pub use self::bridge::LogBridge;
pub use self::completion::Completion;
pub use self::dispatch::{DispatchOptions, Dispatcher, Overflow};
pub use self::error::{ConfigError, WriteError, WriteResult};
pub use self::factory::Factory;
pub use self::file::{AppendOptions, Appender, CacheOptions, FileCache};
pub use self::line_ending::LineEnding;
pub use self::record::{Meta, Record, RecordBuf};
pub use self::registry::{Config, Registry};
pub use self::severity::Severity;
pub use self::target::Target;
