use std::time::Duration;

use log::{LevelFilter, Log, Metadata, SetLoggerError};

use crate::completion::Completion;
use crate::dispatch::Dispatcher;
use crate::record::{Meta, Record, RecordBuf};

const FLUSH_WAIT: Duration = Duration::from_secs(1);

/// Feeds records from the standard `log` macros into a set of dispatchers.
///
/// Each log call becomes one record fanned out to every dispatcher; the
/// module path travels along as meta information. The bridge itself does not
/// wait for delivery, `flush` does.
pub struct LogBridge {
    dispatchers: Vec<Dispatcher>,
    level: LevelFilter,
}

impl LogBridge {
    pub fn new(dispatchers: Vec<Dispatcher>) -> LogBridge {
        LogBridge {
            dispatchers,
            level: LevelFilter::Trace,
        }
    }

    /// Caps the severity the bridge lets through.
    pub fn level(mut self, level: LevelFilter) -> LogBridge {
        self.level = level;
        self
    }

    /// Installs the bridge as the process-wide logger.
    pub fn install(self) -> Result<(), SetLoggerError> {
        log::set_max_level(self.level);
        log::set_boxed_logger(Box::new(self))
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = record.args().to_string();
        let module = record.module_path().unwrap_or("");
        let meta = [Meta::new("module", module)];

        let rec = Record::with_meta(record.level(), &message, &meta);
        let buf = RecordBuf::from(&rec);

        for dispatcher in &self.dispatchers {
            dispatcher.write(buf.clone(), Completion::noop());
        }
    }

    fn flush(&self) {
        for dispatcher in &self.dispatchers {
            let (completion, rx) = Completion::pair();
            dispatcher.flush(completion);

            let _ = rx.recv_timeout(FLUSH_WAIT);
        }
    }
}
