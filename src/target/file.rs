use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, WriteResult};
use crate::factory::Factory;
use crate::file::{AppendOptions, Appender, CacheOptions};
use crate::line_ending::LineEnding;
use crate::record::Record;
use crate::registry::{self, Config, Registry};
use crate::target::Target;

/// Where a file target sends a given record.
pub enum PathSource {
    /// Every record goes to the one file.
    Fixed(PathBuf),
    /// The path is computed per record, for setups like one file per day or
    /// per severity.
    PerRecord(Box<dyn Fn(&Record) -> PathBuf + Send>),
}

impl PathSource {
    fn resolve(&self, rec: &Record) -> PathBuf {
        match *self {
            PathSource::Fixed(ref path) => path.clone(),
            PathSource::PerRecord(ref f) => f(rec),
        }
    }
}

/// Appends each record's message to a file through the shared append engine.
pub struct FileTarget {
    path: PathSource,
    appender: Appender,
}

impl FileTarget {
    pub fn new<P>(path: P, appender: Appender) -> FileTarget
    where
        P: Into<PathBuf>,
    {
        FileTarget {
            path: PathSource::Fixed(path.into()),
            appender,
        }
    }

    pub fn with_path_fn<F>(f: F, appender: Appender) -> FileTarget
    where
        F: Fn(&Record) -> PathBuf + Send + 'static,
    {
        FileTarget {
            path: PathSource::PerRecord(Box::new(f)),
            appender,
        }
    }
}

impl Target for FileTarget {
    fn write(&mut self, rec: &Record) -> WriteResult {
        let path = self.path.resolve(rec);

        self.appender.append(&path, rec.message().as_bytes())
    }

    fn flush(&mut self) -> WriteResult {
        self.appender.flush()
    }
}

pub struct FileTargetFactory;

impl Factory for FileTargetFactory {
    type Item = dyn Target;

    fn ty() -> &'static str {
        "file"
    }

    fn from(&self, cfg: &Config, reg: &Registry) -> Result<Box<dyn Target>, ConfigError> {
        let path = registry::req_str(cfg, "path")?;
        let create_dirs = registry::opt_bool(cfg, "createDirectories")?.unwrap_or(false);

        let cache_options = CacheOptions {
            capacity: registry::opt_u64(cfg, "openFileCacheSize")?.unwrap_or(1) as usize,
            idle_timeout: match registry::opt_u64(cfg, "openFileCacheTimeoutSeconds")?.unwrap_or(0) {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            create_dirs,
        };

        let line_ending = match registry::opt_str(cfg, "lineEnding")? {
            Some(name) => name.parse()?,
            None => LineEnding::Default,
        };

        let options = AppendOptions {
            line_ending,
            keep_open: registry::opt_bool(cfg, "keepFileOpen")?.unwrap_or(true),
            concurrent: registry::opt_bool(cfg, "concurrentWrites")?.unwrap_or(true),
            lock_timeout: Duration::from_millis(
                registry::opt_u64(cfg, "lockTimeoutMillis")?.unwrap_or(1000),
            ),
            create_dirs,
        };

        let appender = Appender::new(reg.file_cache(&cache_options), options);

        Ok(Box::new(FileTarget::new(path, appender)))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use crate::file::{AppendOptions, Appender, CacheOptions, FileCache};
    use crate::line_ending::LineEnding;
    use crate::record::Record;
    use crate::target::Target;

    use super::FileTarget;

    fn appender(capacity: usize) -> Appender {
        let cache = Arc::new(FileCache::new(CacheOptions {
            capacity,
            ..CacheOptions::default()
        }));

        Appender::new(cache, AppendOptions {
            line_ending: LineEnding::Lf,
            ..AppendOptions::default()
        })
    }

    #[test]
    fn fixed_path_collects_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut target = FileTarget::new(&path, appender(1));

        target.write(&Record::new(0, "one")).unwrap();
        target.write(&Record::new(0, "two")).unwrap();
        target.flush().unwrap();

        assert_eq!("one\ntwo\n", fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn computed_path_splits_by_record() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_owned();
        let mut target = FileTarget::with_path_fn(
            move |rec| root.join(format!("sev-{}.log", rec.severity())),
            appender(2),
        );

        target.write(&Record::new(1, "boom")).unwrap();
        target.write(&Record::new(3, "hello")).unwrap();
        target.write(&Record::new(1, "boom again")).unwrap();

        assert_eq!("boom\nboom again\n", fs::read_to_string(dir.path().join("sev-1.log")).unwrap());
        assert_eq!("hello\n", fs::read_to_string(dir.path().join("sev-3.log")).unwrap());
    }
}
