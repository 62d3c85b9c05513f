use std::io;
use std::path::PathBuf;
use std::time::Duration;

use quick_error::quick_error;

quick_error! {
    /// Failure of a single write, delivered to the caller through the
    /// completion attached to the record.
    #[derive(Debug)]
    pub enum WriteError {
        Io(err: io::Error) {
            from()
            display("I/O failure: {}", err)
            source(err)
        }
        LockTimeout(path: PathBuf, waited: Duration) {
            display("append lock on {} not obtained within {:?}", path.display(), waited)
        }
        Closed {
            display("operation attempted after shutdown")
        }
        Shutdown {
            display("record discarded during shutdown")
        }
        Discarded {
            display("record rejected by the queue overflow policy")
        }
        Unavailable(name: String) {
            display("destination {:?} does not exist", name)
        }
    }
}

quick_error! {
    /// Failure while constructing components from a configuration source.
    ///
    /// Reported once, at configuration time; a component that was built
    /// successfully never reports these per record.
    #[derive(Debug)]
    pub enum ConfigError {
        Missing(field: &'static str) {
            display("field {:?} is required", field)
        }
        Invalid(field: &'static str, expected: &'static str) {
            display("field {:?} must be {}", field, expected)
        }
        UnknownType(ty: String) {
            display("no factory registered for type {:?}", ty)
        }
        UnknownCall(name: String) {
            display("no function registered under {:?}", name)
        }
    }
}

pub type WriteResult = Result<(), WriteError>;

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn io_failure_converts_and_keeps_source() {
        let err = WriteError::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));

        assert!(matches!(err, WriteError::Io(..)));
        assert!(err.source().is_some());
    }

    #[test]
    fn lock_timeout_names_the_path() {
        let err = WriteError::LockTimeout(PathBuf::from("/var/log/app.log"), Duration::from_millis(250));

        let text = err.to_string();
        assert!(text.contains("/var/log/app.log"));
    }
}
