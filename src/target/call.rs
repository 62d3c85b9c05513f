use std::sync::Arc;

use crate::error::{ConfigError, WriteResult};
use crate::factory::Factory;
use crate::record::Record;
use crate::registry::{self, Config, Registry};
use crate::target::Target;

/// Signature of a function records can be delivered to.
pub type CallFn = dyn Fn(&Record) -> WriteResult + Send + Sync;

/// Delivers each record to a plain function.
///
/// The function is resolved by name once, when the target is built;
/// delivering a record is then a direct call with no lookup on the way.
pub struct CallTarget {
    f: Arc<CallFn>,
}

impl CallTarget {
    pub fn new(f: Arc<CallFn>) -> CallTarget {
        CallTarget { f }
    }
}

impl Target for CallTarget {
    fn write(&mut self, rec: &Record) -> WriteResult {
        (self.f)(rec)
    }
}

pub struct CallTargetFactory;

impl Factory for CallTargetFactory {
    type Item = dyn Target;

    fn ty() -> &'static str {
        "call"
    }

    fn from(&self, cfg: &Config, reg: &Registry) -> Result<Box<dyn Target>, ConfigError> {
        let name = registry::req_str(cfg, "name")?;
        let f = reg.call(name)?;

        Ok(Box::new(CallTarget::new(f)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::record::Record;
    use crate::target::Target;

    use super::CallTarget;

    #[test]
    fn each_record_invokes_the_function() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut target = CallTarget::new(Arc::new({
            let counter = counter.clone();
            move |_: &Record| {
                counter.fetch_add(1, Ordering::SeqCst);

                Ok(())
            }
        }));

        target.write(&Record::new(0, "one")).unwrap();
        target.write(&Record::new(0, "two")).unwrap();

        assert_eq!(2, counter.load(Ordering::SeqCst));
    }

    #[test]
    fn failures_pass_through() {
        let mut target = CallTarget::new(Arc::new(|_: &Record| {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "refused").into())
        }));

        assert!(target.write(&Record::new(0, "le message")).is_err());
    }
}
