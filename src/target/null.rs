use crate::error::{ConfigError, WriteResult};
use crate::factory::Factory;
use crate::record::Record;
use crate::registry::{Config, Registry};
use crate::target::Target;

/// A null target merely exists, it never delivers a record anywhere.
///
/// Exists primarily for benchmarking reasons to measure the dispatch pipeline
/// itself. It never fails, because it does nothing.
pub struct NullTarget;

impl Target for NullTarget {
    fn write(&mut self, _rec: &Record) -> WriteResult {
        Ok(())
    }
}

pub struct NullTargetFactory;

impl Factory for NullTargetFactory {
    type Item = dyn Target;

    fn ty() -> &'static str {
        "null"
    }

    fn from(&self, _cfg: &Config, _registry: &Registry) -> Result<Box<dyn Target>, ConfigError> {
        Ok(Box::new(NullTarget))
    }
}

#[cfg(test)]
mod tests {
    use crate::record::Record;
    use crate::target::Target;

    use super::NullTarget;

    #[test]
    fn swallows_everything() {
        let mut target = NullTarget;

        assert!(target.write(&Record::new(0, "le message")).is_ok());
        assert!(target.flush().is_ok());
    }
}
