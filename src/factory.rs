use crate::error::ConfigError;
use crate::registry::{Config, Registry};

/// Builds a component from a configuration source.
pub trait Factory {
    type Item: ?Sized;

    /// Returns type as a string that is used for concrete component
    /// identification in configuration sources.
    fn ty() -> &'static str
    where
        Self: Sized;

    /// Constructs a new component by configuring it with the given config.
    fn from(&self, cfg: &Config, registry: &Registry) -> Result<Box<Self::Item>, ConfigError>;
}
