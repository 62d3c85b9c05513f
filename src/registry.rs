use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use crate::dispatch::{DispatchOptions, Dispatcher};
use crate::error::{ConfigError, WriteResult};
use crate::factory::Factory;
use crate::file::{CacheOptions, FileCache};
use crate::record::Record;
use crate::target::{
    CallFn, CallTargetFactory, FileTargetFactory, MemoryTargetFactory, MemoryView,
    NullTargetFactory, Target,
};

pub type Config = Value;

type CacheKey = (usize, Option<Duration>, bool);

/// Holds the component factories and the resources they share.
///
/// Identically configured file targets built through one registry append
/// through one handle cache, and memory targets registered under one name
/// feed one line store.
#[derive(Default)]
pub struct Registry {
    targets: HashMap<&'static str, Box<dyn Factory<Item = dyn Target>>>,
    calls: HashMap<String, Arc<CallFn>>,
    caches: Mutex<HashMap<CacheKey, Arc<FileCache>>>,
    memories: Mutex<HashMap<String, MemoryView>>,
}

impl Registry {
    pub fn new() -> Registry {
        let mut result = Registry::default();
        result.targets.insert(FileTargetFactory::ty(), Box::new(FileTargetFactory));
        result.targets.insert(MemoryTargetFactory::ty(), Box::new(MemoryTargetFactory));
        result.targets.insert(NullTargetFactory::ty(), Box::new(NullTargetFactory));
        result.targets.insert(CallTargetFactory::ty(), Box::new(CallTargetFactory));

        result
    }

    /// Builds a target from its configuration.
    pub fn target(&self, cfg: &Config) -> Result<Box<dyn Target>, ConfigError> {
        let ty = cfg.get("type")
            .ok_or(ConfigError::Missing("type"))?
            .as_str()
            .ok_or(ConfigError::Invalid("type", "a string"))?;

        self.targets.get(ty)
            .ok_or_else(|| ConfigError::UnknownType(ty.into()))?
            .from(cfg, self)
    }

    /// Builds a dispatcher together with its target from one configuration
    /// block.
    pub fn dispatcher(&self, cfg: &Config) -> Result<Dispatcher, ConfigError> {
        let target = self.target(cfg)?;

        let overflow = match opt_str(cfg, "overflowAction")? {
            Some(name) => name.parse()?,
            None => DispatchOptions::default().overflow,
        };

        let options = DispatchOptions {
            ordered: opt_bool(cfg, "ordered")?.unwrap_or(true),
            workers: opt_u64(cfg, "workers")?.unwrap_or(1) as usize,
            queue_limit: opt_u64(cfg, "queueLimit")?.unwrap_or(10_000) as usize,
            overflow,
            drain: Duration::from_millis(opt_u64(cfg, "drainMillis")?.unwrap_or(1000)),
        };

        Ok(Dispatcher::new(target, options))
    }

    /// Registers a function records can be routed to by name.
    pub fn register_call<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Record) -> WriteResult + Send + Sync + 'static,
    {
        self.calls.insert(name.into(), Arc::new(f));
    }

    /// Resolves a registered function.
    ///
    /// Resolution happens once, while a target is being built, never per
    /// record.
    pub fn call(&self, name: &str) -> Result<Arc<CallFn>, ConfigError> {
        self.calls.get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownCall(name.into()))
    }

    /// Returns the handle cache shared by every file target built with the
    /// same cache configuration.
    pub fn file_cache(&self, options: &CacheOptions) -> Arc<FileCache> {
        let key = (options.capacity, options.idle_timeout, options.create_dirs);
        let mut caches = self.caches.lock().unwrap();

        caches.entry(key)
            .or_insert_with(|| Arc::new(FileCache::new(options.clone())))
            .clone()
    }

    /// Returns the named line store, shared with every memory target built
    /// under that name.
    pub fn memory(&self, name: &str) -> MemoryView {
        let mut memories = self.memories.lock().unwrap();

        memories.entry(name.into()).or_insert_with(MemoryView::new).clone()
    }
}

pub(crate) fn opt_bool(cfg: &Config, field: &'static str) -> Result<Option<bool>, ConfigError> {
    match cfg.get(field) {
        Some(value) => value.as_bool().map(Some).ok_or(ConfigError::Invalid(field, "a boolean")),
        None => Ok(None),
    }
}

pub(crate) fn opt_u64(cfg: &Config, field: &'static str) -> Result<Option<u64>, ConfigError> {
    match cfg.get(field) {
        Some(value) => {
            value.as_u64().map(Some).ok_or(ConfigError::Invalid(field, "a non-negative integer"))
        }
        None => Ok(None),
    }
}

pub(crate) fn opt_str<'a>(cfg: &'a Config, field: &'static str) -> Result<Option<&'a str>, ConfigError> {
    match cfg.get(field) {
        Some(value) => value.as_str().map(Some).ok_or(ConfigError::Invalid(field, "a string")),
        None => Ok(None),
    }
}

pub(crate) fn req_str<'a>(cfg: &'a Config, field: &'static str) -> Result<&'a str, ConfigError> {
    cfg.get(field)
        .ok_or(ConfigError::Missing(field))?
        .as_str()
        .ok_or(ConfigError::Invalid(field, "a string"))
}
