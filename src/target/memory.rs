use std::sync::{Arc, Mutex};

use crate::error::{ConfigError, WriteResult};
use crate::factory::Factory;
use crate::record::Record;
use crate::registry::{self, Config, Registry};
use crate::target::Target;

/// Collects rendered lines in memory.
///
/// The paired view stays readable after the target itself has moved into a
/// dispatcher, which makes delivery observable from the outside.
pub struct MemoryTarget {
    lines: Arc<Mutex<Vec<String>>>,
}

/// Read side of a [`MemoryTarget`].
#[derive(Clone)]
pub struct MemoryView {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryTarget {
    pub fn new() -> (MemoryTarget, MemoryView) {
        let view = MemoryView::new();

        (MemoryTarget::for_view(&view), view)
    }

    /// A target feeding an existing view, so several targets can share one
    /// store.
    pub fn for_view(view: &MemoryView) -> MemoryTarget {
        MemoryTarget { lines: view.lines.clone() }
    }
}

impl Target for MemoryTarget {
    fn write(&mut self, rec: &Record) -> WriteResult {
        self.lines.lock().unwrap().push(rec.message().to_owned());

        Ok(())
    }
}

impl MemoryView {
    pub fn new() -> MemoryView {
        MemoryView { lines: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryView {
    fn default() -> MemoryView {
        MemoryView::new()
    }
}

pub struct MemoryTargetFactory;

impl Factory for MemoryTargetFactory {
    type Item = dyn Target;

    fn ty() -> &'static str {
        "memory"
    }

    fn from(&self, cfg: &Config, reg: &Registry) -> Result<Box<dyn Target>, ConfigError> {
        let name = registry::opt_str(cfg, "name")?.unwrap_or("default");
        let view = reg.memory(name);

        Ok(Box::new(MemoryTarget::for_view(&view)))
    }
}

#[cfg(test)]
mod tests {
    use crate::record::Record;
    use crate::target::Target;

    use super::MemoryTarget;

    #[test]
    fn keeps_lines_in_write_order() {
        let (mut target, view) = MemoryTarget::new();

        target.write(&Record::new(0, "first")).unwrap();
        target.write(&Record::new(0, "second")).unwrap();

        assert_eq!(vec!["first".to_owned(), "second".to_owned()], view.lines());
    }
}
