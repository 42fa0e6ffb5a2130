use hashbrown::HashMap;

use anima_core::{TargetRef, TargetResolver};

/// Selector table: exact selector strings map to fixed target lists.
#[derive(Default)]
pub struct NamedResolver {
    entries: HashMap<String, Vec<TargetRef>>,
}

impl NamedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: impl Into<String>, targets: Vec<TargetRef>) -> Self {
        self.insert(selector, targets);
        self
    }

    pub fn insert(&mut self, selector: impl Into<String>, targets: Vec<TargetRef>) {
        self.entries.insert(selector.into(), targets);
    }
}

impl TargetResolver for NamedResolver {
    fn resolve(&mut self, selector: &str) -> Vec<TargetRef> {
        self.entries.get(selector).cloned().unwrap_or_default()
    }
}
