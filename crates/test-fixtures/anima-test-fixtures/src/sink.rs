use std::cell::RefCell;
use std::rc::Rc;

use anima_api_core::{RawValue, Value, ValueError};
use anima_core::PropertySink;
use hashbrown::HashSet;
use indexmap::IndexMap;

/// In-memory property sink that records every commit.
///
/// - `initial` values are what `current_value` reports before any commit and
///   what `reset` restores.
/// - Writes are staged until `apply_updates`; each commit is kept in `history`.
/// - Keys listed with `with_discrete` accept any string as a step value.
#[derive(Debug, Default)]
pub struct MemorySink {
    animatable: Option<HashSet<String>>,
    discrete: HashSet<String>,
    initial: IndexMap<String, RawValue>,
    committed: IndexMap<String, Value>,
    staged: Vec<(String, Value)>,
    history: Vec<Vec<(String, Value)>>,
    resets: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, raw: impl Into<RawValue>) -> Self {
        self.initial.insert(key.into(), raw.into());
        self
    }

    /// Change what the target reports before any commit.
    pub fn set_initial(&mut self, key: impl Into<String>, raw: impl Into<RawValue>) {
        self.initial.insert(key.into(), raw.into());
    }

    /// Restrict animatable keys; by default every key is animatable.
    pub fn only_animatable(mut self, keys: &[&str]) -> Self {
        self.animatable = Some(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn with_discrete(mut self, key: impl Into<String>) -> Self {
        self.discrete.insert(key.into());
        self
    }

    pub fn shared(self) -> Rc<RefCell<MemorySink>> {
        Rc::new(RefCell::new(self))
    }

    /// Last committed value.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.committed.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<f64> {
        self.committed.get(key).and_then(Value::as_f64)
    }

    pub fn commit_count(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[Vec<(String, Value)>] {
        &self.history
    }

    pub fn last_commit(&self) -> Option<&[(String, Value)]> {
        self.history.last().map(Vec::as_slice)
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    pub fn reset_count(&self) -> usize {
        self.resets
    }
}

impl PropertySink for MemorySink {
    fn is_animatable(&self, key: &str) -> bool {
        self.animatable
            .as_ref()
            .map_or(true, |keys| keys.contains(key))
    }

    fn current_value(&self, key: &str) -> Option<RawValue> {
        self.committed
            .get(key)
            .cloned()
            .map(RawValue::Value)
            .or_else(|| self.initial.get(key).cloned())
    }

    fn parse(&self, key: &str, raw: &RawValue) -> Result<Value, ValueError> {
        match raw {
            RawValue::Text(s) if self.discrete.contains(key) => Ok(Value::Discrete(s.clone())),
            _ => raw.parse_default(),
        }
    }

    fn update_property(&mut self, key: &str, value: Value) {
        self.staged.push((key.to_string(), value));
    }

    fn apply_updates(&mut self) {
        let batch = std::mem::take(&mut self.staged);
        for (key, value) in &batch {
            self.committed.insert(key.clone(), value.clone());
        }
        self.history.push(batch);
    }

    fn reset(&mut self) {
        self.staged.clear();
        self.committed.clear();
        self.resets += 1;
    }
}
