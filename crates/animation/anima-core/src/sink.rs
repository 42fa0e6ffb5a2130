//! Property sink and target resolver traits.
//!
//! Hosts implement [`PropertySink`] for each render surface. The engine only
//! holds weak references to targets; a dropped target is skipped silently.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use anima_api_core::{interpolate, RawValue, Value, ValueError};

use crate::error::{AnimaError, Result};

/// Read/write surface for one target's animatable properties.
///
/// `update_property` stages a write; nothing is visible to the target until
/// `apply_updates` commits the batch.
pub trait PropertySink {
    fn is_animatable(&self, key: &str) -> bool;

    /// Live value used as the implicit start when `from` omits a property.
    fn current_value(&self, key: &str) -> Option<RawValue>;

    fn parse(&self, key: &str, raw: &RawValue) -> std::result::Result<Value, ValueError> {
        let _ = key;
        raw.parse_default()
    }

    fn interpolate(
        &self,
        key: &str,
        a: &Value,
        b: &Value,
        t: f64,
    ) -> std::result::Result<Value, ValueError> {
        let _ = key;
        interpolate(a, b, t)
    }

    fn update_property(&mut self, key: &str, value: Value);

    fn apply_updates(&mut self);

    /// Restore the values the target had before any animation touched it.
    fn reset(&mut self);
}

pub type TargetRef = Rc<RefCell<dyn PropertySink>>;
pub type WeakTarget = Weak<RefCell<dyn PropertySink>>;

/// Wrap a sink so it can be handed to a run.
pub fn target<S: PropertySink + 'static>(sink: S) -> TargetRef {
    Rc::new(RefCell::new(sink))
}

/// Selector to target list. Hosts plug their own lookup in.
pub trait TargetResolver {
    fn resolve(&mut self, selector: &str) -> Vec<TargetRef>;
}

/// Resolve a selector, failing with `NoTargets` when nothing matches.
pub fn resolve_targets(resolver: &mut dyn TargetResolver, selector: &str) -> Result<Vec<TargetRef>> {
    let targets = resolver.resolve(selector);
    if targets.is_empty() {
        return Err(AnimaError::NoTargets {
            selector: selector.to_string(),
        });
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    #[derive(Default)]
    struct Plain {
        staged: HashMap<String, Value>,
        committed: HashMap<String, Value>,
    }

    impl PropertySink for Plain {
        fn is_animatable(&self, key: &str) -> bool {
            key != "id"
        }
        fn current_value(&self, _key: &str) -> Option<RawValue> {
            None
        }
        fn update_property(&mut self, key: &str, value: Value) {
            self.staged.insert(key.to_string(), value);
        }
        fn apply_updates(&mut self) {
            self.committed.extend(self.staged.drain());
        }
        fn reset(&mut self) {
            self.committed.clear();
        }
    }

    struct Fixed(Vec<TargetRef>);

    impl TargetResolver for Fixed {
        fn resolve(&mut self, selector: &str) -> Vec<TargetRef> {
            if selector == ".box" {
                self.0.clone()
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn default_parse_and_interpolate() {
        let sink = Plain::default();
        let a = sink.parse("left", &RawValue::from("10px")).unwrap();
        let b = sink.parse("left", &RawValue::from("30px")).unwrap();
        assert_eq!(
            sink.interpolate("left", &a, &b, 0.5).unwrap(),
            Value::length(20.0, "px")
        );
    }

    #[test]
    fn empty_resolution_is_an_error() {
        let mut r = Fixed(vec![target(Plain::default())]);
        assert_eq!(resolve_targets(&mut r, ".box").map(|t| t.len()), Ok(1));
        assert_eq!(
            resolve_targets(&mut r, "#missing").map(|t| t.len()),
            Err(AnimaError::NoTargets {
                selector: "#missing".into()
            })
        );
    }
}
