//! Property interpolation dispatch for one target per frame.
//!
//! Endpoints are resolved once per (segment, property) and cached: implicit
//! start values are read from the sink the first time a segment is used.
//! Failures are reported once per (segment, property). A failure that depends
//! on the frame (an unreadable start value, a bad interpolation factor) only
//! skips that frame; one that depends on configuration (not animatable, no end
//! value, an unparseable literal) skips the property for the whole segment.
//! All writes for a target are committed with a single `apply_updates`.

use anima_api_core::Value;
use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::config::PropertyMap;
use crate::error::{PropertyError, PropertyIssue};
use crate::sink::PropertySink;

#[derive(Clone, Debug, PartialEq)]
enum Endpoints {
    Ready { from: Value, to: Value, reported: bool },
    /// Start value not available yet; resolution is retried every frame.
    Pending { reported: bool },
    Failed,
}

/// Resolution failure; `transient` ones are retried on the next frame.
struct Unresolved {
    error: PropertyError,
    transient: bool,
}

impl Unresolved {
    fn fixed(error: impl Into<PropertyError>) -> Self {
        Self {
            error: error.into(),
            transient: false,
        }
    }

    fn transient(error: impl Into<PropertyError>) -> Self {
        Self {
            error: error.into(),
            transient: true,
        }
    }
}

/// Resolved endpoints for one target, keyed by segment then property.
#[derive(Clone, Debug, Default)]
pub struct EndpointCache {
    segments: HashMap<usize, HashMap<String, Endpoints>>,
}

impl EndpointCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Number of cached (segment, property) entries.
    pub fn len(&self) -> usize {
        self.segments.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of dispatching one target for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchReport {
    pub written: usize,
    /// Newly detected issues; already-reported failures are not repeated.
    pub issues: Vec<PropertyIssue>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub commits: u64,
    pub writes: u64,
    pub issues: u64,
}

/// Segment endpoints handed to [`PropertyDispatcher::dispatch`].
#[derive(Clone, Copy, Debug)]
pub struct Segment<'a> {
    pub index: usize,
    pub from: &'a PropertyMap,
    pub to: &'a PropertyMap,
}

#[derive(Debug, Default)]
pub struct PropertyDispatcher {
    stats: DispatchStats,
}

impl PropertyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Interpolate every property in `from ∪ to` at `t` and commit the batch.
    pub fn dispatch(
        &mut self,
        target: usize,
        sink: &mut dyn PropertySink,
        segment: Segment<'_>,
        t: f64,
        cache: &mut EndpointCache,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let resolved = cache.segments.entry(segment.index).or_default();

        let keys = segment.from.keys().chain(
            segment
                .to
                .keys()
                .filter(|k| !segment.from.contains_key(k.as_str())),
        );

        for key in keys {
            if !resolved.contains_key(key.as_str()) {
                resolved.insert(key.clone(), Endpoints::Pending { reported: false });
            }
            let Some(slot) = resolved.get_mut(key.as_str()) else {
                continue;
            };

            if let Endpoints::Pending { reported } = *slot {
                match resolve_endpoints(&*sink, key, segment) {
                    Ok((from, to)) => {
                        *slot = Endpoints::Ready {
                            from,
                            to,
                            reported: false,
                        }
                    }
                    Err(Unresolved { error, transient }) => {
                        if !reported {
                            report.issues.push(issue(target, key, error));
                        }
                        *slot = if transient {
                            Endpoints::Pending { reported: true }
                        } else {
                            Endpoints::Failed
                        };
                        continue;
                    }
                }
            }

            let Endpoints::Ready { from, to, reported } = slot else {
                continue;
            };
            match sink.interpolate(key, from, to, t) {
                Ok(value) => {
                    sink.update_property(key, value);
                    report.written += 1;
                }
                Err(err) => {
                    if !*reported {
                        *reported = true;
                        report
                            .issues
                            .push(issue(target, key, PropertyError::Value(err)));
                    }
                }
            }
        }

        if report.written > 0 {
            sink.apply_updates();
            self.stats.commits += 1;
            self.stats.writes += report.written as u64;
        }
        self.stats.issues += report.issues.len() as u64;
        report
    }
}

fn resolve_endpoints(
    sink: &dyn PropertySink,
    key: &str,
    segment: Segment<'_>,
) -> Result<(Value, Value), Unresolved> {
    if !sink.is_animatable(key) {
        return Err(Unresolved::fixed(PropertyError::NotAnimatable));
    }
    let end_raw = segment
        .to
        .get(key)
        .ok_or_else(|| Unresolved::fixed(PropertyError::MissingEnd))?;
    let to = sink.parse(key, end_raw).map_err(Unresolved::fixed)?;
    let from = match segment.from.get(key) {
        Some(raw) => sink.parse(key, raw).map_err(Unresolved::fixed)?,
        None => {
            let raw = sink
                .current_value(key)
                .ok_or_else(|| Unresolved::transient(PropertyError::MissingStart))?;
            sink.parse(key, &raw).map_err(Unresolved::transient)?
        }
    };
    Ok((from, to))
}

fn issue(target: usize, key: &str, error: PropertyError) -> PropertyIssue {
    let issue = PropertyIssue {
        target,
        property: key.to_string(),
        error,
    };
    match issue.error {
        PropertyError::MissingEnd => {
            debug!(index = target, property = key, "no end value; skipped")
        }
        _ => warn!(
            index = target,
            property = key,
            category = issue.error.category(),
            "{issue}"
        ),
    }
    issue
}
