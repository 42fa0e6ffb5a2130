//! Lifecycle listener contract and a recording implementation.
//!
//! Listeners are invoked synchronously from the run's state machine. Every
//! hook has a no-op default, so hosts implement only what they need.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::clock::Direction;
use crate::error::PropertyIssue;
use crate::ids::RunId;

/// Per-tick details passed alongside progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub run: RunId,
    pub iteration: u32,
    /// Position on the shared timeline, `progress * total duration`.
    pub timeline_ms: f64,
    pub direction: Direction,
    pub active_targets: usize,
    pub completed_targets: usize,
}

pub trait RunListener {
    fn on_start(&mut self, _run: RunId) {}
    fn on_update(&mut self, _progress: f64, _info: &UpdateInfo) {}
    /// Fires at most once per pass, after the final property write.
    fn on_complete(&mut self, _run: RunId) {}
    fn on_pause(&mut self, _run: RunId) {}
    fn on_resume(&mut self, _run: RunId) {}
    fn on_reverse(&mut self, _run: RunId, _direction: Direction) {}
    fn on_property_issue(&mut self, _run: RunId, _issue: &PropertyIssue) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl RunListener for NoopListener {}

/// Discrete lifecycle signals, as recorded by [`EventLog`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum RunEvent {
    Started {
        run: RunId,
    },
    Updated {
        progress: f64,
        info: UpdateInfo,
    },
    Completed {
        run: RunId,
    },
    Paused {
        run: RunId,
    },
    Resumed {
        run: RunId,
    },
    Reversed {
        run: RunId,
        direction: Direction,
    },
    PropertySkipped {
        run: RunId,
        target: usize,
        property: String,
        reason: String,
    },
}

impl RunEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::Started { .. } => "started",
            RunEvent::Updated { .. } => "updated",
            RunEvent::Completed { .. } => "completed",
            RunEvent::Paused { .. } => "paused",
            RunEvent::Resumed { .. } => "resumed",
            RunEvent::Reversed { .. } => "reversed",
            RunEvent::PropertySkipped { .. } => "property_skipped",
        }
    }
}

/// Shared, clonable event recorder. Hand one clone to the run and keep one.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<RunEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<RunEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.borrow().iter().filter(|e| e.name() == name).count()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(RunEvent::name).collect()
    }

    /// Progress values reported through `on_update`, in order.
    pub fn progress_values(&self) -> Vec<f64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                RunEvent::Updated { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: RunEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl RunListener for EventLog {
    fn on_start(&mut self, run: RunId) {
        self.push(RunEvent::Started { run });
    }

    fn on_update(&mut self, progress: f64, info: &UpdateInfo) {
        self.push(RunEvent::Updated {
            progress,
            info: *info,
        });
    }

    fn on_complete(&mut self, run: RunId) {
        self.push(RunEvent::Completed { run });
    }

    fn on_pause(&mut self, run: RunId) {
        self.push(RunEvent::Paused { run });
    }

    fn on_resume(&mut self, run: RunId) {
        self.push(RunEvent::Resumed { run });
    }

    fn on_reverse(&mut self, run: RunId, direction: Direction) {
        self.push(RunEvent::Reversed { run, direction });
    }

    fn on_property_issue(&mut self, run: RunId, issue: &PropertyIssue) {
        self.push(RunEvent::PropertySkipped {
            run,
            target: issue.target,
            property: issue.property.clone(),
            reason: issue.error.to_string(),
        });
    }
}
