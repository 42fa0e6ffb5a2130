use std::cell::Cell;
use std::rc::Rc;

use anima_core::TimeSource;

/// Time source that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now_ms: Cell::new(start_ms),
        }
    }

    pub fn shared(start_ms: f64) -> Rc<Self> {
        Rc::new(Self::new(start_ms))
    }

    pub fn set(&self, ms: f64) {
        self.now_ms.set(ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }

    pub fn now(&self) -> f64 {
        self.now_ms.get()
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}
