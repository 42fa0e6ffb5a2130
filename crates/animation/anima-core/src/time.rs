//! Monotonic time sources.

/// Capability for reading a monotonic clock in milliseconds.
///
/// Injected into runs so hosts and tests control the notion of "now".
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by `instant::Instant` (native and wasm).
#[derive(Debug, Clone, Copy)]
pub struct InstantSource {
    origin: instant::Instant,
}

impl InstantSource {
    pub fn new() -> Self {
        Self {
            origin: instant::Instant::now(),
        }
    }
}

impl Default for InstantSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for InstantSource {
    #[inline]
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}
