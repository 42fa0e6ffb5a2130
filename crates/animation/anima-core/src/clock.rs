//! Clock: wall-clock samples to elapsed animation time to normalized progress.
//!
//! Elapsed time is tracked as an anchor pair `(base, reference)`:
//! `elapsed(now) = base + (now - reference) * time_scale * direction`.
//! Pause, resume, reverse, seek and time-scale changes all re-base the anchor
//! so elapsed time never jumps. Progress and iteration are recomputed from
//! elapsed time on every sample instead of being integrated frame by frame.

use serde::{Deserialize, Serialize};

use crate::config::Repeat;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// Result of mapping elapsed time to progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    /// Reported progress, always within [0, 1].
    pub progress: f64,
    pub iteration: u32,
    pub should_complete: bool,
    /// Unwrapped `elapsed / duration`; may exceed 1 or go negative.
    pub raw: f64,
}

/// Map elapsed time to progress with repeat and yoyo semantics.
///
/// - single pass: `clamp(raw, 0, 1)`, complete once `raw >= 1`
/// - infinite: iteration `floor(|raw|)`, progress `|raw| mod 1`, flipped on odd
///   iterations when `yoyo`; never completes
/// - `Count(n)`: complete with progress 1 once `|raw| >= n`, otherwise as infinite
///
/// A non-positive duration completes immediately at progress 1.
pub fn progress_at(elapsed_ms: f64, duration_ms: f64, repeat: Repeat, yoyo: bool) -> ProgressSample {
    if duration_ms <= 0.0 {
        return ProgressSample {
            progress: 1.0,
            iteration: 0,
            should_complete: true,
            raw: 1.0,
        };
    }
    let raw = elapsed_ms / duration_ms;
    match repeat {
        r if r.is_single_pass() => ProgressSample {
            progress: raw.clamp(0.0, 1.0),
            iteration: 0,
            should_complete: raw >= 1.0,
            raw,
        },
        Repeat::Count(n) if raw.abs() >= n as f64 => ProgressSample {
            progress: 1.0,
            iteration: n,
            should_complete: true,
            raw,
        },
        _ => {
            let (progress, iteration) = wrap(raw, yoyo);
            ProgressSample {
                progress,
                iteration,
                should_complete: false,
                raw,
            }
        }
    }
}

fn wrap(raw: f64, yoyo: bool) -> (f64, u32) {
    let a = raw.abs();
    let iteration = a.floor();
    let mut progress = a - iteration;
    let iteration = iteration as u32;
    if yoyo && iteration % 2 == 1 {
        progress = 1.0 - progress;
    }
    (progress, iteration)
}

/// Per-run clock. Every method that depends on "now" takes it explicitly; the
/// run reads its time source once per tick and passes the sample down.
#[derive(Clone, Debug, PartialEq)]
pub struct Clock {
    duration_ms: f64,
    time_scale: f64,
    direction: Direction,
    reference_ms: Option<f64>,
    base_elapsed_ms: f64,
    frozen_elapsed_ms: Option<f64>,
    paused_since_ms: Option<f64>,
    paused_total_ms: f64,
    iteration: u32,
}

impl Clock {
    pub fn new(duration_ms: f64, time_scale: f64) -> Self {
        Self {
            duration_ms: duration_ms.max(0.0),
            time_scale,
            direction: Direction::Forward,
            reference_ms: None,
            base_elapsed_ms: 0.0,
            frozen_elapsed_ms: None,
            paused_since_ms: None,
            paused_total_ms: 0.0,
            iteration: 0,
        }
    }

    #[inline]
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Total wall time spent paused since the last reset.
    #[inline]
    pub fn paused_total_ms(&self) -> f64 {
        self.paused_total_ms
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.reference_ms.is_some()
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen_elapsed_ms.is_some()
    }

    /// Anchor at `now_ms`, continuing from the current base (0 after reset,
    /// or a position set by `seek_to`).
    pub fn start(&mut self, now_ms: f64) {
        self.reference_ms = Some(now_ms);
        self.frozen_elapsed_ms = None;
        self.paused_since_ms = None;
    }

    /// Freeze elapsed time and return it. Already paused: returns the frozen value.
    pub fn pause(&mut self, now_ms: f64) -> f64 {
        if let Some(frozen) = self.frozen_elapsed_ms {
            return frozen;
        }
        let elapsed = self.elapsed(now_ms);
        self.frozen_elapsed_ms = Some(elapsed);
        self.paused_since_ms = Some(now_ms);
        elapsed
    }

    /// Continue from the frozen value with no time jump.
    pub fn resume(&mut self, now_ms: f64) {
        let Some(frozen) = self.frozen_elapsed_ms.take() else {
            return;
        };
        if let Some(since) = self.paused_since_ms.take() {
            self.paused_total_ms += (now_ms - since).max(0.0);
        }
        self.base_elapsed_ms = frozen;
        self.reference_ms = Some(now_ms);
    }

    pub fn reset(&mut self) {
        self.reference_ms = None;
        self.base_elapsed_ms = 0.0;
        self.frozen_elapsed_ms = None;
        self.paused_since_ms = None;
        self.paused_total_ms = 0.0;
        self.iteration = 0;
        self.direction = Direction::Forward;
    }

    /// Flip direction; elapsed time at `now_ms` is unchanged by the flip.
    pub fn reverse(&mut self, now_ms: f64) -> Direction {
        self.rebase(now_ms);
        self.direction = self.direction.flipped();
        self.direction
    }

    /// Change playback speed without moving the current position.
    pub fn set_time_scale(&mut self, time_scale: f64, now_ms: f64) {
        self.rebase(now_ms);
        self.time_scale = time_scale;
    }

    /// Set elapsed time to `progress * duration` (first pass), independent of
    /// real time.
    pub fn seek_to(&mut self, progress: f64, now_ms: f64) {
        let target = progress * self.duration_ms;
        self.iteration = 0;
        if self.frozen_elapsed_ms.is_some() {
            self.frozen_elapsed_ms = Some(target);
        } else {
            self.base_elapsed_ms = target;
            if self.reference_ms.is_some() {
                self.reference_ms = Some(now_ms);
            }
        }
    }

    /// `base + (now - reference) * time_scale * direction`.
    pub fn elapsed(&self, now_ms: f64) -> f64 {
        if let Some(frozen) = self.frozen_elapsed_ms {
            return frozen;
        }
        match self.reference_ms {
            Some(reference) => {
                self.base_elapsed_ms
                    + (now_ms - reference) * self.time_scale * self.direction.sign()
            }
            None => self.base_elapsed_ms,
        }
    }

    pub fn compute_progress(&mut self, now_ms: f64, repeat: Repeat, yoyo: bool) -> ProgressSample {
        let sample = progress_at(self.elapsed(now_ms), self.duration_ms, repeat, yoyo);
        self.iteration = sample.iteration;
        sample
    }

    fn rebase(&mut self, now_ms: f64) {
        if self.frozen_elapsed_ms.is_some() {
            return;
        }
        self.base_elapsed_ms = self.elapsed(now_ms);
        if self.reference_ms.is_some() {
            self.reference_ms = Some(now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn single_pass_is_linear() {
        for e in [0.0, 125.0, 500.0, 999.0, 1000.0] {
            let s = progress_at(e, 1000.0, Repeat::Count(1), false);
            assert_eq!(s.progress, e / 1000.0);
            assert_eq!(s.iteration, 0);
        }
        assert!(!progress_at(999.0, 1000.0, Repeat::Count(1), false).should_complete);
        assert!(progress_at(1000.0, 1000.0, Repeat::Count(0), false).should_complete);
        assert_eq!(progress_at(-50.0, 1000.0, Repeat::Count(1), false).progress, 0.0);
    }

    #[test]
    fn infinite_yoyo_probe() {
        let s = progress_at(1200.0, 1000.0, Repeat::Infinite, true);
        assert_eq!(s.iteration, 1);
        assert!(approx(s.progress, 0.8, 1e-9));
        assert!(!s.should_complete);

        let s = progress_at(500.0, 1000.0, Repeat::Infinite, true);
        assert_eq!(s.iteration, 0);
        assert!(approx(s.progress, 0.5, 1e-9));

        let s = progress_at(1200.0, 1000.0, Repeat::Infinite, false);
        assert!(approx(s.progress, 0.2, 1e-9));
    }

    #[test]
    fn finite_repeat_completes_at_n() {
        let s = progress_at(2500.0, 1000.0, Repeat::Count(3), false);
        assert_eq!(s.iteration, 2);
        assert!(approx(s.progress, 0.5, 1e-9));
        assert!(!s.should_complete);

        let s = progress_at(3000.0, 1000.0, Repeat::Count(3), true);
        assert_eq!(s.iteration, 3);
        assert_eq!(s.progress, 1.0);
        assert!(s.should_complete);
    }

    #[test]
    fn zero_duration_completes() {
        let s = progress_at(0.0, 0.0, Repeat::Infinite, true);
        assert_eq!(s.progress, 1.0);
        assert!(s.should_complete);
    }

    #[test]
    fn pause_resume_has_no_jump() {
        let mut c = Clock::new(1000.0, 1.0);
        c.start(100.0);
        assert_eq!(c.elapsed(400.0), 300.0);
        assert_eq!(c.pause(400.0), 300.0);
        assert_eq!(c.elapsed(900.0), 300.0);
        c.resume(900.0);
        assert_eq!(c.elapsed(900.0), 300.0);
        assert_eq!(c.elapsed(1000.0), 400.0);
        assert_eq!(c.paused_total_ms(), 500.0);
    }

    #[test]
    fn reverse_keeps_position() {
        let mut c = Clock::new(1000.0, 2.0);
        c.start(0.0);
        let before = c.elapsed(200.0);
        assert_eq!(c.reverse(200.0), Direction::Reverse);
        let after = c.elapsed(200.0);
        assert_eq!(before.abs(), after.abs());
        assert_eq!(c.elapsed(250.0), 300.0);
    }

    #[test]
    fn seek_and_time_scale() {
        let mut c = Clock::new(800.0, 1.0);
        c.start(0.0);
        c.seek_to(0.5, 100.0);
        assert_eq!(c.elapsed(100.0), 400.0);
        c.set_time_scale(0.5, 100.0);
        assert_eq!(c.elapsed(300.0), 500.0);

        c.pause(300.0);
        c.seek_to(0.25, 1000.0);
        assert_eq!(c.elapsed(5000.0), 200.0);
        c.resume(5000.0);
        assert_eq!(c.elapsed(5000.0), 200.0);
    }

    #[test]
    fn reset_restores_forward_zero() {
        let mut c = Clock::new(1000.0, 1.0);
        c.start(0.0);
        c.reverse(10.0);
        c.reset();
        assert_eq!(c.direction(), Direction::Forward);
        assert_eq!(c.elapsed(500.0), 0.0);
        assert!(!c.is_started());
    }
}
