//! Stagger coordination: per-target windows on a shared timeline.

use serde::{Deserialize, Serialize};

use crate::config::StaggerFrom;

/// Target `i` is animated during `[start_ms, end_ms]` of the shared timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetWindow {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl TargetWindow {
    #[inline]
    pub fn contains(&self, t_ms: f64) -> bool {
        t_ms >= self.start_ms && t_ms <= self.end_ms
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetProgress {
    pub progress: f64,
    pub active: bool,
    pub complete: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StaggerCoordinator {
    duration_ms: f64,
    stagger_ms: f64,
    windows: Vec<TargetWindow>,
    total_ms: f64,
}

impl StaggerCoordinator {
    /// Windows in target order: `[i * stagger, i * stagger + duration]`.
    pub fn new(target_count: usize, stagger_ms: f64, duration_ms: f64) -> Self {
        Self::with_order(target_count, stagger_ms, duration_ms, StaggerFrom::First)
    }

    /// Like [`StaggerCoordinator::new`], with the slot of each target taken from
    /// `from`: last-to-first, or outward from the middle target (`n / 2`).
    pub fn with_order(
        target_count: usize,
        stagger_ms: f64,
        duration_ms: f64,
        from: StaggerFrom,
    ) -> Self {
        let duration_ms = duration_ms.max(0.0);
        let stagger_ms = stagger_ms.max(0.0);
        let center = target_count / 2;
        let windows: Vec<TargetWindow> = (0..target_count)
            .map(|i| {
                let slot = match from {
                    StaggerFrom::First => i,
                    StaggerFrom::Last => target_count - 1 - i,
                    StaggerFrom::Center => i.abs_diff(center),
                };
                let start_ms = slot as f64 * stagger_ms;
                TargetWindow {
                    start_ms,
                    end_ms: start_ms + duration_ms,
                }
            })
            .collect();
        let total_ms = windows
            .iter()
            .map(|w| w.end_ms)
            .fold(duration_ms, f64::max);
        Self {
            duration_ms,
            stagger_ms,
            windows,
            total_ms,
        }
    }

    #[inline]
    pub fn target_count(&self) -> usize {
        self.windows.len()
    }

    #[inline]
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    #[inline]
    pub fn stagger_ms(&self) -> f64 {
        self.stagger_ms
    }

    pub fn window(&self, index: usize) -> Option<TargetWindow> {
        self.windows.get(index).copied()
    }

    pub fn windows(&self) -> &[TargetWindow] {
        &self.windows
    }

    /// Length of the shared timeline: the latest window end.
    #[inline]
    pub fn total_duration(&self) -> f64 {
        self.total_ms
    }

    /// Progress of target `index` at timeline position `elapsed_ms`.
    pub fn progress_for(&self, index: usize, elapsed_ms: f64) -> TargetProgress {
        let Some(w) = self.windows.get(index) else {
            return TargetProgress {
                progress: 0.0,
                active: false,
                complete: false,
            };
        };
        if elapsed_ms < w.start_ms {
            return TargetProgress {
                progress: 0.0,
                active: false,
                complete: false,
            };
        }
        if elapsed_ms > w.end_ms || self.duration_ms <= 0.0 {
            return TargetProgress {
                progress: 1.0,
                active: false,
                complete: true,
            };
        }
        TargetProgress {
            progress: ((elapsed_ms - w.start_ms) / self.duration_ms).clamp(0.0, 1.0),
            active: true,
            complete: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_and_total() {
        let s = StaggerCoordinator::new(3, 100.0, 500.0);
        assert_eq!(s.window(0), Some(TargetWindow { start_ms: 0.0, end_ms: 500.0 }));
        assert_eq!(s.window(1), Some(TargetWindow { start_ms: 100.0, end_ms: 600.0 }));
        assert_eq!(s.window(2), Some(TargetWindow { start_ms: 200.0, end_ms: 700.0 }));
        assert_eq!(s.total_duration(), 700.0);
        assert_eq!(s.window(3), None);
    }

    #[test]
    fn progress_phases() {
        let s = StaggerCoordinator::new(3, 100.0, 500.0);
        let before = s.progress_for(2, 150.0);
        assert_eq!(before.progress, 0.0);
        assert!(!before.active && !before.complete);

        let inside = s.progress_for(1, 350.0);
        assert_eq!(inside.progress, 0.5);
        assert!(inside.active && !inside.complete);

        let after = s.progress_for(0, 650.0);
        assert_eq!(after.progress, 1.0);
        assert!(!after.active && after.complete);
    }

    #[test]
    fn zero_stagger_collapses_windows() {
        let s = StaggerCoordinator::new(4, 0.0, 300.0);
        assert!(s.windows().iter().all(|w| *w == TargetWindow { start_ms: 0.0, end_ms: 300.0 }));
        assert_eq!(s.total_duration(), 300.0);
    }

    #[test]
    fn reverse_and_center_orders() {
        let last = StaggerCoordinator::with_order(3, 100.0, 500.0, StaggerFrom::Last);
        assert_eq!(last.window(0).map(|w| w.start_ms), Some(200.0));
        assert_eq!(last.window(2).map(|w| w.start_ms), Some(0.0));

        let center = StaggerCoordinator::with_order(5, 100.0, 500.0, StaggerFrom::Center);
        let starts: Vec<f64> = center.windows().iter().map(|w| w.start_ms).collect();
        assert_eq!(starts, vec![200.0, 100.0, 0.0, 100.0, 200.0]);
        assert_eq!(center.total_duration(), 700.0);
    }

    #[test]
    fn zero_duration_targets_complete_at_start() {
        let s = StaggerCoordinator::new(2, 50.0, 0.0);
        assert!(!s.progress_for(1, 10.0).complete);
        assert!(s.progress_for(1, 50.0).complete);
        assert_eq!(s.total_duration(), 50.0);
    }
}
