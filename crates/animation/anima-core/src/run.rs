//! AnimationRun: the per-run state machine.
//!
//! States: `idle -> running -> {paused <-> running} -> completed`, and
//! `reset()` returns to `idle` from anywhere. Frames are driven from outside:
//! the run requests at most one frame at a time and the host hands the handle
//! back through [`AnimationRun::on_frame`]. A handle that no longer matches the
//! pending request (cancelled by pause/reset, or already consumed) is ignored.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::clock::{Clock, Direction};
use crate::completion::{Completion, CompletionSignal, RunSummary};
use crate::config::RunConfig;
use crate::dispatch::{DispatchStats, EndpointCache, PropertyDispatcher, Segment};
use crate::error::{AnimaError, Result};
use crate::events::{RunListener, UpdateInfo};
use crate::ids::RunId;
use crate::keyframes::KeyframeResolver;
use crate::schedule::{FrameHandle, FrameScheduler};
use crate::sink::{TargetRef, WeakTarget};
use crate::stagger::StaggerCoordinator;
use crate::time::TimeSource;

/// Run state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

impl RunState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    #[inline]
    pub fn can_pause(&self) -> bool {
        matches!(self, Self::Running)
    }

    #[inline]
    pub fn can_resume(&self) -> bool {
        matches!(self, Self::Paused)
    }

    #[inline]
    pub fn can_reverse(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Shared collaborators a run needs besides its targets.
#[derive(Clone)]
pub struct RunEnv {
    pub time: Rc<dyn TimeSource>,
    pub frames: Rc<dyn FrameScheduler>,
}

impl RunEnv {
    pub fn new(time: Rc<dyn TimeSource>, frames: Rc<dyn FrameScheduler>) -> Self {
        Self { time, frames }
    }
}

struct TargetRunState {
    target: WeakTarget,
    stagger_offset_ms: f64,
    progress: f64,
    active: bool,
    complete: bool,
    /// Written at least once since construction or the last reset.
    rendered: bool,
    cache: EndpointCache,
}

impl TargetRunState {
    fn clear(&mut self) {
        self.progress = 0.0;
        self.active = false;
        self.complete = false;
        self.rendered = false;
        self.cache.clear();
    }
}

/// Read-only view of one target's run state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub index: usize,
    pub stagger_offset_ms: f64,
    pub progress: f64,
    pub active: bool,
    pub complete: bool,
    /// False once the host has dropped the target.
    pub alive: bool,
}

pub struct AnimationRun {
    id: RunId,
    config: RunConfig,
    state: RunState,
    clock: Clock,
    stagger: StaggerCoordinator,
    keyframes: Option<KeyframeResolver>,
    dispatcher: PropertyDispatcher,
    targets: Vec<TargetRunState>,
    listener: Box<dyn RunListener>,
    env: RunEnv,
    pending_frame: Option<FrameHandle>,
    start_at_ms: Option<f64>,
    started: bool,
    progress: f64,
    completion: CompletionSignal,
}

impl std::fmt::Debug for AnimationRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationRun")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("progress", &self.progress)
            .field("targets", &self.targets.len())
            .field("pending_frame", &self.pending_frame)
            .finish()
    }
}

impl AnimationRun {
    /// Validate `config` and build the run. Nothing is scheduled until `play()`.
    pub fn new(
        id: RunId,
        config: RunConfig,
        targets: Vec<TargetRef>,
        listener: Box<dyn RunListener>,
        env: RunEnv,
    ) -> Result<Self> {
        config.validate()?;
        if targets.is_empty() {
            return Err(AnimaError::MissingTarget);
        }
        let keyframes = if config.has_keyframes() {
            Some(KeyframeResolver::from_specs(&config.keyframes)?)
        } else {
            None
        };
        let stagger = StaggerCoordinator::with_order(
            targets.len(),
            config.stagger_ms,
            config.duration_ms,
            config.stagger_from,
        );
        let clock = Clock::new(stagger.total_duration(), config.time_scale);
        let targets = targets
            .iter()
            .enumerate()
            .map(|(i, t)| TargetRunState {
                target: Rc::downgrade(t),
                stagger_offset_ms: stagger.window(i).map_or(0.0, |w| w.start_ms),
                progress: 0.0,
                active: false,
                complete: false,
                rendered: false,
                cache: EndpointCache::new(),
            })
            .collect::<Vec<_>>();

        debug!(
            run = %id,
            targets = targets.len(),
            total_ms = stagger.total_duration(),
            keyframes = keyframes.is_some(),
            "run created"
        );

        Ok(Self {
            id,
            config,
            state: RunState::Idle,
            clock,
            stagger,
            keyframes,
            dispatcher: PropertyDispatcher::new(),
            targets,
            listener,
            env,
            pending_frame: None,
            start_at_ms: None,
            started: false,
            progress: 0.0,
            completion: CompletionSignal::new(),
        })
    }

    // ---- accessors ----

    #[inline]
    pub fn id(&self) -> RunId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Timeline progress of the last rendered frame.
    #[inline]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    #[inline]
    pub fn iteration(&self) -> u32 {
        self.clock.iteration()
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.clock.direction()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed(self.env.time.now_ms())
    }

    #[inline]
    pub fn total_duration_ms(&self) -> f64 {
        self.stagger.total_duration()
    }

    #[inline]
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending_frame
    }

    /// True while a start delay is being honored.
    #[inline]
    pub fn is_delayed(&self) -> bool {
        self.start_at_ms.is_some()
    }

    #[inline]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn target(&self, index: usize) -> Option<TargetSnapshot> {
        self.targets.get(index).map(|t| TargetSnapshot {
            index,
            stagger_offset_ms: t.stagger_offset_ms,
            progress: t.progress,
            active: t.active,
            complete: t.complete,
            alive: t.target.strong_count() > 0,
        })
    }

    #[inline]
    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn completion(&self) -> Completion {
        self.completion.completion()
    }

    // ---- transport ----

    /// Start (or continue) playback and return the completion signal.
    ///
    /// Completed: no-op, returns the resolved signal. Paused: resumes.
    /// Running or waiting on the start delay: no-op.
    pub fn play(&mut self) -> Completion {
        match self.state {
            RunState::Completed | RunState::Running => {}
            RunState::Paused => self.resume(),
            RunState::Idle if self.start_at_ms.is_some() => {}
            RunState::Idle => {
                let now = self.env.time.now_ms();
                if self.config.delay_ms > 0.0 {
                    self.start_at_ms = Some(now + self.config.delay_ms);
                    debug!(run = %self.id, delay_ms = self.config.delay_ms, "start delayed");
                } else {
                    self.enter_running(now);
                }
                self.schedule_frame();
            }
        }
        self.completion()
    }

    /// Freeze playback. Returns elapsed time at the pause, or `None` if the
    /// run was not running.
    pub fn pause(&mut self) -> Option<f64> {
        if !self.state.can_pause() {
            return None;
        }
        self.cancel_frame();
        let elapsed = self.clock.pause(self.env.time.now_ms());
        self.state = RunState::Paused;
        debug!(run = %self.id, elapsed_ms = elapsed, "paused");
        self.listener.on_pause(self.id);
        Some(elapsed)
    }

    pub fn resume(&mut self) {
        if !self.state.can_resume() {
            return;
        }
        self.clock.resume(self.env.time.now_ms());
        self.state = RunState::Running;
        debug!(run = %self.id, "resumed");
        self.listener.on_resume(self.id);
        self.schedule_frame();
    }

    /// Flip playback direction without moving the current position.
    pub fn reverse(&mut self) -> Option<Direction> {
        if !self.state.can_reverse() {
            return None;
        }
        let direction = self.clock.reverse(self.env.time.now_ms());
        debug!(run = %self.id, ?direction, "reversed");
        self.listener.on_reverse(self.id, direction);
        Some(direction)
    }

    /// Jump to timeline progress `progress` (clamped to [0, 1]) on the first
    /// pass and render it immediately, writing every target including those
    /// outside their stagger window. The run state is unchanged.
    pub fn seek(&mut self, progress: f64) {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        self.clock.seek_to(p, self.env.time.now_ms());
        debug!(run = %self.id, progress = p, state = self.state.name(), "seek");
        self.render(p, true);
    }

    pub fn set_time_scale(&mut self, time_scale: f64) -> Result<()> {
        if !time_scale.is_finite() || time_scale <= 0.0 {
            return Err(AnimaError::invalid_config(
                "timeScale",
                format!("must be a finite number > 0, got {time_scale}"),
            ));
        }
        self.clock
            .set_time_scale(time_scale, self.env.time.now_ms());
        Ok(())
    }

    /// Jump to the end: final write at progress 1, `on_complete`, resolve the
    /// signal. Returns false when the run had already completed.
    pub fn complete(&mut self) -> bool {
        let now = self.env.time.now_ms();
        self.finish(now)
    }

    /// Back to `idle`: cancel the pending frame, restore target values and
    /// rewind the clock. A completed run gets a fresh completion signal.
    pub fn reset(&mut self) {
        self.cancel_frame();
        self.start_at_ms = None;
        self.clock.reset();
        for ts in &mut self.targets {
            ts.clear();
            let Some(target) = ts.target.upgrade() else {
                continue;
            };
            match target.try_borrow_mut() {
                Ok(mut sink) => sink.reset(),
                Err(_) => warn!(run = %self.id, "target busy during reset; not restored"),
            };
        }
        if self.completion.is_resolved() {
            self.completion = CompletionSignal::new();
        }
        self.started = false;
        self.progress = 0.0;
        self.state = RunState::Idle;
        debug!(run = %self.id, "reset");
    }

    // ---- frame loop ----

    /// Handle a frame callback. Returns true when per-frame work was done.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if self.pending_frame != Some(handle) {
            trace!(run = %self.id, ?handle, "stale frame ignored");
            return false;
        }
        self.pending_frame = None;
        let now = self.env.time.now_ms();

        if let Some(start_at) = self.start_at_ms {
            if now < start_at {
                self.schedule_frame();
                return false;
            }
            self.start_at_ms = None;
            self.enter_running(start_at);
        }

        if !self.state.is_running() {
            trace!(run = %self.id, state = self.state.name(), "frame while not running");
            return false;
        }
        self.tick(now);
        true
    }

    fn tick(&mut self, now: f64) {
        let sample = self
            .clock
            .compute_progress(now, self.config.repeat, self.config.yoyo);
        if sample.should_complete {
            self.finish(now);
            return;
        }
        self.render(sample.progress, false);
        self.schedule_frame();
    }

    fn enter_running(&mut self, now: f64) {
        self.clock.start(now);
        self.state = RunState::Running;
        debug!(run = %self.id, "running");
        if !self.started {
            self.started = true;
            self.listener.on_start(self.id);
        }
    }

    fn finish(&mut self, now: f64) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.cancel_frame();
        self.start_at_ms = None;
        self.render(1.0, false);
        for ts in &mut self.targets {
            ts.progress = 1.0;
            ts.active = false;
            ts.complete = true;
        }
        let elapsed_ms = self.clock.pause(now);
        self.state = RunState::Completed;
        let iterations = if self.config.repeat.is_single_pass() {
            1
        } else {
            self.clock.iteration().max(1)
        };
        debug!(run = %self.id, iterations, elapsed_ms, "completed");
        self.listener.on_complete(self.id);
        self.completion.resolve(RunSummary {
            run: self.id,
            iterations,
            elapsed_ms,
        });
        true
    }

    /// Write targets at timeline progress `p` and report the update. Targets
    /// waiting on their window are skipped unless `force` is set.
    fn render(&mut self, p: f64, force: bool) {
        let total = self.stagger.total_duration();
        let timeline_ms = p * total;
        let mut active_targets = 0;
        let mut completed_targets = 0;

        for (i, ts) in self.targets.iter_mut().enumerate() {
            let tp = self.stagger.progress_for(i, timeline_ms);
            let moved = tp.progress != ts.progress;
            let write = force
                || tp.active
                || (moved && (ts.rendered || tp.complete))
                || (tp.complete && !ts.rendered);
            ts.progress = tp.progress;
            ts.active = tp.active;
            ts.complete = tp.complete;
            active_targets += usize::from(tp.active);
            completed_targets += usize::from(tp.complete);
            if !write {
                continue;
            }

            let Some(target) = ts.target.upgrade() else {
                continue;
            };
            let Ok(mut sink) = target.try_borrow_mut() else {
                warn!(run = %self.id, index = i, "target busy; frame skipped for it");
                continue;
            };

            let eased = self.config.ease.evaluate(tp.progress);
            let (segment, t) = match &self.keyframes {
                Some(resolver) => {
                    let sample = resolver.resolve(eased);
                    match resolver.segment(sample.index) {
                        Some((k0, k1)) => (
                            Segment {
                                index: sample.index,
                                from: &k0.properties,
                                to: &k1.properties,
                            },
                            sample.eased,
                        ),
                        None => continue,
                    }
                }
                None => (
                    Segment {
                        index: 0,
                        from: &self.config.from,
                        to: &self.config.to,
                    },
                    eased,
                ),
            };

            let report = self
                .dispatcher
                .dispatch(i, &mut *sink, segment, t, &mut ts.cache);
            ts.rendered = true;
            for issue in &report.issues {
                self.listener.on_property_issue(self.id, issue);
            }
        }

        self.progress = p;
        let info = UpdateInfo {
            run: self.id,
            iteration: self.clock.iteration(),
            timeline_ms,
            direction: self.clock.direction(),
            active_targets,
            completed_targets,
        };
        self.listener.on_update(p, &info);
    }

    fn schedule_frame(&mut self) {
        if self.pending_frame.is_none() {
            self.pending_frame = Some(self.env.frames.request_frame());
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.env.frames.cancel_frame(handle);
        }
    }
}

impl Drop for AnimationRun {
    fn drop(&mut self) {
        self.cancel_frame();
    }
}
