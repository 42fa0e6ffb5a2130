//! Engine: run registry sharing one time source and one frame queue.
//!
//! Methods:
//! - new / with_time_source, set_resolver
//! - create_run (explicit targets), create_run_for (selector)
//! - transport by id: play, pause, resume, reverse, seek, reset, complete
//! - frame: drain the queue once and tick every run with a matching request

use std::rc::Rc;

use tracing::trace;

use crate::completion::Completion;
use crate::clock::Direction;
use crate::config::{EngineConfig, RunConfig};
use crate::error::{AnimaError, Result};
use crate::events::{NoopListener, RunListener};
use crate::ids::{IdAllocator, RunId};
use crate::run::{AnimationRun, RunEnv, RunState};
use crate::schedule::FrameQueue;
use crate::sink::{resolve_targets, TargetRef, TargetResolver};
use crate::time::{InstantSource, TimeSource};

pub struct Engine {
    cfg: EngineConfig,
    ids: IdAllocator,
    time: Rc<dyn TimeSource>,
    frames: Rc<FrameQueue>,
    runs: Vec<AnimationRun>,
    resolver: Option<Box<dyn TargetResolver>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cfg", &self.cfg)
            .field("runs", &self.runs)
            .field("pending_frames", &self.frames.len())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Engine on the wall clock.
    pub fn new(cfg: EngineConfig) -> Self {
        Self::with_time_source(cfg, Rc::new(InstantSource::new()))
    }

    pub fn with_time_source(cfg: EngineConfig, time: Rc<dyn TimeSource>) -> Self {
        Self {
            runs: Vec::with_capacity(cfg.run_capacity),
            cfg,
            ids: IdAllocator::new(),
            time,
            frames: Rc::new(FrameQueue::new()),
            resolver: None,
        }
    }

    pub fn set_resolver(&mut self, resolver: Box<dyn TargetResolver>) {
        self.resolver = Some(resolver);
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    #[inline]
    pub fn frame_queue(&self) -> &FrameQueue {
        &self.frames
    }

    fn env(&self) -> RunEnv {
        RunEnv::new(self.time.clone(), self.frames.clone())
    }

    /// Build a run over explicit targets. The run starts idle.
    pub fn create_run(
        &mut self,
        config: RunConfig,
        targets: Vec<TargetRef>,
        listener: Option<Box<dyn RunListener>>,
    ) -> Result<RunId> {
        let id = self.ids.alloc_run();
        let listener = listener.unwrap_or_else(|| Box::new(NoopListener));
        let run = AnimationRun::new(id, config, targets, listener, self.env())?;
        self.runs.push(run);
        Ok(id)
    }

    /// Build a run over whatever the installed resolver returns for `selector`.
    pub fn create_run_for(
        &mut self,
        config: RunConfig,
        selector: &str,
        listener: Option<Box<dyn RunListener>>,
    ) -> Result<RunId> {
        let resolver = self.resolver.as_deref_mut().ok_or(AnimaError::NoResolver)?;
        let targets = resolve_targets(resolver, selector)?;
        self.create_run(config, targets, listener)
    }

    pub fn run(&self, id: RunId) -> Option<&AnimationRun> {
        self.runs.iter().find(|r| r.id() == id)
    }

    pub fn run_mut(&mut self, id: RunId) -> Option<&mut AnimationRun> {
        self.runs.iter_mut().find(|r| r.id() == id)
    }

    fn expect_run(&mut self, id: RunId) -> Result<&mut AnimationRun> {
        self.run_mut(id).ok_or(AnimaError::RunNotFound { id })
    }

    pub fn run_ids(&self) -> Vec<RunId> {
        self.runs.iter().map(AnimationRun::id).collect()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn state(&self, id: RunId) -> Option<RunState> {
        self.run(id).map(AnimationRun::state)
    }

    pub fn play(&mut self, id: RunId) -> Result<Completion> {
        Ok(self.expect_run(id)?.play())
    }

    pub fn pause(&mut self, id: RunId) -> Result<Option<f64>> {
        Ok(self.expect_run(id)?.pause())
    }

    pub fn resume(&mut self, id: RunId) -> Result<()> {
        self.expect_run(id)?.resume();
        Ok(())
    }

    pub fn reverse(&mut self, id: RunId) -> Result<Option<Direction>> {
        Ok(self.expect_run(id)?.reverse())
    }

    pub fn seek(&mut self, id: RunId, progress: f64) -> Result<()> {
        self.expect_run(id)?.seek(progress);
        Ok(())
    }

    pub fn reset(&mut self, id: RunId) -> Result<()> {
        self.expect_run(id)?.reset();
        Ok(())
    }

    pub fn complete(&mut self, id: RunId) -> Result<bool> {
        Ok(self.expect_run(id)?.complete())
    }

    pub fn set_time_scale(&mut self, id: RunId, time_scale: f64) -> Result<()> {
        self.expect_run(id)?.set_time_scale(time_scale)
    }

    /// Drop a run; its pending frame is cancelled.
    pub fn remove_run(&mut self, id: RunId) -> Option<AnimationRun> {
        let pos = self.runs.iter().position(|r| r.id() == id)?;
        Some(self.runs.remove(pos))
    }

    /// Drop every completed run. Returns their ids.
    pub fn prune_completed(&mut self) -> Vec<RunId> {
        let mut pruned = Vec::new();
        self.runs.retain(|r| {
            let done = r.state().is_terminal();
            if done {
                pruned.push(r.id());
            }
            !done
        });
        pruned
    }

    /// One display refresh: hand each pending frame to the run that asked for
    /// it, in creation order. Frames requested during this call wait for the
    /// next one. Returns how many runs did per-frame work.
    pub fn frame(&mut self) -> usize {
        let pending = self.frames.take_pending();
        let mut ticked = 0;
        for run in &mut self.runs {
            let Some(handle) = run.pending_frame() else {
                continue;
            };
            if !pending.contains(&handle) {
                continue;
            }
            if run.on_frame(handle) {
                ticked += 1;
            }
        }
        trace!(frames = pending.len(), ticked, "engine frame");
        if self.cfg.auto_prune_completed {
            self.prune_completed();
        }
        ticked
    }

    /// Drive frames until no run is waiting on one, up to `max_frames`.
    /// Returns the number of frames driven.
    pub fn run_until_idle(&mut self, max_frames: usize) -> usize {
        let mut n = 0;
        while n < max_frames && !self.frames.is_empty() {
            self.frame();
            n += 1;
        }
        n
    }
}
