//! Anima Core: frame-driven animation scheduling and property interpolation.
//!
//! A run owns a clock, a stagger coordinator, an optional keyframe resolver and
//! a property dispatcher. Each frame it reads the time source once, maps
//! elapsed time to timeline progress (repeat/yoyo aware), maps that to
//! per-target progress, and commits interpolated values to every target's
//! property sink in one batch. Hosts supply the time source, frame scheduling,
//! property sinks and target resolution.

pub mod clock;
pub mod completion;
pub mod config;
pub mod dispatch;
pub mod easing;
pub mod engine;
pub mod error;
pub mod events;
pub mod ids;
pub mod keyframes;
pub mod run;
pub mod schedule;
pub mod sink;
pub mod stagger;
pub mod time;

// Re-exports for hosts
pub use clock::{progress_at, Clock, Direction, ProgressSample};
pub use completion::{Completion, RunSummary};
pub use config::{
    parse_run_config_json, EngineConfig, KeyframeSpec, PropertyMap, Repeat, RunConfig,
    StaggerFrom,
};
pub use dispatch::{DispatchReport, DispatchStats, EndpointCache, PropertyDispatcher, Segment};
pub use easing::{EaseMode, Easing, PennerCurve, StepPosition};
pub use engine::Engine;
pub use error::{AnimaError, PropertyError, PropertyIssue, Result};
pub use events::{EventLog, NoopListener, RunEvent, RunListener, UpdateInfo};
pub use ids::{IdAllocator, RunId};
pub use keyframes::{KeyframeResolver, ProcessedKeyframe, SegmentSample};
pub use run::{AnimationRun, RunEnv, RunState, TargetSnapshot};
pub use schedule::{FrameHandle, FrameQueue, FrameScheduler};
pub use sink::{resolve_targets, target, PropertySink, TargetRef, TargetResolver, WeakTarget};
pub use stagger::{StaggerCoordinator, TargetProgress, TargetWindow};
pub use time::{InstantSource, TimeSource};

pub use anima_api_core::{RawValue, TransformComponents, Value, ValueKind};
