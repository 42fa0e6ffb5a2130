//! Run and engine configuration.
//!
//! `RunConfig` is the immutable snapshot a run is built from. It deserializes
//! from the stored JSON shape (`duration`, `delay`, `stagger` in milliseconds,
//! `repeat` as a count or `"infinite"`) and is checked by [`RunConfig::validate`]
//! before any run state exists.

use anima_api_core::RawValue;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::easing::Easing;
use crate::error::{AnimaError, Result};

/// Property key to raw value, in declaration order.
pub type PropertyMap = IndexMap<String, RawValue>;

/// Number of passes. `Count(0)` and `Count(1)` both mean one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    Count(u32),
    Infinite,
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Count(1)
    }
}

impl Repeat {
    #[inline]
    pub fn is_single_pass(self) -> bool {
        matches!(self, Repeat::Count(n) if n <= 1)
    }

    #[inline]
    pub fn is_infinite(self) -> bool {
        matches!(self, Repeat::Infinite)
    }
}

impl Serialize for Repeat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Repeat::Count(n) => serializer.serialize_u32(*n),
            Repeat::Infinite => serializer.serialize_str("infinite"),
        }
    }
}

impl<'de> Deserialize<'de> for Repeat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawRepeat {
            Number(f64),
            Word(String),
        }

        match RawRepeat::deserialize(deserializer)? {
            RawRepeat::Number(n) => {
                if !n.is_finite() || n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
                    return Err(serde::de::Error::custom(format!(
                        "repeat must be a non-negative integer or \"infinite\", got {n}"
                    )));
                }
                Ok(Repeat::Count(n as u32))
            }
            RawRepeat::Word(w) => match w.to_ascii_lowercase().as_str() {
                "infinite" | "infinity" => Ok(Repeat::Infinite),
                _ => Err(serde::de::Error::custom(format!(
                    "repeat must be a non-negative integer or \"infinite\", got '{w}'"
                ))),
            },
        }
    }
}

/// Which end of the target list starts first when staggering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaggerFrom {
    #[default]
    First,
    Last,
    Center,
}

/// One keyframe as configured: offset in [0, 1], a property snapshot and an
/// optional per-segment ease (linear when absent).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframeSpec {
    pub offset: f64,
    #[serde(default)]
    pub properties: PropertyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<Easing>,
}

impl KeyframeSpec {
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            properties: PropertyMap::new(),
            ease: None,
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_ease(mut self, ease: Easing) -> Self {
        self.ease = Some(ease);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunConfig {
    #[serde(rename = "duration")]
    pub duration_ms: f64,
    #[serde(rename = "delay")]
    pub delay_ms: f64,
    pub ease: Easing,
    pub repeat: Repeat,
    pub yoyo: bool,
    #[serde(rename = "stagger")]
    pub stagger_ms: f64,
    pub stagger_from: StaggerFrom,
    pub time_scale: f64,
    pub from: PropertyMap,
    pub to: PropertyMap,
    /// When non-empty, keyframes drive the run and `from`/`to` are ignored.
    pub keyframes: Vec<KeyframeSpec>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1000.0,
            delay_ms: 0.0,
            ease: Easing::Linear,
            repeat: Repeat::default(),
            yoyo: false,
            stagger_ms: 0.0,
            stagger_from: StaggerFrom::First,
            time_scale: 1.0,
            from: PropertyMap::new(),
            to: PropertyMap::new(),
            keyframes: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_ease(mut self, ease: Easing) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn with_stagger(mut self, stagger_ms: f64, from: StaggerFrom) -> Self {
        self.stagger_ms = stagger_ms;
        self.stagger_from = from;
        self
    }

    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn with_from(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.from.insert(key.into(), value.into());
        self
    }

    pub fn with_to(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.to.insert(key.into(), value.into());
        self
    }

    pub fn with_keyframe(mut self, keyframe: KeyframeSpec) -> Self {
        self.keyframes.push(keyframe);
        self
    }

    #[inline]
    pub fn has_keyframes(&self) -> bool {
        !self.keyframes.is_empty()
    }

    /// Check every configuration rule. Nothing is partially applied on error.
    pub fn validate(&self) -> Result<()> {
        non_negative("duration", self.duration_ms)?;
        non_negative("delay", self.delay_ms)?;
        non_negative("stagger", self.stagger_ms)?;
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(AnimaError::invalid_config(
                "timeScale",
                format!("must be a finite number > 0, got {}", self.time_scale),
            ));
        }
        self.ease.validate()?;

        if self.keyframes.is_empty() {
            if self.to.is_empty() {
                return Err(AnimaError::MissingEndpoint);
            }
            return Ok(());
        }

        if self.keyframes.len() < 2 {
            return Err(AnimaError::invalid_keyframes(
                "at least two keyframes are required",
            ));
        }
        let mut prev: Option<f64> = None;
        for (i, kf) in self.keyframes.iter().enumerate() {
            if !kf.offset.is_finite() || !(0.0..=1.0).contains(&kf.offset) {
                return Err(AnimaError::invalid_keyframes(format!(
                    "keyframe {i} offset {} is outside [0, 1]",
                    kf.offset
                )));
            }
            if let Some(p) = prev {
                if kf.offset <= p {
                    return Err(AnimaError::invalid_keyframes(format!(
                        "keyframe {i} offset {} is not greater than {p}",
                        kf.offset
                    )));
                }
            }
            if let Some(ease) = &kf.ease {
                ease.validate()?;
            }
            prev = Some(kf.offset);
        }
        Ok(())
    }
}

fn non_negative(field: &str, v: f64) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(AnimaError::invalid_config(
            field,
            format!("must be a finite number >= 0, got {v}"),
        ));
    }
    Ok(())
}

/// Parse a stored run configuration and validate it.
pub fn parse_run_config_json(s: &str) -> Result<RunConfig> {
    let cfg: RunConfig = serde_json::from_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Engine sizing and housekeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial capacity hint for the run table.
    pub run_capacity: usize,
    /// Drop completed runs at the end of every `Engine::frame`.
    pub auto_prune_completed: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_capacity: 16,
            auto_prune_completed: false,
        }
    }
}
