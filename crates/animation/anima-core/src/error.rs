//! Error types for run construction and per-property diagnostics

use anima_api_core::ValueError;
use serde::{Deserialize, Serialize};

use crate::ids::RunId;

/// Errors returned by configuration, target resolution and the engine registry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimaError {
    /// A configuration field is out of range or malformed
    #[error("Invalid config field '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// No targets were supplied to the run
    #[error("Run has no targets")]
    MissingTarget,

    /// Neither `to` nor `keyframes` is configured
    #[error("Run needs a `to` map or a keyframe list")]
    MissingEndpoint,

    /// Keyframe list is too short or not strictly ascending
    #[error("Invalid keyframes: {reason}")]
    InvalidKeyframes { reason: String },

    /// The selector resolved to an empty target list
    #[error("No targets match selector '{selector}'")]
    NoTargets { selector: String },

    /// Engine has no target resolver installed
    #[error("No target resolver installed")]
    NoResolver,

    /// Run id is unknown to the engine
    #[error("Run not found: {id}")]
    RunNotFound { id: RunId },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl AnimaError {
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_keyframes(reason: impl Into<String>) -> Self {
        Self::InvalidKeyframes {
            reason: reason.into(),
        }
    }

    /// Check if the caller can retry with a corrected input
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoTargets { .. } | Self::RunNotFound { .. })
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. }
            | Self::MissingTarget
            | Self::MissingEndpoint
            | Self::InvalidKeyframes { .. } => "config",
            Self::NoTargets { .. } | Self::NoResolver => "resolution",
            Self::RunNotFound { .. } => "state",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for AnimaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, AnimaError>;

/// Why a single property was skipped for a target.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    #[error("property is not animatable")]
    NotAnimatable,

    #[error("no start value: absent from `from` and unreadable from the target")]
    MissingStart,

    #[error("no end value in the active segment")]
    MissingEnd,

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl PropertyError {
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotAnimatable => "animatable",
            Self::MissingStart | Self::MissingEnd => "endpoint",
            Self::Value(_) => "value",
        }
    }
}

/// A skipped property, reported through tracing and `RunListener::on_property_issue`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("target {target}: '{property}' skipped: {error}")]
pub struct PropertyIssue {
    pub target: usize,
    pub property: String,
    #[source]
    pub error: PropertyError,
}
