use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::ValueKind;

/// Errors raised while parsing or interpolating property values.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ValueError {
    #[error("cannot interpolate {from} into {to}")]
    KindMismatch { from: ValueKind, to: ValueKind },

    #[error("unit mismatch: '{from}' vs '{to}'")]
    UnitMismatch { from: String, to: String },

    #[error("vector length mismatch: {from} vs {to}")]
    LengthMismatch { from: usize, to: usize },

    #[error("unparseable value '{raw}'")]
    Unparseable { raw: String },

    #[error("interpolation factor {t} is not finite")]
    NonFiniteFactor { t: f64 },

    #[error("degenerate transform matrix: {reason}")]
    DegenerateMatrix { reason: String },
}
