//! anima-api-core: normalized value model shared by the engine and property sinks.
//!
//! Sinks parse raw presentation values into [`Value`], the engine interpolates
//! them with the laws in [`blend`], and composite transforms travel as
//! independently animatable [`TransformComponents`].

pub mod blend;
pub mod error;
pub mod transform;
pub mod value;

pub use blend::interpolate;
pub use error::ValueError;
pub use transform::{compose, decompose, try_decompose, TransformComponents, GIMBAL_EPSILON};
pub use value::{RawValue, Value, ValueKind};
