//! Value: normalized property values the engine interpolates.
//! All numeric channels use f64 so millisecond timelines and matrix math
//! share one precision.

use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::transform::{try_decompose, TransformComponents};

/// Coarse kind tag used for dispatch and error reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Scalar,
    Length,
    Color,
    Vector,
    Transform,
    Discrete,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Length => "length",
            ValueKind::Color => "color",
            ValueKind::Vector => "vector",
            ValueKind::Transform => "transform",
            ValueKind::Discrete => "discrete",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Unitless number (opacity, z-index style counters).
    Scalar(f64),

    /// Number with a unit suffix ("px", "%", "em", ...).
    Length { value: f64, unit: String },

    /// RGBA channels in the sink's configured color space.
    Color([f64; 4]),

    /// Generic, variable-length numeric vector
    Vector(Vec<f64>),

    /// Independently animatable transform components.
    Transform(TransformComponents),

    /// Non-numeric value; step-only for interpolation.
    Discrete(String),
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Length { .. } => ValueKind::Length,
            Value::Color(_) => ValueKind::Color,
            Value::Vector(_) => ValueKind::Vector,
            Value::Transform(_) => ValueKind::Transform,
            Value::Discrete(_) => ValueKind::Discrete,
        }
    }

    pub fn length(value: f64, unit: impl Into<String>) -> Self {
        Value::Length {
            value,
            unit: unit.into(),
        }
    }

    /// Numeric payload for scalars and lengths.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Length { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_transform(&self) -> Option<&TransformComponents> {
        match self {
            Value::Transform(t) => Some(t),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<TransformComponents> for Value {
    fn from(t: TransformComponents) -> Self {
        Value::Transform(t)
    }
}

/// Raw property value as it arrives from configuration or a sink read-back.
///
/// Accepted JSON shapes:
/// - a bare number: `0.5`
/// - a string: `"10px"`, `"0.25"`, `"block"`
/// - a column-major 4x4 matrix: `{ "matrix": [16 numbers] }`
/// - an already-normalized value: `{ "type": "Color", "data": [1,0,0,1] }`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Matrix { matrix: [f64; 16] },
    Value(Value),
}

impl RawValue {
    /// Parse with the default grammar: numbers are scalars, `<number><unit>`
    /// strings are lengths, matrices are decomposed into transform components.
    /// Any other string is rejected; sinks with discrete properties override
    /// `PropertySink::parse` to accept them.
    pub fn parse_default(&self) -> Result<Value, ValueError> {
        match self {
            RawValue::Number(v) => Ok(Value::Scalar(*v)),
            RawValue::Value(v) => Ok(v.clone()),
            RawValue::Matrix { matrix } => {
                let m = nalgebra::Matrix4::from_column_slice(matrix);
                try_decompose(&m).map(Value::Transform)
            }
            RawValue::Text(s) => parse_numeric_text(s),
        }
    }
}

fn parse_numeric_text(raw: &str) -> Result<Value, ValueError> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<f64>() {
        return Ok(Value::Scalar(v));
    }
    let split = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_alphabetic() || *c == '%')
        .map(|(i, _)| i);
    match split {
        Some(i) if i > 0 => {
            let (num, unit) = s.split_at(i);
            num.trim()
                .parse::<f64>()
                .map(|value| Value::length(value, unit))
                .map_err(|_| ValueError::Unparseable {
                    raw: raw.to_string(),
                })
        }
        _ => Err(ValueError::Unparseable {
            raw: raw.to_string(),
        }),
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<Value> for RawValue {
    fn from(v: Value) -> Self {
        RawValue::Value(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_lengths() {
        assert_eq!(RawValue::from(0.5).parse_default(), Ok(Value::Scalar(0.5)));
        assert_eq!(
            RawValue::from("0.25").parse_default(),
            Ok(Value::Scalar(0.25))
        );
        assert_eq!(
            RawValue::from("10px").parse_default(),
            Ok(Value::length(10.0, "px"))
        );
        assert_eq!(
            RawValue::from("-2.5 em").parse_default(),
            Ok(Value::length(-2.5, "em"))
        );
        assert_eq!(
            RawValue::from("50%").parse_default(),
            Ok(Value::length(50.0, "%"))
        );
    }

    #[test]
    fn rejects_bare_words() {
        let err = RawValue::from("block").parse_default().unwrap_err();
        assert_eq!(
            err,
            ValueError::Unparseable {
                raw: "block".into()
            }
        );
    }

    #[test]
    fn raw_value_json_shapes() {
        let n: RawValue = serde_json::from_str("1.5").unwrap();
        assert_eq!(n, RawValue::Number(1.5));
        let s: RawValue = serde_json::from_str("\"4px\"").unwrap();
        assert_eq!(s, RawValue::Text("4px".into()));
        let c: RawValue = serde_json::from_str(r#"{"type":"Color","data":[1,0,0,1]}"#).unwrap();
        assert_eq!(c, RawValue::Value(Value::Color([1.0, 0.0, 0.0, 1.0])));
        let m: RawValue = serde_json::from_str(
            r#"{"matrix":[1,0,0,0, 0,1,0,0, 0,0,1,0, 5,6,7,1]}"#,
        )
        .unwrap();
        match m.parse_default().unwrap() {
            Value::Transform(t) => assert_eq!(t.translate, [5.0, 6.0, 7.0]),
            other => panic!("expected transform, got {other:?}"),
        }
    }
}
