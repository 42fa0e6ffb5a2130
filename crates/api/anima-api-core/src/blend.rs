//! Interpolation laws for [`Value`].
//! - linear for scalars and lengths (units must agree)
//! - per-channel linear for colors
//! - elementwise for generic vectors
//! - component-wise for transforms
//! - step for discrete values (holds `a` until t reaches 1)

use crate::error::ValueError;
use crate::transform::TransformComponents;
use crate::value::Value;

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Lerp for fixed-size arrays
pub fn lerp_array<const N: usize>(a: &[f64; N], b: &[f64; N], t: f64) -> [f64; N] {
    std::array::from_fn(|i| lerp(a[i], b[i], t))
}

/// Interpolate two normalized values. `t` is not clamped so overshooting
/// easings (back, elastic) can extrapolate.
pub fn interpolate(a: &Value, b: &Value, t: f64) -> Result<Value, ValueError> {
    if !t.is_finite() {
        return Err(ValueError::NonFiniteFactor { t });
    }
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Ok(Value::Scalar(lerp(*x, *y, t))),
        (
            Value::Length {
                value: x,
                unit: ua,
            },
            Value::Length {
                value: y,
                unit: ub,
            },
        ) => {
            if ua != ub {
                return Err(ValueError::UnitMismatch {
                    from: ua.clone(),
                    to: ub.clone(),
                });
            }
            Ok(Value::length(lerp(*x, *y, t), ua.clone()))
        }
        // A bare zero start ("0" with no unit) adopts the end unit.
        (Value::Scalar(x), Value::Length { value: y, unit }) if *x == 0.0 => {
            Ok(Value::length(lerp(0.0, *y, t), unit.clone()))
        }
        (Value::Length { value: x, unit }, Value::Scalar(y)) if *y == 0.0 => {
            Ok(Value::length(lerp(*x, 0.0, t), unit.clone()))
        }
        (Value::Color(x), Value::Color(y)) => Ok(Value::Color(lerp_array(x, y, t))),
        (Value::Vector(x), Value::Vector(y)) => {
            if x.len() != y.len() {
                return Err(ValueError::LengthMismatch {
                    from: x.len(),
                    to: y.len(),
                });
            }
            Ok(Value::Vector(
                x.iter().zip(y.iter()).map(|(p, q)| lerp(*p, *q, t)).collect(),
            ))
        }
        (Value::Transform(x), Value::Transform(y)) => Ok(Value::Transform(x.lerp(y, t))),
        (Value::Discrete(x), Value::Discrete(y)) => {
            Ok(Value::Discrete(if t >= 1.0 { y.clone() } else { x.clone() }))
        }
        _ => Err(ValueError::KindMismatch {
            from: a.kind(),
            to: b.kind(),
        }),
    }
}

impl TransformComponents {
    /// Component-wise interpolation; angles are interpolated numerically.
    pub fn lerp(&self, other: &TransformComponents, t: f64) -> TransformComponents {
        TransformComponents {
            translate: lerp_array(&self.translate, &other.translate, t),
            rotate: lerp_array(&self.rotate, &other.rotate, t),
            scale: lerp_array(&self.scale, &other.scale, t),
            skew: lerp_array(&self.skew, &other.skew, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use approx::assert_relative_eq;

    #[test]
    fn lerp_array_is_elementwise() {
        assert_eq!(
            lerp_array(&[0.0, 10.0, -4.0], &[2.0, 20.0, 4.0], 0.25),
            [0.5, 12.5, -2.0]
        );
    }

    #[test]
    fn scalar_and_length() {
        let v = interpolate(&Value::Scalar(0.0), &Value::Scalar(1.0), 0.5).unwrap();
        assert_eq!(v, Value::Scalar(0.5));
        let l = interpolate(&Value::length(10.0, "px"), &Value::length(20.0, "px"), 0.25).unwrap();
        assert_eq!(l, Value::length(12.5, "px"));
    }

    #[test]
    fn zero_scalar_adopts_unit() {
        let l = interpolate(&Value::Scalar(0.0), &Value::length(100.0, "%"), 0.5).unwrap();
        assert_eq!(l, Value::length(50.0, "%"));
    }

    #[test]
    fn unit_mismatch_is_an_error() {
        let err = interpolate(&Value::length(1.0, "px"), &Value::length(1.0, "em"), 0.5).unwrap_err();
        assert!(matches!(err, ValueError::UnitMismatch { .. }));
    }

    #[test]
    fn color_channels() {
        let c = interpolate(
            &Value::Color([0.0, 0.0, 0.0, 1.0]),
            &Value::Color([1.0, 0.5, 0.0, 0.0]),
            0.5,
        )
        .unwrap();
        match c {
            Value::Color(ch) => {
                assert_relative_eq!(ch[0], 0.5);
                assert_relative_eq!(ch[1], 0.25);
                assert_relative_eq!(ch[3], 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn discrete_steps_at_end() {
        let a = Value::Discrete("none".into());
        let b = Value::Discrete("block".into());
        assert_eq!(interpolate(&a, &b, 0.99).unwrap(), a);
        assert_eq!(interpolate(&a, &b, 1.0).unwrap(), b);
    }

    #[test]
    fn kind_mismatch_and_non_finite() {
        let err = interpolate(&Value::Scalar(1.0), &Value::Color([0.0; 4]), 0.5).unwrap_err();
        assert_eq!(
            err,
            ValueError::KindMismatch {
                from: ValueKind::Scalar,
                to: ValueKind::Color
            }
        );
        assert!(matches!(
            interpolate(&Value::Scalar(0.0), &Value::Scalar(1.0), f64::NAN),
            Err(ValueError::NonFiniteFactor { .. })
        ));
    }

    #[test]
    fn vector_length_checked() {
        let err = interpolate(&Value::Vector(vec![1.0]), &Value::Vector(vec![1.0, 2.0]), 0.5)
            .unwrap_err();
        assert_eq!(err, ValueError::LengthMismatch { from: 1, to: 2 });
    }
}
