//! Easing curves applied to normalized progress.
//!
//! Built-in curves always map 0 to 0 and 1 to 1 exactly; overshooting curves
//! (back, elastic) may leave [0, 1] in between. Names parse from CSS-style
//! (`"ease-in-out"`, `"cubic-bezier(0.4,0,0.2,1)"`, `"steps(4,end)"`) and
//! camel-case Penner forms (`"easeInOutQuad"`).

use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AnimaError, Result};

/// Penner curve families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PennerCurve {
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Back,
    Elastic,
    Bounce,
}

impl PennerCurve {
    pub const ALL: [PennerCurve; 10] = [
        PennerCurve::Quad,
        PennerCurve::Cubic,
        PennerCurve::Quart,
        PennerCurve::Quint,
        PennerCurve::Sine,
        PennerCurve::Expo,
        PennerCurve::Circ,
        PennerCurve::Back,
        PennerCurve::Elastic,
        PennerCurve::Bounce,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PennerCurve::Quad => "Quad",
            PennerCurve::Cubic => "Cubic",
            PennerCurve::Quart => "Quart",
            PennerCurve::Quint => "Quint",
            PennerCurve::Sine => "Sine",
            PennerCurve::Expo => "Expo",
            PennerCurve::Circ => "Circ",
            PennerCurve::Back => "Back",
            PennerCurve::Elastic => "Elastic",
            PennerCurve::Bounce => "Bounce",
        }
    }

    /// The "in" form; "out" and "in-out" are derived from it.
    fn ease_in(self, t: f64) -> f64 {
        const C1: f64 = 1.70158;
        const C3: f64 = C1 + 1.0;
        match self {
            PennerCurve::Quad => t * t,
            PennerCurve::Cubic => t * t * t,
            PennerCurve::Quart => t.powi(4),
            PennerCurve::Quint => t.powi(5),
            PennerCurve::Sine => 1.0 - (t * PI / 2.0).cos(),
            PennerCurve::Expo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            PennerCurve::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            PennerCurve::Back => C3 * t * t * t - C1 * t * t,
            PennerCurve::Elastic => {
                if t <= 0.0 || t >= 1.0 {
                    t.clamp(0.0, 1.0)
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
                }
            }
            PennerCurve::Bounce => 1.0 - bounce_out(1.0 - t),
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EaseMode {
    In,
    Out,
    InOut,
}

impl EaseMode {
    fn prefix(self) -> &'static str {
        match self {
            EaseMode::In => "easeIn",
            EaseMode::Out => "easeOut",
            EaseMode::InOut => "easeInOut",
        }
    }
}

/// Position of the jump for stepped easing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StepPosition {
    Start,
    #[default]
    End,
    Both,
    None,
}

impl StepPosition {
    pub fn name(self) -> &'static str {
        match self {
            StepPosition::Start => "start",
            StepPosition::End => "end",
            StepPosition::Both => "both",
            StepPosition::None => "none",
        }
    }
}

/// Easing function for a run or a keyframe segment.
#[derive(Clone, Default)]
pub enum Easing {
    #[default]
    Linear,
    /// CSS `ease`, `cubic-bezier(0.25, 0.1, 0.25, 1)`.
    Ease,
    /// CSS `ease-in`, `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,
    /// CSS `ease-out`, `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,
    /// CSS `ease-in-out`, `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,
    Penner {
        curve: PennerCurve,
        mode: EaseMode,
    },
    CubicBezier {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Steps {
        count: u32,
        position: StepPosition,
    },
    /// Host-supplied function; evaluated as-is and never serialized.
    Custom(Rc<dyn Fn(f64) -> f64>),
}

impl Easing {
    pub fn penner(curve: PennerCurve, mode: EaseMode) -> Self {
        Easing::Penner { curve, mode }
    }

    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Easing::CubicBezier { x1, y1, x2, y2 }
    }

    pub fn steps(count: u32, position: StepPosition) -> Self {
        Easing::Steps { count, position }
    }

    pub fn custom(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Easing::Custom(Rc::new(f))
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, Easing::Linear)
    }

    /// Map linear progress to eased progress. Input is clamped to [0, 1].
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if let Easing::Custom(f) = self {
            return f(t);
        }
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => t,
            Easing::Ease => cubic_bezier_ease(t, 0.25, 0.1, 0.25, 1.0),
            Easing::EaseIn => cubic_bezier_ease(t, 0.42, 0.0, 1.0, 1.0),
            Easing::EaseOut => cubic_bezier_ease(t, 0.0, 0.0, 0.58, 1.0),
            Easing::EaseInOut => cubic_bezier_ease(t, 0.42, 0.0, 0.58, 1.0),
            Easing::Penner { curve, mode } => match mode {
                EaseMode::In => curve.ease_in(t),
                EaseMode::Out => 1.0 - curve.ease_in(1.0 - t),
                EaseMode::InOut => {
                    if t < 0.5 {
                        curve.ease_in(2.0 * t) / 2.0
                    } else {
                        1.0 - curve.ease_in(2.0 - 2.0 * t) / 2.0
                    }
                }
            },
            Easing::CubicBezier { x1, y1, x2, y2 } => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
            Easing::Steps { count, position } => stepped(*count, *position, t),
            Easing::Custom(_) => t,
        }
    }

    /// Reject curves that cannot be evaluated meaningfully.
    pub fn validate(&self) -> Result<()> {
        match self {
            Easing::CubicBezier { x1, y1, x2, y2 } => {
                if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
                    return Err(AnimaError::invalid_config(
                        "ease",
                        "cubic-bezier control points must be finite",
                    ));
                }
                if !(0.0..=1.0).contains(x1) || !(0.0..=1.0).contains(x2) {
                    return Err(AnimaError::invalid_config(
                        "ease",
                        "cubic-bezier x values must be in [0, 1]",
                    ));
                }
                Ok(())
            }
            Easing::Steps { count, position } => {
                let min = if *position == StepPosition::None { 2 } else { 1 };
                if *count < min {
                    return Err(AnimaError::invalid_config(
                        "ease",
                        format!("steps({count}, {}) needs at least {min} steps", position.name()),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// CSS cubic-bezier timing: Newton-Raphson with a bisection fallback.
fn cubic_bezier_ease(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let mut p = x;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-9 {
            return bezier_sample(p, y1, y2);
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-9 {
            break;
        }
        p -= err / slope;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = x;
    for _ in 0..40 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-9 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }
    bezier_sample(p, y1, y2)
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

fn stepped(count: u32, position: StepPosition, t: f64) -> f64 {
    let n = count.max(1) as f64;
    let jumps = match position {
        StepPosition::Start | StepPosition::End => n,
        StepPosition::Both => n + 1.0,
        StepPosition::None => n - 1.0,
    };
    if jumps <= 0.0 {
        return 0.0;
    }
    let mut step = (t * n).floor();
    if matches!(position, StepPosition::Start | StepPosition::Both) {
        step += 1.0;
    }
    (step / jumps).clamp(0.0, 1.0)
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Custom(_) => f.write_str("Custom(..)"),
            other => write!(f, "Easing({other})"),
        }
    }
}

impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Easing::Custom(a), Easing::Custom(b)) => Rc::ptr_eq(a, b),
            (Easing::Linear, Easing::Linear)
            | (Easing::Ease, Easing::Ease)
            | (Easing::EaseIn, Easing::EaseIn)
            | (Easing::EaseOut, Easing::EaseOut)
            | (Easing::EaseInOut, Easing::EaseInOut) => true,
            (
                Easing::Penner { curve: a, mode: m },
                Easing::Penner { curve: b, mode: n },
            ) => a == b && m == n,
            (
                Easing::CubicBezier { x1, y1, x2, y2 },
                Easing::CubicBezier {
                    x1: a1,
                    y1: b1,
                    x2: a2,
                    y2: b2,
                },
            ) => x1 == a1 && y1 == b1 && x2 == a2 && y2 == b2,
            (
                Easing::Steps { count, position },
                Easing::Steps {
                    count: c,
                    position: p,
                },
            ) => count == c && position == p,
            _ => false,
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => f.write_str("linear"),
            Easing::Ease => f.write_str("ease"),
            Easing::EaseIn => f.write_str("ease-in"),
            Easing::EaseOut => f.write_str("ease-out"),
            Easing::EaseInOut => f.write_str("ease-in-out"),
            Easing::Penner { curve, mode } => write!(f, "{}{}", mode.prefix(), curve.name()),
            Easing::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({x1},{y1},{x2},{y2})")
            }
            Easing::Steps { count, position } => write!(f, "steps({count},{})", position.name()),
            Easing::Custom(_) => f.write_str("custom"),
        }
    }
}

fn bad_name(raw: &str) -> AnimaError {
    AnimaError::invalid_config("ease", format!("unknown easing '{raw}'"))
}

fn call_args<'a>(s: &'a str, name: &str) -> Option<Vec<&'a str>> {
    let rest = s.strip_prefix(name)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split(',').map(str::trim).collect())
}

impl FromStr for Easing {
    type Err = AnimaError;

    fn from_str(raw: &str) -> Result<Self> {
        let s = raw.trim().to_ascii_lowercase();

        if let Some(args) = call_args(&s, "cubic-bezier") {
            let nums: Vec<f64> = args
                .iter()
                .map(|a| a.parse::<f64>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| bad_name(raw))?;
            let &[x1, y1, x2, y2] = nums.as_slice() else {
                return Err(bad_name(raw));
            };
            let ease = Easing::cubic_bezier(x1, y1, x2, y2);
            ease.validate()?;
            return Ok(ease);
        }

        if let Some(args) = call_args(&s, "steps") {
            let count = args
                .first()
                .and_then(|a| a.parse::<u32>().ok())
                .ok_or_else(|| bad_name(raw))?;
            let position = match args.get(1).copied() {
                None | Some("end") | Some("jump-end") => StepPosition::End,
                Some("start") | Some("jump-start") => StepPosition::Start,
                Some("both") | Some("jump-both") => StepPosition::Both,
                Some("none") | Some("jump-none") => StepPosition::None,
                Some(_) => return Err(bad_name(raw)),
            };
            let ease = Easing::steps(count, position);
            ease.validate()?;
            return Ok(ease);
        }

        let key: String = s.chars().filter(|c| *c != '-' && *c != '_').collect();
        match key.as_str() {
            "linear" => return Ok(Easing::Linear),
            "ease" => return Ok(Easing::Ease),
            "easein" => return Ok(Easing::EaseIn),
            "easeout" => return Ok(Easing::EaseOut),
            "easeinout" => return Ok(Easing::EaseInOut),
            "stepstart" => return Ok(Easing::steps(1, StepPosition::Start)),
            "stepend" => return Ok(Easing::steps(1, StepPosition::End)),
            _ => {}
        }

        // Longest prefix first so "easeinout" is not taken for "easein".
        let modes = [
            ("easeinout", EaseMode::InOut),
            ("easein", EaseMode::In),
            ("easeout", EaseMode::Out),
        ];
        for (prefix, mode) in modes {
            if let Some(rest) = key.strip_prefix(prefix) {
                if let Some(curve) = PennerCurve::ALL
                    .iter()
                    .find(|c| c.name().eq_ignore_ascii_case(rest))
                {
                    return Ok(Easing::penner(*curve, mode));
                }
            }
        }
        Err(bad_name(raw))
    }
}

impl Serialize for Easing {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if let Easing::Custom(_) = self {
            return Err(serde::ser::Error::custom(
                "custom easing functions are not serializable",
            ));
        }
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Easing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn endpoints_are_exact_for_builtins() {
        let mut all = vec![
            Easing::Linear,
            Easing::Ease,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::cubic_bezier(0.68, -0.55, 0.27, 1.55),
            Easing::steps(4, StepPosition::Start),
            Easing::steps(3, StepPosition::None),
        ];
        for curve in PennerCurve::ALL {
            for mode in [EaseMode::In, EaseMode::Out, EaseMode::InOut] {
                all.push(Easing::penner(curve, mode));
            }
        }
        for e in all {
            assert_eq!(e.evaluate(0.0), 0.0, "{e}");
            assert_eq!(e.evaluate(1.0), 1.0, "{e}");
            assert!(e.evaluate(0.5).is_finite(), "{e}");
        }
    }

    #[test]
    fn css_curves_match_reference_points() {
        assert!(approx(Easing::EaseInOut.evaluate(0.5), 0.5, 1e-6));
        assert!(Easing::EaseIn.evaluate(0.25) < 0.25);
        assert!(Easing::EaseOut.evaluate(0.25) > 0.25);
        assert!(approx(Easing::Ease.evaluate(0.5), 0.8024033877399112, 1e-4));
    }

    #[test]
    fn penner_out_mirrors_in() {
        let quad_in = Easing::penner(PennerCurve::Quad, EaseMode::In);
        let quad_out = Easing::penner(PennerCurve::Quad, EaseMode::Out);
        assert!(approx(quad_in.evaluate(0.5), 0.25, 1e-12));
        assert!(approx(quad_out.evaluate(0.5), 0.75, 1e-12));
        let bounce_out = Easing::penner(PennerCurve::Bounce, EaseMode::Out);
        assert!(approx(bounce_out.evaluate(0.5), super::bounce_out(0.5), 1e-12));
    }

    #[test]
    fn steps_positions() {
        let end = Easing::steps(4, StepPosition::End);
        assert_eq!(end.evaluate(0.2), 0.0);
        assert_eq!(end.evaluate(0.3), 0.25);
        let start = Easing::steps(4, StepPosition::Start);
        assert_eq!(start.evaluate(0.2), 0.25);
        let both = Easing::steps(3, StepPosition::Both);
        assert_eq!(both.evaluate(0.1), 0.25);
        let none = Easing::steps(3, StepPosition::None);
        assert_eq!(none.evaluate(0.5), 0.5);
    }

    #[test]
    fn parses_names() {
        assert_eq!("linear".parse::<Easing>().unwrap(), Easing::Linear);
        assert_eq!("ease-in-out".parse::<Easing>().unwrap(), Easing::EaseInOut);
        assert_eq!(
            "easeInOutQuad".parse::<Easing>().unwrap(),
            Easing::penner(PennerCurve::Quad, EaseMode::InOut)
        );
        assert_eq!(
            "easeOutBounce".parse::<Easing>().unwrap(),
            Easing::penner(PennerCurve::Bounce, EaseMode::Out)
        );
        assert_eq!(
            "cubic-bezier(0.4, 0, 0.2, 1)".parse::<Easing>().unwrap(),
            Easing::cubic_bezier(0.4, 0.0, 0.2, 1.0)
        );
        assert_eq!(
            "steps(4, jump-start)".parse::<Easing>().unwrap(),
            Easing::steps(4, StepPosition::Start)
        );
        assert!("wobble".parse::<Easing>().is_err());
        assert!("cubic-bezier(1.5,0,0,1)".parse::<Easing>().is_err());
        assert!("steps(0)".parse::<Easing>().is_err());
    }

    #[test]
    fn display_roundtrips_through_parse() {
        let samples = [
            Easing::EaseOut,
            Easing::penner(PennerCurve::Elastic, EaseMode::In),
            Easing::cubic_bezier(0.1, 0.7, 1.0, 0.1),
            Easing::steps(5, StepPosition::End),
        ];
        for e in samples {
            assert_eq!(e.to_string().parse::<Easing>().unwrap(), e);
        }
    }

    #[test]
    fn custom_is_evaluated_and_not_serialized() {
        let e = Easing::custom(|t| t * 0.5);
        assert_eq!(e.evaluate(1.0), 0.5);
        assert!(serde_json::to_string(&e).is_err());
        assert_eq!(e.clone(), e);
        assert_ne!(Easing::custom(|t| t), e);
    }
}
