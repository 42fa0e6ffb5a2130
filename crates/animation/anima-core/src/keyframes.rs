//! Keyframe segment resolution.
//!
//! Model:
//! - Keyframes carry an offset in [0,1], a property snapshot and an easing.
//! - Progress p selects the first pair `[k_i, k_{i+1}]` with
//!   `k_i.offset <= p <= k_{i+1}.offset`; p before the first or after the last
//!   offset clamps to the first or last segment.
//! - Local progress is eased with the *starting* keyframe's easing.

use serde::{Deserialize, Serialize};

use crate::config::{KeyframeSpec, PropertyMap};
use crate::easing::Easing;
use crate::error::{AnimaError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedKeyframe {
    pub offset: f64,
    pub properties: PropertyMap,
    pub ease: Easing,
}

impl From<&KeyframeSpec> for ProcessedKeyframe {
    fn from(spec: &KeyframeSpec) -> Self {
        Self {
            offset: spec.offset,
            properties: spec.properties.clone(),
            ease: spec.ease.clone().unwrap_or_default(),
        }
    }
}

/// Active segment for one progress sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentSample {
    /// Index of the starting keyframe; the segment is `[index, index + 1]`.
    pub index: usize,
    /// Linear progress within the segment, in [0, 1].
    pub local: f64,
    /// `local` after the starting keyframe's easing.
    pub eased: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeResolver {
    frames: Vec<ProcessedKeyframe>,
}

impl KeyframeResolver {
    /// Expects at least two keyframes with finite, non-decreasing offsets.
    /// Equal neighbouring offsets form a zero-width segment.
    pub fn new(frames: Vec<ProcessedKeyframe>) -> Result<Self> {
        if frames.len() < 2 {
            return Err(AnimaError::invalid_keyframes(
                "at least two keyframes are required",
            ));
        }
        for pair in frames.windows(2) {
            let (a, b) = (pair[0].offset, pair[1].offset);
            if !a.is_finite() || !b.is_finite() || b < a {
                return Err(AnimaError::invalid_keyframes(format!(
                    "offsets must be finite and ascending, got {a} then {b}"
                )));
            }
        }
        Ok(Self { frames })
    }

    pub fn from_specs(specs: &[KeyframeSpec]) -> Result<Self> {
        Self::new(specs.iter().map(ProcessedKeyframe::from).collect())
    }

    #[inline]
    pub fn frames(&self) -> &[ProcessedKeyframe] {
        &self.frames
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.frames.len() - 1
    }

    /// Start and end keyframe of segment `index`.
    pub fn segment(&self, index: usize) -> Option<(&ProcessedKeyframe, &ProcessedKeyframe)> {
        Some((self.frames.get(index)?, self.frames.get(index + 1)?))
    }

    pub fn resolve(&self, p: f64) -> SegmentSample {
        let index = self.find_segment(p);
        let k0 = &self.frames[index];
        let k1 = &self.frames[index + 1];
        let width = k1.offset - k0.offset;
        let local = if width > 0.0 {
            ((p - k0.offset) / width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        SegmentSample {
            index,
            local,
            eased: k0.ease.evaluate(local),
        }
    }

    // Linear scan; keyframe lists are short.
    fn find_segment(&self, p: f64) -> usize {
        let last = self.frames.len() - 2;
        if p < self.frames[0].offset {
            return 0;
        }
        for i in 0..=last {
            if self.frames[i].offset <= p && p <= self.frames[i + 1].offset {
                return i;
            }
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(offset: f64) -> ProcessedKeyframe {
        ProcessedKeyframe {
            offset,
            properties: PropertyMap::new(),
            ease: Easing::Linear,
        }
    }

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn quarter_progress_selects_first_segment() {
        let r = KeyframeResolver::new(vec![frame(0.0), frame(0.5), frame(1.0)]).unwrap();
        let s = r.resolve(0.25);
        assert_eq!(s.index, 0);
        assert_eq!(s.local, 0.5);
        assert_eq!(s.eased, 0.5);
        assert_eq!(r.resolve(0.75).index, 1);
    }

    #[test]
    fn shared_boundary_picks_first_pair() {
        let r = KeyframeResolver::new(vec![frame(0.0), frame(0.5), frame(1.0)]).unwrap();
        let s = r.resolve(0.5);
        assert_eq!(s.index, 0);
        assert_eq!(s.local, 1.0);
    }

    #[test]
    fn out_of_range_clamps() {
        let r = KeyframeResolver::new(vec![frame(0.2), frame(0.6), frame(0.8)]).unwrap();
        let s = r.resolve(0.1);
        assert_eq!((s.index, s.local), (0, 0.0));
        let s = r.resolve(0.95);
        assert_eq!((s.index, s.local), (1, 1.0));
    }

    #[test]
    fn zero_width_segment_is_defined() {
        let r = KeyframeResolver::new(vec![frame(0.0), frame(0.5), frame(0.5), frame(1.0)])
            .unwrap();
        let s = r.resolve(0.5);
        assert_eq!(s.index, 0);
        let s = r.resolve(0.75);
        assert_eq!(s.index, 2);
        assert!(approx(s.local, 0.5, 1e-12));
        let only = KeyframeResolver::new(vec![frame(0.3), frame(0.3)]).unwrap();
        assert_eq!(only.resolve(0.3).local, 0.0);
    }

    #[test]
    fn starting_keyframe_ease_is_applied() {
        let mut k0 = frame(0.0);
        k0.ease = Easing::steps(2, crate::easing::StepPosition::End);
        let r = KeyframeResolver::new(vec![k0, frame(1.0)]).unwrap();
        let s = r.resolve(0.4);
        assert_eq!(s.local, 0.4);
        assert_eq!(s.eased, 0.0);
    }

    #[test]
    fn rejects_short_or_descending_lists() {
        assert!(KeyframeResolver::new(vec![frame(0.0)]).is_err());
        assert!(KeyframeResolver::new(vec![frame(0.5), frame(0.2)]).is_err());
    }
}
