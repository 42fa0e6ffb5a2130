//! Affine transform decomposition into independently animatable components.
//!
//! Matrices are column-major `nalgebra::Matrix4<f64>` with the translation in
//! the last column. The linear part composes as `R * K * S`, where `R` is the
//! ZYX Euler rotation (`Rz * Ry * Rx`), `K` the shear and `S` the axis scale.

use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Tolerance for the gimbal-lock branch of Euler extraction.
pub const GIMBAL_EPSILON: f64 = 1e-4;

const DEGENERATE_SCALE: f64 = 1e-12;

/// translate (length units), rotate (degrees, XYZ order stored, ZYX composed),
/// scale (multiplier), skew (degrees).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformComponents {
    pub translate: [f64; 3],
    pub rotate: [f64; 3],
    pub scale: [f64; 3],
    pub skew: [f64; 2],
}

impl Default for TransformComponents {
    fn default() -> Self {
        Self {
            translate: [0.0; 3],
            rotate: [0.0; 3],
            scale: [1.0; 3],
            skew: [0.0; 2],
        }
    }
}

impl TransformComponents {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn with_translate(mut self, x: f64, y: f64, z: f64) -> Self {
        self.translate = [x, y, z];
        self
    }

    pub fn with_rotate(mut self, x: f64, y: f64, z: f64) -> Self {
        self.rotate = [x, y, z];
        self
    }

    pub fn with_scale(mut self, x: f64, y: f64, z: f64) -> Self {
        self.scale = [x, y, z];
        self
    }

    pub fn with_skew(mut self, x: f64, y: f64) -> Self {
        self.skew = [x, y];
        self
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        compose(self)
    }
}

/// Build the affine matrix for a set of components. Inverse of [`decompose`]
/// outside the gimbal-lock region and for `skew.y == 0`.
pub fn compose(c: &TransformComponents) -> Matrix4<f64> {
    let [rx, ry, rz] = c.rotate.map(f64::to_radians);
    let rot = Rotation3::from_euler_angles(rx, ry, rz);
    let [kx, ky] = c.skew.map(f64::to_radians);

    let c0 = rot * Vector3::new(ky.cos(), ky.sin(), 0.0) * c.scale[0];
    let c1 = rot * Vector3::new(kx.sin(), kx.cos(), 0.0) * c.scale[1];
    let c2 = rot * Vector3::z() * c.scale[2];

    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 1>(0, 0).copy_from(&c0);
    m.fixed_view_mut::<3, 1>(0, 1).copy_from(&c1);
    m.fixed_view_mut::<3, 1>(0, 2).copy_from(&c2);
    m[(0, 3)] = c.translate[0];
    m[(1, 3)] = c.translate[1];
    m[(2, 3)] = c.translate[2];
    m
}

/// Validate the matrix before decomposing it.
pub fn try_decompose(m: &Matrix4<f64>) -> Result<TransformComponents, ValueError> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(ValueError::DegenerateMatrix {
            reason: "non-finite entry".into(),
        });
    }
    if m[(3, 3)] == 0.0 {
        return Err(ValueError::DegenerateMatrix {
            reason: "homogeneous w is zero".into(),
        });
    }
    Ok(decompose(m))
}

/// Decompose an affine matrix into translate/rotate/scale/skew.
///
/// Scale is the norm of each basis column; a negative determinant is folded
/// into `scale.x`. The shear between the first two basis columns is reported
/// in `skew.x`; `skew.y` is always 0. In the gimbal-lock region
/// (`|r20|` within [`GIMBAL_EPSILON`] of 1) the X rotation is 0 by convention.
pub fn decompose(m: &Matrix4<f64>) -> TransformComponents {
    let w = m[(3, 3)];
    let m = if w != 0.0 && w != 1.0 { m / w } else { *m };

    let translate = [m[(0, 3)], m[(1, 3)], m[(2, 3)]];
    let linear: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();

    let mut scale = [0.0; 3];
    let mut basis = [Vector3::x(), Vector3::y(), Vector3::z()];
    for (i, axis) in basis.iter_mut().enumerate() {
        let col: Vector3<f64> = linear.column(i).into_owned();
        let norm = col.norm();
        scale[i] = norm;
        if norm > DEGENERATE_SCALE {
            *axis = col / norm;
        }
    }

    if linear.determinant() < 0.0 {
        scale[0] = -scale[0];
        basis[0] = -basis[0];
    }

    let [n0, n1, _] = basis;
    let shear = n0.dot(&n1).clamp(-1.0, 1.0);
    let skew_x = shear.asin().to_degrees();

    let mut y_axis = n1 - n0 * shear;
    let y_norm = y_axis.norm();
    if y_norm > DEGENERATE_SCALE {
        y_axis /= y_norm;
    } else {
        y_axis = any_orthogonal(&n0);
    }
    let z_axis = n0.cross(&y_axis);

    let r = Matrix3::from_columns(&[n0, y_axis, z_axis]);
    let rotate = euler_zyx_degrees(&r);

    TransformComponents {
        translate,
        rotate,
        scale,
        skew: [skew_x, 0.0],
    }
}

fn any_orthogonal(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let o = helper - v * v.dot(&helper);
    o.normalize()
}

/// Extract `[x, y, z]` in degrees from `R = Rz * Ry * Rx`.
fn euler_zyx_degrees(r: &Matrix3<f64>) -> [f64; 3] {
    let r20 = r[(2, 0)];
    let (x, y, z) = if r20.abs() > 1.0 - GIMBAL_EPSILON {
        let y = if r20 < 0.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            -std::f64::consts::FRAC_PI_2
        };
        (0.0, y, (-r[(0, 1)]).atan2(r[(1, 1)]))
    } else {
        (
            r[(2, 1)].atan2(r[(2, 2)]),
            (-r20).asin(),
            r[(1, 0)].atan2(r[(0, 0)]),
        )
    };
    [x.to_degrees(), y.to_degrees(), z.to_degrees()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_decomposes_to_defaults() {
        let c = decompose(&Matrix4::identity());
        assert_eq!(c, TransformComponents::identity());
    }

    #[test]
    fn translation_read_directly() {
        let mut m = Matrix4::identity();
        m[(0, 3)] = 3.0;
        m[(1, 3)] = -4.0;
        m[(2, 3)] = 5.0;
        assert_eq!(decompose(&m).translate, [3.0, -4.0, 5.0]);
    }

    #[test]
    fn homogeneous_w_is_normalized() {
        let m = compose(&TransformComponents::identity().with_translate(2.0, 4.0, 0.0)) * 2.0;
        let c = decompose(&m);
        assert_abs_diff_eq!(c.translate[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.scale[0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn negative_determinant_goes_to_scale_x() {
        let src = TransformComponents::identity().with_scale(-2.0, 3.0, 1.0);
        let c = decompose(&compose(&src));
        assert_abs_diff_eq!(c.scale[0], -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.scale[1], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.rotate[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn skew_x_recovered() {
        let src = TransformComponents::identity().with_skew(20.0, 0.0);
        let c = decompose(&compose(&src));
        assert_abs_diff_eq!(c.skew[0], 20.0, epsilon = 1e-9);
        assert_eq!(c.skew[1], 0.0);
        assert_abs_diff_eq!(c.scale[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_matrices_rejected() {
        let mut m = Matrix4::identity();
        m[(3, 3)] = 0.0;
        assert!(try_decompose(&m).is_err());
        m[(3, 3)] = 1.0;
        m[(0, 0)] = f64::NAN;
        assert!(try_decompose(&m).is_err());
    }

    #[test]
    fn zero_scale_column_does_not_produce_nan() {
        let src = TransformComponents::identity().with_scale(0.0, 1.0, 1.0);
        let c = decompose(&compose(&src));
        assert!(c.rotate.iter().all(|v| v.is_finite()));
        assert_eq!(c.scale[0], 0.0);
    }
}
