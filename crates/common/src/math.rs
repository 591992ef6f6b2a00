//! Vector and matrix helpers on top of glam.
//!
//! Rotations are Euler angles in radians stored as `Vec3(pitch, yaw, roll)`
//! and composed as `Ry(yaw) · Rx(pitch) · Rz(roll)`. Unrotated objects face -Z.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Errors from matrix operations.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MathError {
    #[error("matrix is singular (determinant {0})")]
    SingularMatrix(f32),
}

/// Quaternion for an Euler rotation `(pitch, yaw, roll)`.
pub fn euler_quat(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::YXZ, rotation.y, rotation.x, rotation.z)
}

/// Decompose a quaternion back into `(pitch, yaw, roll)`.
pub fn euler_from_quat(q: Quat) -> Vec3 {
    let (yaw, pitch, roll) = q.to_euler(EulerRot::YXZ);
    Vec3::new(pitch, yaw, roll)
}

/// Pure rotation matrix for an Euler rotation.
pub fn rotation_matrix(rotation: Vec3) -> Mat4 {
    Mat4::from_quat(euler_quat(rotation))
}

/// Local-to-parent matrix `T · R · S`.
pub fn compose_trs(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, euler_quat(rotation), position)
}

/// Direction an object with this rotation faces.
pub fn forward(rotation: Vec3) -> Vec3 {
    euler_quat(rotation) * Vec3::NEG_Z
}

/// Euler rotation (roll = 0) whose [`forward`] is `direction`.
///
/// Returns `None` for a zero or non-finite direction.
pub fn look_rotation(direction: Vec3) -> Option<Vec3> {
    let f = direction.normalize_or_zero();
    if f == Vec3::ZERO {
        return None;
    }
    let pitch = f.y.clamp(-1.0, 1.0).asin();
    let yaw = (-f.x).atan2(-f.z);
    Some(Vec3::new(pitch, yaw, 0.0))
}

/// Inverse of `m`, or an error when the determinant is zero.
pub fn try_inverse(m: &Mat4) -> Result<Mat4, MathError> {
    let det = m.determinant();
    if det == 0.0 || !det.is_finite() {
        return Err(MathError::SingularMatrix(det));
    }
    Ok(m.inverse())
}

/// Inverse of `m`, falling back to identity for singular input.
pub fn inverse_or_identity(m: &Mat4) -> Mat4 {
    match try_inverse(m) {
        Ok(inv) => inv,
        Err(e) => {
            tracing::warn!("matrix inversion error: {e}; using identity");
            Mat4::IDENTITY
        }
    }
}

/// Inverse-transpose of a model matrix, used to transform normals.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    inverse_or_identity(model).transpose()
}

/// Row-major element order, as uploaded with `transpose = true` by GL backends.
pub fn to_row_major(m: &Mat4) -> [[f32; 4]; 4] {
    m.transpose().to_cols_array_2d()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn normalize_zero_vector_is_zero() {
        assert_eq!(Vec3::ZERO.normalize_or_zero(), Vec3::ZERO);
        let n = Vec3::new(3.0, 0.0, 4.0).normalize_or_zero();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rotation_order_is_y_x_z() {
        let (x, y, z) = (0.3_f32, -1.1_f32, 0.7_f32);
        let expected = Mat4::from_rotation_y(y) * Mat4::from_rotation_x(x) * Mat4::from_rotation_z(z);
        let got = rotation_matrix(Vec3::new(x, y, z));
        assert!(got.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn compose_applies_scale_then_rotation_then_translation() {
        let m = compose_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, FRAC_PI_2, 0.0),
            Vec3::splat(2.0),
        );
        // +X scaled to 2, yawed a quarter turn onto -Z, then translated.
        let p = m.transform_point3(Vec3::X);
        assert!(approx_vec(p, Vec3::new(1.0, 2.0, 1.0)));
    }

    #[test]
    fn unrotated_forward_is_negative_z() {
        assert!(approx_vec(forward(Vec3::ZERO), Vec3::NEG_Z));
    }

    #[test]
    fn look_rotation_inverts_forward() {
        for dir in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-2.0, 1.0, 3.0),
            Vec3::new(0.0, -0.5, -1.0),
            Vec3::new(0.3, 0.2, 0.1),
        ] {
            let rot = look_rotation(dir).unwrap();
            assert!(approx_vec(forward(rot), dir.normalize()), "dir={dir}");
        }
    }

    #[test]
    fn look_rotation_rejects_zero() {
        assert!(look_rotation(Vec3::ZERO).is_none());
    }

    #[test]
    fn euler_round_trip() {
        let r = Vec3::new(0.4, -FRAC_PI_4, 0.2);
        assert!(approx_vec(euler_from_quat(euler_quat(r)), r));
    }

    #[test]
    fn inverse_of_trs() {
        let m = compose_trs(Vec3::new(4.0, -1.0, 2.0), Vec3::new(0.2, 0.5, -0.3), Vec3::new(1.0, 2.0, 0.5));
        let inv = try_inverse(&m).unwrap();
        assert!((m * inv).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn singular_matrix_reports_error_and_falls_back() {
        let flat = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(matches!(try_inverse(&flat), Err(MathError::SingularMatrix(_))));
        assert_eq!(inverse_or_identity(&flat), Mat4::IDENTITY);
        assert_eq!(normal_matrix(&flat), Mat4::IDENTITY);
    }

    #[test]
    fn normal_matrix_of_uniform_scale_is_scaled_rotation() {
        let m = Mat4::from_scale(Vec3::splat(2.0));
        let n = normal_matrix(&m);
        assert!(n.abs_diff_eq(Mat4::from_scale(Vec3::splat(0.5)), 1e-6));
    }

    #[test]
    fn row_major_puts_translation_in_last_column() {
        let m = Mat4::from_translation(Vec3::new(7.0, 8.0, 9.0));
        let rows = to_row_major(&m);
        assert_eq!(rows[0][3], 7.0);
        assert_eq!(rows[1][3], 8.0);
        assert_eq!(rows[2][3], 9.0);
        assert_eq!(rows[3], [0.0, 0.0, 0.0, 1.0]);
    }
}
