#![warn(missing_docs)]

//! Math types for the draftkit drawing generator.
//!
//! Thin wrappers around nalgebra providing the handful of types the
//! mesh and drafting crates share: points, vectors, 3x3 rotation
//! matrices and column-packed point sets.
//!
//! Coordinates follow the drawing convention X = right, Y = up,
//! Z = forward (toward a viewer standing in front of the part).

use nalgebra::{Matrix3, Matrix3xX, Vector3};

/// A point in 3D model space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in 2D view space.
pub type Point2 = nalgebra::Point2<f64>;

/// A 3x3 matrix, used for view rotations.
pub type Mat3 = Matrix3<f64>;

/// Column-packed 3D data (one point or vector per column), used for
/// batched transforms.
pub type Points3 = Matrix3xX<f64>;

/// Rotation about the X axis by `angle` radians.
pub fn rotation_x(angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    Mat3::new(
        1.0, 0.0, 0.0, //
        0.0, c, -s, //
        0.0, s, c,
    )
}

/// Rotation about the Y axis by `angle` radians.
pub fn rotation_y(angle: f64) -> Mat3 {
    let (s, c) = angle.sin_cos();
    Mat3::new(
        c, 0.0, s, //
        0.0, 1.0, 0.0, //
        -s, 0.0, c,
    )
}

/// Check that `m` is a proper rotation (orthonormal with determinant +1).
pub fn is_rotation(m: &Mat3, tol: f64) -> bool {
    let should_be_identity = m.transpose() * m;
    (should_be_identity - Mat3::identity()).abs().max() < tol && (m.determinant() - 1.0).abs() < tol
}

/// Pack a slice of points into a 3xN matrix, one point per column.
pub fn pack_points(points: &[Point3]) -> Points3 {
    Points3::from_fn(points.len(), |row, col| points[col][row])
}

/// Pack a slice of vectors into a 3xN matrix, one vector per column.
pub fn pack_vectors(vectors: &[Vec3]) -> Points3 {
    Points3::from_fn(vectors.len(), |row, col| vectors[col][row])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotation_x_90_maps_y_to_z() {
        let r = rotation_x(FRAC_PI_2);
        let v = r * Vec3::y();
        assert_relative_eq!(v, Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_y_90_maps_z_to_x() {
        let r = rotation_y(FRAC_PI_2);
        let v = r * Vec3::z();
        assert_relative_eq!(v, Vec3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_is_rotation() {
        let r = rotation_x(0.3) * rotation_y(-1.1);
        assert!(is_rotation(&r, 1e-12));

        let mirror = Mat3::from_diagonal(&Vec3::new(-1.0, 1.0, 1.0));
        assert!(!is_rotation(&mirror, 1e-12));
    }

    #[test]
    fn test_pack_points_is_column_major() {
        let pts = [Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)];
        let m = pack_points(&pts);
        assert_eq!(m.ncols(), 2);
        assert_eq!(m[(0, 1)], 4.0);
        assert_eq!(m[(2, 0)], 3.0);

        let rotated = rotation_x(FRAC_PI_2) * m;
        assert_relative_eq!(rotated[(1, 0)], -3.0, epsilon = 1e-12);
        assert_relative_eq!(rotated[(2, 0)], 2.0, epsilon = 1e-12);
    }
}
