//! View bases for orthographic and isometric projection.
//!
//! Every view is a proper rotation taking model space into view space,
//! where `u = x'` runs right, `v = y'` runs up and `depth = z'` points toward
//! the viewer. A face is seen from the front when its rotated normal has a
//! positive `z'`.
//!
//! The six orthographic rotations are exact permutation matrices laid out
//! for third-angle projection: the top view shows the front of the part at
//! its bottom edge, the right view shows it on its left edge, and so on.

use std::f64::consts::FRAC_PI_4;

use draftkit_math::{rotation_x, rotation_y, Mat3, Point3, Points3};
use serde::{Deserialize, Serialize};

use crate::types::{Point2D, ViewOrientation};

/// Isometric tilt about X: `atan(1 / sqrt(2))`, about 35.264 degrees.
pub fn isometric_tilt() -> f64 {
    (1.0 / 2f64.sqrt()).atan()
}

/// Optional mirroring applied to every view's 2D output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mirror {
    /// Negate `u`.
    pub horizontal: bool,
    /// Negate `v`.
    pub vertical: bool,
}

/// Rotation plus output flips for one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewMatrix {
    /// Model to view rotation.
    pub rotation: Mat3,
    /// Negate `u` after rotating.
    pub flip_u: bool,
    /// Negate `v` after rotating.
    pub flip_v: bool,
}

impl ViewMatrix {
    /// Basis for `orientation` with no mirroring.
    pub fn for_view(orientation: ViewOrientation) -> Self {
        #[rustfmt::skip]
        let rotation = match orientation {
            // (x, y, z)
            ViewOrientation::Front => Mat3::identity(),
            // (-x, y, -z)
            ViewOrientation::Back => Mat3::new(
                -1.0, 0.0, 0.0,
                0.0, 1.0, 0.0,
                0.0, 0.0, -1.0,
            ),
            // (x, -z, y)
            ViewOrientation::Top => Mat3::new(
                1.0, 0.0, 0.0,
                0.0, 0.0, -1.0,
                0.0, 1.0, 0.0,
            ),
            // (x, z, -y)
            ViewOrientation::Bottom => Mat3::new(
                1.0, 0.0, 0.0,
                0.0, 0.0, 1.0,
                0.0, -1.0, 0.0,
            ),
            // (z, y, -x)
            ViewOrientation::Left => Mat3::new(
                0.0, 0.0, 1.0,
                0.0, 1.0, 0.0,
                -1.0, 0.0, 0.0,
            ),
            // (-z, y, x)
            ViewOrientation::Right => Mat3::new(
                0.0, 0.0, -1.0,
                0.0, 1.0, 0.0,
                1.0, 0.0, 0.0,
            ),
            ViewOrientation::Isometric => rotation_x(isometric_tilt()) * rotation_y(FRAC_PI_4),
        };
        Self {
            rotation,
            flip_u: false,
            flip_v: false,
        }
    }

    /// Basis for `orientation` with a drawing-wide mirror applied.
    pub fn with_mirror(orientation: ViewOrientation, mirror: Mirror) -> Self {
        Self {
            flip_u: mirror.horizontal,
            flip_v: mirror.vertical,
            ..Self::for_view(orientation)
        }
    }

    /// Rotate a 3xN block of column vectors in one multiply.
    pub fn rotate(&self, columns: &Points3) -> Points3 {
        self.rotation * columns
    }

    /// Map an already-rotated point to 2D, applying flips.
    pub fn to_view_plane(&self, x: f64, y: f64) -> Point2D {
        let u = if self.flip_u { -x } else { x };
        let v = if self.flip_v { -y } else { y };
        Point2D::new(u, v)
    }

    /// Project a single point, returning its 2D position and depth.
    pub fn project_point(&self, p: &Point3) -> (Point2D, f64) {
        let r = self.rotation * p.coords;
        (self.to_view_plane(r.x, r.y), r.z)
    }
}
