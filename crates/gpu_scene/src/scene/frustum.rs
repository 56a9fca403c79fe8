//! Six-plane view frustum for visibility culling

use crate::foundation::math::{utils, Mat4, Vec3, Vec4};
use super::bounds::Bounds;

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized once built by [`Plane::from_coefficients`])
    pub normal: Vec3,
    /// Signed distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a plane from a normal and distance
    pub const fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Build a normalized plane from `ax + by + cz + d` coefficients.
    ///
    /// A zero-length normal yields a degenerate plane that accepts everything.
    pub fn from_coefficients(coefficients: &Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.norm();
        if length <= f32::EPSILON {
            return Self::new(Vec3::zeros(), 0.0);
        }
        Self::new(normal / length, coefficients.w / length)
    }

    /// Signed distance from the plane; positive on the inside
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Frustum plane slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumPlane {
    /// Left clip plane
    Left = 0,
    /// Right clip plane
    Right = 1,
    /// Bottom clip plane
    Bottom = 2,
    /// Top clip plane
    Top = 3,
    /// Near clip plane
    Near = 4,
    /// Far clip plane
    Far = 5,
}

/// Frustum for visibility culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Six planes: left, right, bottom, top, near, far. Normals point inward.
    pub planes: [Plane; 6],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_matrix(&Mat4::identity())
    }
}

impl Frustum {
    /// Create a frustum from six planes
    pub const fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for OpenGL-style clip space
    /// (`-w <= x, y, z <= w`): each plane is the fourth row plus or minus
    /// one of the first three rows.
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let r0 = utils::row(view_projection, 0);
        let r1 = utils::row(view_projection, 1);
        let r2 = utils::row(view_projection, 2);
        let r3 = utils::row(view_projection, 3);

        Self {
            planes: [
                Plane::from_coefficients(&(r3 + r0)),
                Plane::from_coefficients(&(r3 - r0)),
                Plane::from_coefficients(&(r3 + r1)),
                Plane::from_coefficients(&(r3 - r1)),
                Plane::from_coefficients(&(r3 + r2)),
                Plane::from_coefficients(&(r3 - r2)),
            ],
        }
    }

    /// Access one plane
    pub const fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// False if the sphere lies entirely behind any plane
    pub fn contains_sphere(&self, center: &Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// False only if all eight corners lie behind the same plane
    ///
    /// Boxes near frustum corners can pass without being visible.
    pub fn contains_box(&self, bounds: &Bounds) -> bool {
        let corners = bounds.corners();
        self.planes.iter().all(|plane| {
            corners
                .iter()
                .any(|corner| plane.distance_to_point(corner) >= 0.0)
        })
    }

    /// Check if a point is inside the frustum
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.contains_sphere(point, 0.0)
    }
}
