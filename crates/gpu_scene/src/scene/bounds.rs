//! Axis-aligned box plus bounding sphere

use crate::foundation::math::{utils, Mat4, Vec3};

/// Axis-aligned bounding box with a cached bounding sphere
///
/// The default value is the zero-sized "empty" bounds. Empty bounds are
/// skipped by [`Bounds::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    /// Center of the box and of the bounding sphere
    pub center: Vec3,
    /// Half-size along each axis
    pub extents: Vec3,
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
    /// Radius of the sphere enclosing the box
    pub sphere_radius: f32,
}

impl Bounds {
    /// Create bounds from min and max corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let center = (min + max) * 0.5;
        let extents = (max - min) * 0.5;
        Self {
            center,
            extents,
            min,
            max,
            sphere_radius: extents.norm(),
        }
    }

    /// Create bounds centered at a point with given half-size
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self::from_min_max(center - extents, center + extents)
    }

    /// Smallest bounds enclosing every point, or empty bounds for no points
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        let (min, max) = iter.fold((*first, *first), |(min, max), p| (min.inf(p), max.sup(p)));
        Self::from_min_max(min, max)
    }

    /// True for zero-sized bounds, which `merge` ignores
    pub fn is_empty(&self) -> bool {
        self.min == self.max
    }

    /// Grow to enclose `other`. Empty bounds on either side are ignored.
    pub fn merge(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }
        *self = Self::from_min_max(self.min.inf(&other.min), self.max.sup(&other.max));
    }

    /// Copying form of [`Bounds::merge`]
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = *self;
        result.merge(other);
        result
    }

    /// The eight box corners
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Bounds of the eight corners transformed by `matrix`.
    ///
    /// Exact for translations and axis-aligned scales, conservative for
    /// rotations and approximate under perspective.
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let corners = self.corners().map(|c| utils::transform_point_homogeneous(matrix, &c));
        Self::from_points(corners.iter())
    }

    /// Check if the box contains a point
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this box overlaps another
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}
