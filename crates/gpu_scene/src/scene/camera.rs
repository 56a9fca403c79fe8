//! # Camera
//!
//! Look-at camera with perspective or orthographic projection, plus the
//! [`CameraProvider`] trait scene views read matrices through.
//!
//! ## Coordinate System
//! Right-handed, Y-up view space looking down -Z. Projections map depth to
//! OpenGL-style clip space (`-w..w`), which is what
//! [`Frustum::from_matrix`](super::Frustum::from_matrix) expects.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Source of view and projection matrices
///
/// Scene views treat cameras as opaque providers; anything that can produce
/// a view matrix, a projection matrix and its clip distances can drive one.
pub trait CameraProvider {
    /// World-to-view transform
    fn view_matrix(&self) -> Mat4;

    /// View-to-clip transform
    fn projection_matrix(&self) -> Mat4;

    /// Near clip distance
    fn near(&self) -> f32;

    /// Far clip distance
    fn far(&self) -> f32;
}

/// Projection model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective with a vertical field of view in radians
    Perspective {
        /// Vertical field of view (radians)
        fov_y: f32,
    },
    /// Orthographic with a view-volume height in world units
    Orthographic {
        /// Height of the view volume
        height: f32,
    },
}

/// 3D Camera for perspective and orthographic projections
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Projection model
    pub projection: Projection,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Perspective {
                fov_y: utils::deg_to_rad(fov_degrees),
            },
            aspect,
            near,
            far,
        }
    }

    /// Create an orthographic camera looking at the origin
    pub fn orthographic(position: Vec3, height: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Orthographic { height },
            aspect,
            near,
            far,
        }
    }

    /// Point the camera at `target` with a new up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Update the aspect ratio after a viewport resize
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Unit vector from the position toward the target
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vec3::z())
    }
}

impl CameraProvider for Camera {
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y } => Mat4::perspective(fov_y, self.aspect, self.near, self.far),
            Projection::Orthographic { height } => {
                let half_h = height * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    fn near(&self) -> f32 {
        self.near
    }

    fn far(&self) -> f32 {
        self.far
    }
}
