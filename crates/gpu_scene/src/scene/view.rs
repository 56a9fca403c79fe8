//! Scene view: camera-derived matrices, frustum and per-frame cull data

use crate::config::ViewConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, Vec4};
use crate::gpu::DrawCullData;
use super::bounds::Bounds;
use super::camera::CameraProvider;
use super::frustum::Frustum;

/// Smallest half-size used for shadow volumes around degenerate bounds
const MIN_SHADOW_RADIUS: f32 = 1.0e-3;

/// A point of view onto the scene
#[derive(Debug, Clone)]
pub struct SceneView {
    config: ViewConfig,
    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    frustum: Frustum,
    znear: f32,
    zfar: f32,
    view_bounds: Bounds,
}

impl Default for SceneView {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl SceneView {
    /// View with identity matrices
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            view: Mat4::identity(),
            projection: Mat4::identity(),
            view_projection: Mat4::identity(),
            frustum: Frustum::from_matrix(&Mat4::identity()),
            znear: 0.0,
            zfar: 1.0,
            view_bounds: Bounds::default(),
        }
    }

    /// Adopt a camera's matrices and rebuild the frustum
    pub fn set_camera(&mut self, camera: &impl CameraProvider) {
        self.set_matrices(camera.view_matrix(), camera.projection_matrix(), camera.near(), camera.far());
    }

    /// Light-facing orthographic view enclosing `bounds`.
    ///
    /// The eye sits outside the bounding sphere, opposite `light_dir`, and the
    /// projection covers the whole sphere. The bounds also become the view's
    /// AABB.
    pub fn setup_shadow_view(&mut self, light_dir: &Vec3, bounds: &Bounds) {
        let direction = light_dir.try_normalize(f32::EPSILON).unwrap_or_else(|| -Vec3::y());
        let radius = bounds.sphere_radius.max(MIN_SHADOW_RADIUS);
        let center = bounds.center;
        let eye = center - direction * (radius * 2.0);

        let up = if direction.cross(&Vec3::y()).norm() > 1.0e-3 {
            Vec3::y()
        } else {
            Vec3::z()
        };

        let view = Mat4::look_at(eye, center, up);
        let (znear, zfar) = (radius, radius * 3.0);
        let projection = Mat4::orthographic(-radius, radius, -radius, radius, znear, zfar);

        self.set_matrices(view, projection, znear, zfar);
        self.view_bounds = *bounds;
    }

    /// World-space AABB used when AABB culling is on
    pub fn set_view_bounds(&mut self, bounds: Bounds) {
        self.view_bounds = bounds;
    }

    /// Replace the culling switches
    pub fn set_config(&mut self, config: ViewConfig) {
        self.config = config;
    }

    /// Culling switches
    pub const fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// World-to-view transform
    pub const fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    /// View-to-clip transform
    pub const fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Projection * view
    pub const fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// Frustum extracted from the view-projection matrix
    pub const fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// AABB copied into cull data
    pub const fn view_bounds(&self) -> &Bounds {
        &self.view_bounds
    }

    /// Pack the per-frame parameters for the GPU culling pass.
    ///
    /// The side planes are the normalized `row3 + row0` and `row3 + row1` of
    /// the projection matrix (columns of its transpose); symmetric frusta only
    /// need their x/z and y/z terms.
    pub fn cull_data(&self, draw_count: u32) -> DrawCullData {
        let projection_t = self.projection.transpose();
        let frustum_x = normalize_plane(&(projection_t.column(3) + projection_t.column(0)));
        let frustum_y = normalize_plane(&(projection_t.column(3) + projection_t.column(1)));

        let (aabb_min, aabb_max) = if self.config.aabb_culling {
            let (lo, hi) = (self.view_bounds.min, self.view_bounds.max);
            ([lo.x, lo.y, lo.z, 0.0], [hi.x, hi.y, hi.z, 0.0])
        } else {
            ([0.0; 4], [0.0; 4])
        };

        DrawCullData {
            view: utils::to_cols_array(&self.view),
            p00: self.projection[(0, 0)],
            p11: self.projection[(1, 1)],
            znear: self.znear,
            zfar: self.zfar,
            frustum: [frustum_x.x, frustum_x.z, frustum_y.y, frustum_y.z],
            draw_count,
            culling_enabled: u32::from(self.config.frustum_culling),
            dist_cull: u32::from(self.config.distance_culling),
            aabb_check: u32::from(self.config.aabb_culling),
            aabb_min,
            aabb_max,
        }
    }

    fn set_matrices(&mut self, view: Mat4, projection: Mat4, znear: f32, zfar: f32) {
        self.view = view;
        self.projection = projection;
        self.view_projection = projection * view;
        self.frustum = Frustum::from_matrix(&self.view_projection);
        self.znear = znear;
        self.zfar = zfar;
    }
}

/// Divide a plane by the length of its normal
fn normalize_plane(plane: &Vec4) -> Vec4 {
    let length = plane.xyz().norm();
    if length > f32::EPSILON {
        plane / length
    } else {
        *plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Camera;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn camera() -> Camera {
        let mut camera = Camera::perspective(Vec3::new(0.0, 5.0, 20.0), 60.0, 16.0 / 9.0, 0.5, 200.0);
        camera.look_at(Vec3::new(0.0, 5.0, 0.0), Vec3::y());
        camera
    }

    #[test]
    fn test_target_sphere_contained_and_far_behind_rejected() {
        let mut view = SceneView::default();
        let camera = camera();
        view.set_camera(&camera);

        let span = camera.far - camera.near;
        assert!(view.frustum().contains_sphere(&camera.target, span * 0.25));
        assert!(!view.frustum().contains_sphere(&Vec3::new(0.0, 5.0, 1.0e7), 1.0));
    }

    #[test]
    fn test_cull_data_packs_projection_terms() {
        let mut view = SceneView::default();
        let camera = camera();
        view.set_camera(&camera);

        let data = view.cull_data(42);
        let p = camera.projection_matrix();

        assert_eq!(data.draw_count, 42);
        assert_relative_eq!(data.p00, p[(0, 0)]);
        assert_relative_eq!(data.p11, p[(1, 1)]);
        assert_relative_eq!(data.znear, 0.5);
        assert_relative_eq!(data.zfar, 200.0);
        assert_eq!(data.view, utils::to_cols_array(&camera.view_matrix()));

        // x plane: (P00, 0, -1) normalized; y plane: (0, P11, -1) normalized
        let lx = (p[(0, 0)] * p[(0, 0)] + 1.0).sqrt();
        let ly = (p[(1, 1)] * p[(1, 1)] + 1.0).sqrt();
        assert_relative_eq!(data.frustum[0], p[(0, 0)] / lx, epsilon = EPSILON);
        assert_relative_eq!(data.frustum[1], -1.0 / lx, epsilon = EPSILON);
        assert_relative_eq!(data.frustum[2], p[(1, 1)] / ly, epsilon = EPSILON);
        assert_relative_eq!(data.frustum[3], -1.0 / ly, epsilon = EPSILON);
    }

    #[test]
    fn test_aabb_copied_only_when_enabled() {
        let bounds = Bounds::from_min_max(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let mut view = SceneView::default();
        view.set_view_bounds(bounds);

        let off = view.cull_data(0);
        assert_eq!(off.aabb_check, 0);
        assert_eq!(off.aabb_min, [0.0; 4]);

        view.set_config(ViewConfig {
            aabb_culling: true,
            distance_culling: true,
            ..ViewConfig::default()
        });
        let on = view.cull_data(0);
        assert_eq!(on.aabb_check, 1);
        assert_eq!(on.dist_cull, 1);
        assert_eq!(on.culling_enabled, 1);
        assert_eq!(on.aabb_min, [-1.0, -2.0, -3.0, 0.0]);
        assert_eq!(on.aabb_max, [1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_shadow_view_encloses_bounds() {
        let bounds = Bounds::from_min_max(Vec3::new(-10.0, 0.0, -10.0), Vec3::new(10.0, 4.0, 10.0));
        let mut view = SceneView::default();

        view.setup_shadow_view(&Vec3::new(-0.3, -1.0, 0.2), &bounds);

        for corner in bounds.corners() {
            assert!(view.frustum().contains_point(&(corner * 0.999 + bounds.center * 0.001)));
        }
        assert_eq!(*view.view_bounds(), bounds);
    }

    #[test]
    fn test_shadow_view_straight_down_light() {
        let bounds = Bounds::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let mut view = SceneView::default();

        view.setup_shadow_view(&Vec3::new(0.0, -1.0, 0.0), &bounds);

        assert!(view.view_matrix().iter().all(|v| v.is_finite()));
        assert!(view.frustum().contains_point(&Vec3::zeros()));
    }
}
