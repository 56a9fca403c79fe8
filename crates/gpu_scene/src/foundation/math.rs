//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene graph and the GPU
//! record layouts. All matrices are column-major and follow the OpenGL clip
//! convention produced by nalgebra's projection constructors.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform from all three components
    pub const fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// Convert to a transformation matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine matrix into position, rotation and scale.
    ///
    /// Shear is discarded. A negative determinant is folded into the X scale,
    /// and a collapsed axis keeps a zero scale with an identity basis vector so
    /// the rotation stays finite.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let mut x_axis = Vec3::new(matrix.m11, matrix.m21, matrix.m31);
        let mut y_axis = Vec3::new(matrix.m12, matrix.m22, matrix.m32);
        let mut z_axis = Vec3::new(matrix.m13, matrix.m23, matrix.m33);

        let mut scale = Vec3::new(x_axis.norm(), y_axis.norm(), z_axis.norm());
        if x_axis.cross(&y_axis).dot(&z_axis) < 0.0 {
            scale.x = -scale.x;
        }

        for (axis, s, fallback) in [
            (&mut x_axis, scale.x, Vec3::x()),
            (&mut y_axis, scale.y, Vec3::y()),
            (&mut z_axis, scale.z, Vec3::z()),
        ] {
            if s.abs() > f32::EPSILON {
                *axis /= s;
            } else {
                *axis = fallback;
            }
        }

        let rotation_matrix = Mat3::from_columns(&[x_axis, y_axis, z_axis]);
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Vec3, Vec4};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Transform a point by a full 4x4 matrix, dividing by the homogeneous w.
    ///
    /// A zero w leaves the point undivided.
    pub fn transform_point_homogeneous(matrix: &Mat4, point: &Vec3) -> Vec3 {
        let p = matrix * Vec4::new(point.x, point.y, point.z, 1.0);
        if p.w.abs() > f32::EPSILON {
            p.xyz() / p.w
        } else {
            p.xyz()
        }
    }

    /// Row `index` of a matrix as a column vector
    pub fn row(matrix: &Mat4, index: usize) -> Vec4 {
        matrix.row(index).transpose()
    }

    /// Column-major array form used by GPU records
    pub fn to_cols_array(matrix: &Mat4) -> [[f32; 4]; 4] {
        (*matrix).into()
    }
}

/// Extension trait for Mat4 with camera construction helpers
pub trait Mat4Ext {
    /// Create a right-handed perspective projection matrix
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed orthographic projection matrix
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(left, right, bottom, top, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_matrix_round_trip() {
        let original = Transform::from_parts(
            Vec3::new(1.0, -2.0, 3.0),
            Quat::from_euler_angles(0.3, 0.7, -0.2),
            Vec3::new(2.0, 0.5, 1.5),
        );

        let decomposed = Transform::from_matrix(&original.to_matrix());

        assert_relative_eq!(decomposed.position, original.position, epsilon = EPSILON);
        assert_relative_eq!(decomposed.scale, original.scale, epsilon = EPSILON);
        assert_relative_eq!(decomposed.to_matrix(), original.to_matrix(), epsilon = EPSILON);
    }

    #[test]
    fn test_from_matrix_with_zero_scale_stays_finite() {
        let matrix = Mat4::new_nonuniform_scaling(&Vec3::new(0.0, 1.0, 1.0));
        let decomposed = Transform::from_matrix(&matrix);

        assert!(decomposed.rotation.coords.iter().all(|c| c.is_finite()));
        assert_relative_eq!(decomposed.scale.x, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_homogeneous_point_divides_by_w() {
        let mut matrix = Mat4::identity();
        matrix[(3, 3)] = 2.0;

        let p = utils::transform_point_homogeneous(&matrix, &Vec3::new(2.0, 4.0, 6.0));

        assert_relative_eq!(p, Vec3::new(1.0, 2.0, 3.0), epsilon = EPSILON);
    }
}
