//! # Scene Configuration
//!
//! Capacity and behaviour settings for the scene manager and scene views.
//!
//! ## Configuration Categories
//!
//! - **Scene Config**: Initial GPU buffer capacities, growth policy, CPU data retention
//! - **View Config**: Culling switches copied into the per-frame cull data

use serde::{Serialize, Deserialize};

use super::{Config, ConfigError};

/// Default number of vertices the vertex buffer holds before growing
pub const DEFAULT_MAX_VERTICES: u32 = 1 << 20;
/// Default number of indices the index buffer holds before growing
pub const DEFAULT_MAX_INDICES: u32 = 1 << 22;
/// Default number of instance records and indirect draws
pub const DEFAULT_MAX_OBJECTS: u32 = 1 << 16;
/// Default number of material table entries
pub const DEFAULT_MAX_MATERIALS: u32 = 1024;

/// # Buffer Growth Policy
///
/// Controls what happens when a pending upload no longer fits a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferGrowthPolicy {
    /// Reallocate and recopy when capacity is exceeded; otherwise fail the upload
    pub enabled: bool,
    /// Geometric growth factor applied to the old capacity
    pub factor: f32,
}

impl Default for BufferGrowthPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            factor: 2.0,
        }
    }
}

impl BufferGrowthPolicy {
    /// A policy that never reallocates
    pub const fn fixed() -> Self {
        Self {
            enabled: false,
            factor: 1.0,
        }
    }

    /// Capacity to allocate when `required` bytes no longer fit `current`
    pub fn grown_capacity(&self, current: u64, required: u64) -> u64 {
        let scaled = (current.max(1) as f64 * f64::from(self.factor)).ceil() as u64;
        scaled.max(required)
    }
}

/// # Scene Configuration
///
/// Initial capacities of the shared GPU buffers and behaviour of the
/// scene manager. Counts are in elements, not bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Vertex buffer capacity
    pub max_vertices: u32,
    /// Index buffer capacity
    pub max_indices: u32,
    /// Instance and indirect draw buffer capacity
    pub max_objects: u32,
    /// Material table capacity
    pub max_materials: u32,
    /// Drop CPU-side mesh arrays once they have been uploaded
    pub release_cpu_mesh_data: bool,
    /// Name of the scene root node
    pub root_name: String,
    /// What to do when a buffer overflows
    pub growth: BufferGrowthPolicy,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_vertices: DEFAULT_MAX_VERTICES,
            max_indices: DEFAULT_MAX_INDICES,
            max_objects: DEFAULT_MAX_OBJECTS,
            max_materials: DEFAULT_MAX_MATERIALS,
            release_cpu_mesh_data: false,
            root_name: "root".to_string(),
            growth: BufferGrowthPolicy::default(),
        }
    }
}

impl Config for SceneConfig {}

impl SceneConfig {
    /// Set vertex and index capacities
    pub fn with_geometry_capacity(mut self, max_vertices: u32, max_indices: u32) -> Self {
        self.max_vertices = max_vertices;
        self.max_indices = max_indices;
        self
    }

    /// Set instance/draw capacity
    pub fn with_max_objects(mut self, max_objects: u32) -> Self {
        self.max_objects = max_objects;
        self
    }

    /// Set material table capacity
    pub fn with_max_materials(mut self, max_materials: u32) -> Self {
        self.max_materials = max_materials;
        self
    }

    /// Set the buffer growth policy
    pub fn with_growth(mut self, growth: BufferGrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Release CPU mesh data after upload
    pub fn with_release_cpu_mesh_data(mut self, release: bool) -> Self {
        self.release_cpu_mesh_data = release;
        self
    }

    /// Validate capacities and growth settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacities = [
            ("max_vertices", self.max_vertices),
            ("max_indices", self.max_indices),
            ("max_objects", self.max_objects),
            ("max_materials", self.max_materials),
        ];
        if let Some((name, _)) = capacities.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
        }
        if self.growth.enabled && !(self.growth.factor > 1.0 && self.growth.factor.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "growth factor must be finite and greater than 1.0, got {}",
                self.growth.factor
            )));
        }
        if self.root_name.is_empty() {
            return Err(ConfigError::Invalid("root_name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// # View Configuration
///
/// Culling switches packed into `DrawCullData` for the GPU culling stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Frustum culling on/off
    pub frustum_culling: bool,
    /// Distance culling on/off
    pub distance_culling: bool,
    /// Test instances against the view's world-space AABB
    pub aabb_culling: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            frustum_culling: true,
            distance_culling: false,
            aabb_culling: false,
        }
    }
}

impl Config for ViewConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = SceneConfig::default().with_max_objects(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_objects"));
    }

    #[test]
    fn test_growth_factor_must_exceed_one() {
        let config = SceneConfig::default().with_growth(BufferGrowthPolicy {
            enabled: true,
            factor: 1.0,
        });
        assert!(config.validate().is_err());

        let fixed = SceneConfig::default().with_growth(BufferGrowthPolicy::fixed());
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn test_grown_capacity_is_geometric_and_sufficient() {
        let policy = BufferGrowthPolicy::default();
        assert_eq!(policy.grown_capacity(100, 150), 200);
        assert_eq!(policy.grown_capacity(100, 500), 500);
        assert_eq!(policy.grown_capacity(0, 8), 8);
    }

    #[test]
    fn test_toml_partial_config_uses_defaults() {
        let config = SceneConfig::from_toml_str(
            "max_vertices = 64\nmax_indices = 128\n\n[growth]\nenabled = false\n",
        )
        .unwrap();

        assert_eq!(config.max_vertices, 64);
        assert_eq!(config.max_indices, 128);
        assert_eq!(config.max_objects, DEFAULT_MAX_OBJECTS);
        assert!(!config.growth.enabled);
        assert_eq!(config.root_name, "root");
    }

    #[test]
    fn test_ron_view_config() {
        let config = ViewConfig::from_ron_str("(aabb_culling: true)").unwrap();
        assert!(config.frustum_culling);
        assert!(config.aabb_culling);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("gpu_scene_config_{}.toml", std::process::id()));
        let config = SceneConfig::default()
            .with_geometry_capacity(10, 20)
            .with_release_cpu_mesh_data(true);

        config.save_to_file(&path).unwrap();
        let loaded = SceneConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = SceneConfig::load_from_file("scene.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
