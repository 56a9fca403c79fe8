//! Material definitions
//!
//! Materials are registered with the scene manager, which assigns each one a
//! [`MaterialId`] and a dense index into the GPU material table.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::gpu::GpuMaterial;

/// Material identifier assigned by the scene manager
///
/// `MaterialId(0)` is "unassigned"; registered ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// The unassigned id
    pub const UNASSIGNED: Self = Self(0);

    /// True once the scene manager has registered the material
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

/// How alpha is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AlphaMode {
    /// Alpha ignored
    #[default]
    Opaque,
    /// Fragments below the cutoff are discarded
    Mask(f32),
    /// Alpha blended; drawn after opaque geometry
    Blend,
}

bitflags! {
    /// Flag bits stored in [`GpuMaterial::flags`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        /// Alpha test against the cutoff
        const ALPHA_MASK = 1 << 0;
        /// Alpha blended
        const ALPHA_BLEND = 1 << 1;
        /// Back faces are not culled
        const DOUBLE_SIDED = 1 << 2;
    }
}

/// Metallic-roughness surface material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Optional display name; registration by name deduplicates
    pub name: Option<String>,
    /// Id assigned on registration
    pub id: MaterialId,
    /// Base color factor (linear RGBA)
    pub base_color: [f32; 4],
    /// Metallic factor
    pub metallic: f32,
    /// Roughness factor
    pub roughness: f32,
    /// Emissive color
    pub emissive: [f32; 3],
    /// Alpha handling
    pub alpha_mode: AlphaMode,
    /// Disable back-face culling
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            id: MaterialId::UNASSIGNED,
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0; 3],
            alpha_mode: AlphaMode::Opaque,
            double_sided: false,
        }
    }
}

impl Material {
    /// Opaque material with a base color
    pub fn standard(base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            base_color,
            metallic,
            roughness,
            ..Default::default()
        }
    }

    /// Set the name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the alpha mode
    #[must_use]
    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    /// Flag bits for the GPU record
    pub fn flags(&self) -> MaterialFlags {
        let mut flags = match self.alpha_mode {
            AlphaMode::Opaque => MaterialFlags::empty(),
            AlphaMode::Mask(_) => MaterialFlags::ALPHA_MASK,
            AlphaMode::Blend => MaterialFlags::ALPHA_BLEND,
        };
        flags.set(MaterialFlags::DOUBLE_SIDED, self.double_sided);
        flags
    }

    /// GPU material table entry
    pub fn to_gpu(&self) -> GpuMaterial {
        let cutoff = match self.alpha_mode {
            AlphaMode::Mask(cutoff) => cutoff,
            _ => 0.0,
        };
        let [er, eg, eb] = self.emissive;
        GpuMaterial {
            base_color: self.base_color,
            emissive_cutoff: [er, eg, eb, cutoff],
            metallic: self.metallic,
            roughness: self.roughness,
            flags: self.flags().bits(),
            _pad: 0,
        }
    }
}
