//! Scene error types

use crate::config::ConfigError;
use crate::gpu::BufferKind;
use crate::scene::UpdateState;

/// Scene and GPU assembly errors
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// A transactional call arrived in the wrong update state
    #[error("Invalid scene update state: expected {expected:?}, found {found:?}")]
    InvalidState {
        /// State the call requires
        expected: UpdateState,
        /// State the manager was in
        found: UpdateState,
    },

    /// Meshes are registered by name and the name was empty
    #[error("Mesh name must not be empty")]
    EmptyMeshName,

    /// `init` has not been called, or `shutdown` already ran
    #[error("Scene manager is not initialized")]
    NotInitialized,

    /// Pending data does not fit a GPU buffer and growth is disabled
    #[error("{buffer} buffer capacity exceeded: required {required} bytes, capacity {capacity} bytes")]
    CapacityExceeded {
        /// Buffer that overflowed
        buffer: BufferKind,
        /// Bytes needed
        required: u64,
        /// Bytes available
        capacity: u64,
    },

    /// Attaching would create a cycle or referenced a dead node
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Lookup by name or key failed where a node is required
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A mesh key or name did not resolve to a registered mesh
    #[error("Mesh not found: {0}")]
    MeshNotFound(String),

    /// Device-side failure
    #[error("Device error: {0}")]
    Device(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
