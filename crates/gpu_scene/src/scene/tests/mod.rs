//! Scenario tests for the scene manager

mod transactions;

use crate::assets::MeshAsset;
use crate::config::SceneConfig;
use crate::gpu::{BufferKind, HeadlessDevice, Vertex};
use crate::scene::SceneManager;

/// Initialized manager over a fresh headless device
pub(super) fn manager(config: SceneConfig) -> SceneManager<HeadlessDevice> {
    crate::foundation::logging::try_init_for_tests();
    let mut scene = SceneManager::new(HeadlessDevice::new());
    scene.init(config).expect("init");
    scene
}

/// Small capacities so growth is easy to trigger
pub(super) fn small_config() -> SceneConfig {
    SceneConfig::default()
        .with_geometry_capacity(16, 64)
        .with_max_objects(8)
        .with_max_materials(4)
}

/// Mesh with exact vertex and index counts; vertex `i` sits at x = i
pub(super) fn mesh_with_counts(name: &str, vertex_count: u32, index_count: u32) -> MeshAsset {
    let vertices = (0..vertex_count)
        .map(|i| Vertex::new([i as f32, 0.0, 0.0], [0.0, 1.0, 0.0]))
        .collect();
    let indices = (0..index_count).map(|i| i % vertex_count.max(1)).collect();
    MeshAsset::new(name, vertices, indices)
}

/// Decode `count` records of `kind` from the start of a headless buffer
pub(super) fn read_records<T: bytemuck::Pod>(
    scene: &SceneManager<HeadlessDevice>,
    kind: BufferKind,
    count: usize,
) -> Vec<T> {
    let handle = scene.pool().expect("pool").handle(kind);
    let bytes = scene.device().buffer_data(handle).expect("buffer");
    let stride = size_of::<T>();
    (0..count)
        .map(|i| bytemuck::pod_read_unaligned(&bytes[i * stride..(i + 1) * stride]))
        .collect()
}
