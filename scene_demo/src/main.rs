//! Headless scene demo
//!
//! Builds a small procedural scene through the scene manager on the headless
//! device, runs a few frames and logs the resulting buffer usage, cull data
//! and meshlet statistics.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use gpu_scene::assets::{Material, MeshAsset};
use gpu_scene::config::{Config, ConfigError, SceneConfig, ViewConfig};
use gpu_scene::foundation::logging;
use gpu_scene::foundation::math::{Transform, Vec3};
use gpu_scene::gpu::{BufferKind, HeadlessDevice};
use gpu_scene::scene::{Camera, SceneManager, SceneView};
use gpu_scene::SceneError;

const GRID_SIZE: i32 = 4;
const FRAMES: u32 = 3;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Node '{0}' could not be created")]
    NodeCreation(String),
}

fn main() {
    logging::init();

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene config from {path}");
            SceneConfig::load_from_file(path)?
        }
        None => SceneConfig::default()
            .with_geometry_capacity(256, 1024)
            .with_max_objects(8),
    };

    let mut scene = SceneManager::new(HeadlessDevice::new());
    scene.init(config)?;

    build_scene(&mut scene)?;

    let mut camera = Camera::perspective(Vec3::new(0.0, 6.0, 14.0), 60.0, 16.0 / 9.0, 0.1, 100.0);
    camera.look_at(Vec3::zeros(), Vec3::y());
    let mut view = SceneView::new(ViewConfig {
        aabb_culling: true,
        ..ViewConfig::default()
    });

    for frame in 0..FRAMES {
        if let Some(spinner) = scene.find_node("spinner") {
            if let Some(node) = scene.node_mut(spinner) {
                node.transform.position.y = 1.0 + frame as f32 * 0.5;
            }
        }
        scene.update()?;

        view.set_camera(&camera);
        view.set_view_bounds(*scene.scene_bounds());
        let draw_count = scene.indirect_draws().map_or(0, |(_, count)| count);
        let cull = view.cull_data(draw_count);
        log::info!(
            "Frame {frame}: {} draws, p00 {:.3}, p11 {:.3}, frustum {:?}",
            cull.draw_count,
            cull.p00,
            cull.p11,
            cull.frustum
        );
    }

    report(&scene);

    view.setup_shadow_view(&Vec3::new(-0.4, -1.0, -0.3), scene.scene_bounds());
    log::info!("Shadow view near/far: {:.2}/{:.2}", view.cull_data(0).znear, view.cull_data(0).zfar);

    if let Some(grid) = scene.find_mesh("ground") {
        if let Some(meshlets) = scene.build_meshlets(grid) {
            let triangles: usize = meshlets.iter().map(|m| m.triangle_count()).sum();
            let max_vertices = meshlets.iter().map(|m| m.vertex_count()).max().unwrap_or(0);
            log::info!(
                "Ground meshlets: {} clusters, {triangles} triangles, at most {max_vertices} vertices per cluster",
                meshlets.len()
            );
        }
    }

    scene.shutdown();
    Ok(())
}

fn build_scene(scene: &mut SceneManager<HeadlessDevice>) -> Result<(), DemoError> {
    scene.begin_scene_update()?;

    let stone = scene.add_material(Material::standard([0.55, 0.55, 0.5, 1.0], 0.0, 0.9), Some("stone"))?;
    let brass = scene.add_material(Material::standard([0.8, 0.6, 0.2, 1.0], 1.0, 0.3), Some("brass"))?;

    let ground = scene.add_mesh(MeshAsset::grid("ground", 20.0, 32).with_material(stone))?;
    let crate_mesh = scene.add_mesh(MeshAsset::cuboid("crate", Vec3::new(0.5, 0.5, 0.5)).with_material(brass))?;

    let floor = scene
        .create_node("floor")
        .ok_or_else(|| DemoError::NodeCreation("floor".to_string()))?;
    scene.add_mesh_instance(floor, ground)?;

    for x in 0..GRID_SIZE {
        for z in 0..GRID_SIZE {
            let name = format!("crate_{x}_{z}");
            let node = scene
                .create_node(&name)
                .ok_or_else(|| DemoError::NodeCreation(name.clone()))?;
            if let Some(n) = scene.node_mut(node) {
                n.transform = Transform::from_position(Vec3::new(
                    (x - GRID_SIZE / 2) as f32 * 2.0,
                    0.5,
                    (z - GRID_SIZE / 2) as f32 * 2.0,
                ));
            }
            scene.add_mesh_instance(node, crate_mesh)?;
        }
    }

    let spinner = scene
        .create_node("spinner")
        .ok_or_else(|| DemoError::NodeCreation("spinner".to_string()))?;
    scene.add_mesh_instance(spinner, crate_mesh)?;

    scene.end_scene_update()?;
    Ok(())
}

fn report(scene: &SceneManager<HeadlessDevice>) {
    let committed = scene.committed();
    log::info!(
        "Committed: {} vertices, {} indices, {} objects, {} draws, {} materials",
        committed.vertices,
        committed.indices,
        committed.objects,
        committed.draws,
        committed.materials
    );

    if let Some(pool) = scene.pool() {
        for kind in BufferKind::DATA {
            let buffer = pool.buffer(kind);
            log::info!(
                "{kind} buffer: {} bytes, generation {}",
                buffer.capacity,
                buffer.generation
            );
        }
    }
    log::info!("Device uploads: {}", scene.device().uploads().len());

    let bounds = scene.scene_bounds();
    log::info!("Scene bounds: min {:?}, max {:?}", bounds.min, bounds.max);
}
