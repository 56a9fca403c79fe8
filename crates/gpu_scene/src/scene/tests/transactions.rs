use approx::assert_relative_eq;

use super::{manager, mesh_with_counts, read_records};
use crate::assets::{Material, MaterialId, MeshAsset};
use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::foundation::math::{Transform, Vec3};
use crate::gpu::{BufferKind, DrawCommand, ObjectData, Vertex};
use crate::scene::UpdateState;

const EPSILON: f32 = 1e-5;

#[test]
fn test_batched_meshes_get_running_offsets_and_one_upload() {
    let mut scene = manager(SceneConfig::default());

    scene.begin_scene_update().unwrap();
    let a = scene.add_mesh(mesh_with_counts("mesh_a", 10, 12)).unwrap();
    let b = scene.add_mesh(mesh_with_counts("mesh_b", 5, 6)).unwrap();
    scene.end_scene_update().unwrap();

    let mesh_a = scene.mesh(a).unwrap();
    let mesh_b = scene.mesh(b).unwrap();
    assert_eq!(mesh_a.vertex_offset, Some(0));
    assert_eq!(mesh_a.index_offset, Some(0));
    assert_eq!(mesh_b.vertex_offset, Some(10));
    assert_eq!(mesh_b.index_offset, Some(12));

    let pool = scene.pool().unwrap();
    let vertex_uploads: Vec<_> = scene.device().uploads_to(pool.handle(BufferKind::Vertex)).collect();
    let index_uploads: Vec<_> = scene.device().uploads_to(pool.handle(BufferKind::Index)).collect();
    assert_eq!(vertex_uploads.len(), 1);
    assert_eq!(vertex_uploads[0].size, 15 * size_of::<Vertex>() as u64);
    assert_eq!(vertex_uploads[0].dest_offset, 0);
    assert_eq!(index_uploads.len(), 1);
    assert_eq!(index_uploads[0].size, 18 * 4);

    let committed = scene.committed();
    assert_eq!(committed.vertices, 15);
    assert_eq!(committed.indices, 18);
    assert!(scene.pending().is_empty());
}

#[test]
fn test_second_transaction_appends_after_committed_data() {
    let mut scene = manager(SceneConfig::default());

    scene.begin_scene_update().unwrap();
    scene.add_mesh(mesh_with_counts("first", 10, 12)).unwrap();
    scene.end_scene_update().unwrap();

    scene.begin_scene_update().unwrap();
    let second = scene.add_mesh(mesh_with_counts("second", 4, 6)).unwrap();
    scene.end_scene_update().unwrap();

    assert_eq!(scene.mesh(second).unwrap().vertex_offset, Some(10));
    let vertices: Vec<Vertex> = read_records(&scene, BufferKind::Vertex, 14);
    assert_relative_eq!(vertices[9].position[0], 9.0);
    assert_relative_eq!(vertices[13].position[0], 3.0);

    let vertex_handle = scene.pool().unwrap().handle(BufferKind::Vertex);
    let last = scene.device().uploads_to(vertex_handle).last().unwrap();
    assert_eq!(last.dest_offset, 10 * size_of::<Vertex>() as u64);
}

#[test]
fn test_end_without_begin_changes_nothing() {
    let mut scene = manager(SceneConfig::default());
    let uploads_before = scene.device().uploads().len();
    let committed_before = scene.committed();

    let err = scene.end_scene_update().unwrap_err();

    assert!(matches!(
        err,
        SceneError::InvalidState {
            expected: UpdateState::Building,
            found: UpdateState::Idle
        }
    ));
    assert_eq!(scene.device().uploads().len(), uploads_before);
    assert_eq!(scene.committed(), committed_before);
    assert!(scene.pending().is_empty());
    assert_eq!(scene.state(), UpdateState::Idle);

    // a completed transaction followed by a stray end is also a no-op
    scene.begin_scene_update().unwrap();
    scene.add_mesh(mesh_with_counts("mesh", 3, 3)).unwrap();
    scene.end_scene_update().unwrap();
    let uploads_after = scene.device().uploads().len();
    assert!(scene.end_scene_update().is_err());
    assert_eq!(scene.device().uploads().len(), uploads_after);
}

#[test]
fn test_nested_begin_keeps_open_batch() {
    let mut scene = manager(SceneConfig::default());

    scene.begin_scene_update().unwrap();
    scene.add_mesh(mesh_with_counts("kept", 6, 6)).unwrap();

    assert!(scene.begin_scene_update().is_err());
    assert_eq!(scene.state(), UpdateState::Building);
    assert_eq!(scene.pending().vertices.len(), 6);

    scene.end_scene_update().unwrap();
    assert_eq!(scene.committed().vertices, 6);
}

#[test]
fn test_add_mesh_protocol_violations() {
    let mut scene = manager(SceneConfig::default());

    let outside = scene.add_mesh(mesh_with_counts("outside", 3, 3));
    assert!(matches!(outside, Err(SceneError::InvalidState { .. })));
    assert!(scene.find_mesh("outside").is_none());

    scene.begin_scene_update().unwrap();
    let unnamed = scene.add_mesh(mesh_with_counts("", 3, 3));
    assert!(matches!(unnamed, Err(SceneError::EmptyMeshName)));
    assert!(scene.pending().vertices.is_empty());
    scene.end_scene_update().unwrap();
}

#[test]
fn test_uninitialized_manager_rejects_updates() {
    let mut scene = crate::scene::SceneManager::new(crate::gpu::HeadlessDevice::new());

    assert!(matches!(scene.begin_scene_update(), Err(SceneError::NotInitialized)));
    assert!(scene.create_node("orphan").is_none());
    assert!(scene.indirect_draws().is_none());
    assert!(scene.update().is_ok());
}

#[test]
fn test_duplicate_mesh_name_returns_existing_key() {
    let mut scene = manager(SceneConfig::default());

    scene.begin_scene_update().unwrap();
    let first = scene.add_mesh(mesh_with_counts("shared", 8, 12)).unwrap();
    let again = scene.add_mesh(mesh_with_counts("shared", 20, 30)).unwrap();
    scene.end_scene_update().unwrap();

    assert_eq!(first, again);
    assert_eq!(scene.committed().vertices, 8);
}

#[test]
fn test_mesh_instance_emits_object_and_draw() {
    let mut scene = manager(SceneConfig::default());

    scene.begin_scene_update().unwrap();
    scene.add_mesh(mesh_with_counts("padding", 7, 9)).unwrap();
    let cube = scene.add_mesh(MeshAsset::cuboid("cube", Vec3::new(1.0, 1.0, 1.0))).unwrap();
    let node = scene.create_node("cube_node").unwrap();
    scene.node_mut(node).unwrap().transform = Transform::from_position(Vec3::new(3.0, 0.0, 0.0));
    scene.add_mesh_instance(node, cube).unwrap();
    scene.end_scene_update().unwrap();

    let (_, draw_count) = scene.indirect_draws().unwrap();
    assert_eq!(draw_count, 1);

    let draws: Vec<DrawCommand> = read_records(&scene, BufferKind::Indirect, 1);
    assert_eq!(draws[0].index_count, 36);
    assert_eq!(draws[0].instance_count, 1);
    assert_eq!(draws[0].first_index, 9);
    assert_eq!(draws[0].vertex_offset, 7);
    assert_eq!(draws[0].first_instance, 0);
    assert_eq!(draws[0].object_id, 0);

    let objects: Vec<ObjectData> = read_records(&scene, BufferKind::Instance, 1);
    assert_relative_eq!(objects[0].world[3][0], 3.0, epsilon = EPSILON);
    assert_relative_eq!(objects[0].sphere[0], 3.0, epsilon = EPSILON);
    assert_relative_eq!(objects[0].sphere[3], 3.0_f32.sqrt(), epsilon = EPSILON);
    assert_eq!(objects[0].material_index, 0);
}

#[test]
fn test_material_indices_stay_below_material_count() {
    let mut scene = manager(SceneConfig::default());

    scene.begin_scene_update().unwrap();
    let red = scene.add_material(Material::standard([1.0, 0.0, 0.0, 1.0], 0.0, 0.5), Some("red")).unwrap();
    let blue = scene.add_material(Material::standard([0.0, 0.0, 1.0, 1.0], 0.0, 0.5).with_name("blue"), None).unwrap();
    let red_again = scene.add_material(Material::default(), Some("red")).unwrap();
    assert_eq!(red, red_again);

    let red_cube = scene
        .add_mesh(MeshAsset::cuboid("red_cube", Vec3::new(0.5, 0.5, 0.5)).with_material(red))
        .unwrap();
    let blue_cube = scene
        .add_mesh(MeshAsset::cuboid("blue_cube", Vec3::new(0.5, 0.5, 0.5)).with_material(blue))
        .unwrap();
    let stray = scene
        .add_mesh(MeshAsset::cuboid("stray", Vec3::new(0.5, 0.5, 0.5)).with_material(MaterialId(99)))
        .unwrap();
    for (name, mesh) in [("a", red_cube), ("b", blue_cube), ("c", stray)] {
        let node = scene.create_node(name).unwrap();
        scene.add_mesh_instance(node, mesh).unwrap();
    }
    scene.end_scene_update().unwrap();

    assert_eq!(scene.material_count(), 3);
    assert_eq!(scene.material_index(red), 1);
    assert_eq!(scene.material_index(blue), 2);
    assert_eq!(scene.material_index(MaterialId(99)), 0);
    assert_eq!(scene.material_id("blue"), Some(blue));
    assert_eq!(scene.committed().materials, scene.material_count());

    let objects: Vec<ObjectData> = read_records(&scene, BufferKind::Instance, 3);
    let indices: Vec<u32> = objects.iter().map(|o| o.material_index).collect();
    assert_eq!(indices, vec![1, 2, 0]);
    assert!(indices.iter().all(|&i| i < scene.material_count()));
}

#[test]
fn test_update_is_dirty_gated_and_tracks_scene_bounds() {
    let mut scene = manager(SceneConfig::default());

    scene.begin_scene_update().unwrap();
    let cube = scene.add_mesh(MeshAsset::cuboid("cube", Vec3::new(1.0, 1.0, 1.0))).unwrap();
    let node = scene.create_node("cube").unwrap();
    scene.add_mesh_instance(node, cube).unwrap();
    scene.end_scene_update().unwrap();
    scene.update().unwrap();

    assert_relative_eq!(scene.scene_bounds().max, Vec3::new(1.0, 1.0, 1.0), epsilon = EPSILON);

    scene.node_mut(node).unwrap().transform = Transform::from_position(Vec3::new(10.0, 0.0, 0.0));
    scene.update().unwrap();
    assert_relative_eq!(scene.scene_bounds().max, Vec3::new(11.0, 1.0, 1.0), epsilon = EPSILON);

    // clean scene: nothing to refresh or flush
    let uploads = scene.device().uploads().len();
    scene.update().unwrap();
    assert_eq!(scene.device().uploads().len(), uploads);
}

#[test]
fn test_node_lifecycle() {
    let mut scene = manager(SceneConfig::default());
    let root = scene.root().unwrap();
    assert_eq!(scene.node(root).unwrap().id(), 0);

    let a = scene.create_node("a").unwrap();
    let b = scene.create_node("b").unwrap();
    assert!(scene.create_node("a").is_none());
    assert_eq!(scene.node(a).unwrap().id(), 1);
    assert_eq!(scene.node(b).unwrap().id(), 2);
    assert_eq!(scene.node(a).unwrap().parent(), Some(root));

    scene.add_child(a, b).unwrap();
    assert_eq!(scene.find_node("b"), Some(b));

    assert!(scene.remove_node("a"));
    assert!(scene.find_node("a").is_none());
    assert!(scene.find_node("b").is_none());
    assert!(!scene.remove_node("a"));
    assert!(!scene.remove_node("root"));
    assert_eq!(scene.tree().children(root), &[] as &[crate::scene::NodeKey]);
}

#[test]
fn test_collect_render_objects_skips_hidden_subtrees() {
    let mut scene = manager(SceneConfig::default());

    scene.begin_scene_update().unwrap();
    let cube = scene.add_mesh(MeshAsset::cuboid("cube", Vec3::new(1.0, 1.0, 1.0))).unwrap();
    let shown = scene.create_node("shown").unwrap();
    let hidden = scene.create_node("hidden").unwrap();
    let hidden_child = scene.create_node("hidden_child").unwrap();
    scene.add_child(hidden, hidden_child).unwrap();
    for node in [shown, hidden, hidden_child] {
        scene.add_mesh_instance(node, cube).unwrap();
    }
    scene.end_scene_update().unwrap();

    assert_eq!(scene.collect_render_objects().len(), 3);

    scene.node_mut(hidden).unwrap().visible = false;
    let objects = scene.collect_render_objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].node_id, scene.node(shown).unwrap().id());
    assert_eq!(objects[0].mesh, cube);
    assert!(objects[0].is_static);
}

#[test]
fn test_meshlets_need_cpu_data() {
    let config = SceneConfig::default().with_release_cpu_mesh_data(true);
    let mut scene = manager(config);

    scene.begin_scene_update().unwrap();
    let grid = scene.add_mesh(MeshAsset::grid("grid", 10.0, 16)).unwrap();
    let meshlets = scene.build_meshlets(grid).unwrap();
    assert!(meshlets.len() > 1);
    let triangles: usize = meshlets.iter().map(|m| m.triangle_count()).sum();
    assert_eq!(triangles, 16 * 16 * 2);
    scene.end_scene_update().unwrap();

    let mesh = scene.mesh(grid).unwrap();
    assert!(!mesh.has_cpu_data());
    assert_eq!(mesh.vertex_count(), 17 * 17);
    assert!(scene.build_meshlets(grid).is_none());
}

#[test]
fn test_shutdown_releases_buffers() {
    let mut scene = manager(SceneConfig::default());
    assert_eq!(scene.device().live_buffer_count(), 6);

    scene.shutdown();

    assert!(!scene.is_initialized());
    assert_eq!(scene.device().live_buffer_count(), 0);
    assert!(scene.root().is_none());
    assert_eq!(scene.material_count(), 0);
}
