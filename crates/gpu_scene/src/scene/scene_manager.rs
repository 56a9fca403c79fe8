//! Scene Manager - owner of the node tree and the shared GPU scene buffers
//!
//! The Scene Manager:
//! 1. Owns the node arena, meshes, materials and the GPU resource pool
//! 2. Collects geometry, instance records and draw commands in a pending batch
//!    between `begin_scene_update` and `end_scene_update`
//! 3. Uploads the batch through the staging buffer when the transaction ends
//! 4. Refreshes world transforms and aggregate bounds once per frame in `update`
//!
//! Transactions follow `Idle -> Building -> Idle`. Calls made in the wrong
//! state are logged and rejected without touching any state.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::assets::{LoadedScene, Material, MaterialId, MeshAsset, MeshKey};
use crate::config::SceneConfig;
use crate::error::{SceneError, SceneResult};
use crate::foundation::math::{Mat4, Transform};
use crate::gpu::{BufferHandle, BufferKind, DrawCommand, GpuDevice, GpuResourcePool, ObjectData};
use crate::meshlet::{Meshlet, MeshletBuilder};
use super::bounds::Bounds;
use super::hierarchy::TransformStore;
use super::node::{DrawContext, NodeKey, NodeKind, RenderObject, SceneNode};
use super::pending::{BufferCounts, PendingBatch};
use super::tree::SceneTree;

/// Transaction state of the scene manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateState {
    /// No transaction open
    #[default]
    Idle,
    /// Between `begin_scene_update` and `end_scene_update`
    Building,
}

/// Registered materials in GPU table order
///
/// Index 0 is the default material uploaded at init.
#[derive(Debug, Default)]
struct MaterialTable {
    entries: Vec<Material>,
    index_of: HashMap<MaterialId, u32>,
    by_name: HashMap<String, MaterialId>,
    next_id: u32,
}

impl MaterialTable {
    fn with_default() -> Self {
        Self {
            entries: vec![Material::default().with_name("default")],
            index_of: HashMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
        }
    }

    fn index(&self, id: MaterialId) -> u32 {
        self.index_of.get(&id).copied().unwrap_or(0)
    }

    fn len(&self) -> u32 {
        self.entries.len() as u32
    }
}

/// Scene Manager - transactional scene assembly over a [`GpuDevice`]
pub struct SceneManager<D: GpuDevice> {
    /// Device the pool buffers live on
    device: D,

    /// Configuration passed to `init`
    config: SceneConfig,

    /// Shared buffers; `None` until `init`
    pool: Option<GpuResourcePool>,

    /// Node arena
    tree: SceneTree,

    /// Root of the scene; `None` until `init`
    root: Option<NodeKey>,

    /// Registered meshes and their name index
    meshes: SlotMap<MeshKey, MeshAsset>,
    mesh_names: HashMap<String, MeshKey>,

    /// Material table
    materials: MaterialTable,

    /// Data waiting for upload
    pending: PendingBatch,

    /// Meshes registered since the last successful upload
    batch_meshes: Vec<MeshKey>,

    /// Element counts already uploaded
    committed: BufferCounts,

    state: UpdateState,

    /// Set whenever the tree changed since the last `update`
    dirty: bool,

    /// Aggregate world bounds of everything in the scene
    scene_bounds: Bounds,

    /// Next node id; the root takes 0
    next_node_id: u32,
}

impl<D: GpuDevice> SceneManager<D> {
    /// Create an uninitialized manager over `device`
    pub fn new(device: D) -> Self {
        Self {
            device,
            config: SceneConfig::default(),
            pool: None,
            tree: SceneTree::new(),
            root: None,
            meshes: SlotMap::with_key(),
            mesh_names: HashMap::new(),
            materials: MaterialTable::default(),
            pending: PendingBatch::new(),
            batch_meshes: Vec::new(),
            committed: BufferCounts::default(),
            state: UpdateState::Idle,
            dirty: false,
            scene_bounds: Bounds::default(),
            next_node_id: 0,
        }
    }

    /// Create the GPU buffers and the root node, and upload the default
    /// material at index 0.
    ///
    /// Calling `init` again shuts the previous scene down first.
    pub fn init(&mut self, config: SceneConfig) -> SceneResult<()> {
        config.validate()?;
        if self.is_initialized() {
            log::warn!("SceneManager::init called twice; shutting down the previous scene");
            self.shutdown();
        }

        let mut pool = GpuResourcePool::new(&mut self.device, &config)?;
        let materials = MaterialTable::with_default();
        let defaults: Vec<_> = materials.entries.iter().map(Material::to_gpu).collect();
        if let Err(err) = pool.upload(&mut self.device, BufferKind::Material, 0, &defaults) {
            pool.destroy(&mut self.device);
            return Err(err);
        }

        let Some(root) = self.tree.create_node(&config.root_name, self.next_node_id) else {
            pool.destroy(&mut self.device);
            return Err(SceneError::InvalidHierarchy(format!(
                "root name '{}' already in use",
                config.root_name
            )));
        };
        self.next_node_id += 1;

        self.committed = BufferCounts {
            materials: materials.len(),
            ..BufferCounts::default()
        };
        self.materials = materials;
        self.pool = Some(pool);
        self.root = Some(root);
        self.config = config;
        self.dirty = true;

        log::info!("Scene manager initialized with root '{}'", self.config.root_name);
        Ok(())
    }

    /// Destroy the GPU buffers and drop every node, mesh and material
    pub fn shutdown(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.destroy(&mut self.device);
        }
        self.tree = SceneTree::new();
        self.root = None;
        self.meshes.clear();
        self.mesh_names.clear();
        self.materials = MaterialTable::default();
        self.pending.clear();
        self.batch_meshes.clear();
        self.committed = BufferCounts::default();
        self.state = UpdateState::Idle;
        self.dirty = false;
        self.scene_bounds = Bounds::default();
        self.next_node_id = 0;
        log::info!("Scene manager shut down");
    }

    /// True between `init` and `shutdown`
    pub const fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    /// Open a transaction: clear the pending batch and the running scene
    /// bounds.
    ///
    /// A batch left over from a failed upload is discarded together with the
    /// meshes and materials it registered. A second begin while one is open
    /// is rejected and leaves the open transaction untouched.
    pub fn begin_scene_update(&mut self) -> SceneResult<()> {
        self.require_initialized()?;
        if self.state == UpdateState::Building {
            log::error!("begin_scene_update called while a scene update is already in progress");
            return Err(SceneError::InvalidState {
                expected: UpdateState::Idle,
                found: self.state,
            });
        }
        if !self.pending.is_empty() || !self.batch_meshes.is_empty() {
            self.discard_pending();
        }

        self.scene_bounds = Bounds::default();
        self.state = UpdateState::Building;
        log::debug!("Scene update started");
        Ok(())
    }

    /// Close the transaction and upload the pending batch.
    ///
    /// Outside a transaction this logs and returns an error without touching
    /// the pending batch or any GPU buffer.
    pub fn end_scene_update(&mut self) -> SceneResult<()> {
        if self.state != UpdateState::Building {
            log::error!("end_scene_update called without a matching begin_scene_update");
            return Err(SceneError::InvalidState {
                expected: UpdateState::Building,
                found: self.state,
            });
        }

        self.state = UpdateState::Idle;
        self.dirty = true;
        self.upload_pending_data()?;

        if self.config.release_cpu_mesh_data {
            self.release_cpu_mesh_data();
        }
        log::debug!("Scene update finished");
        Ok(())
    }

    /// Per-frame driver.
    ///
    /// Does nothing unless the scene changed. Otherwise refreshes transforms
    /// and bounds from the root and, outside a transaction, flushes anything
    /// still pending.
    pub fn update(&mut self) -> SceneResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(root) = self.root else {
            return Ok(());
        };

        if let Some(bounds) = self.tree.refresh_transform(root, &Mat4::identity()) {
            self.scene_bounds = bounds;
        }
        if self.state == UpdateState::Idle {
            self.upload_pending_data()?;
        }
        self.dirty = false;
        Ok(())
    }

    /// Register a mesh and append its geometry to the pending batch.
    ///
    /// The mesh's offsets are the running totals of committed plus pending
    /// data, which is where the geometry lands once uploaded. A name that is
    /// already registered returns the existing key.
    pub fn add_mesh(&mut self, mut mesh: MeshAsset) -> SceneResult<MeshKey> {
        self.require_building("add_mesh")?;
        if mesh.name.is_empty() {
            log::error!("add_mesh called with an empty mesh name");
            return Err(SceneError::EmptyMeshName);
        }
        if let Some(&existing) = self.mesh_names.get(&mesh.name) {
            log::debug!("Mesh '{}' already registered", mesh.name);
            return Ok(existing);
        }

        let totals = self.committed.with_pending(&self.pending);
        mesh.vertex_offset = Some(totals.vertices);
        mesh.index_offset = Some(totals.indices);
        self.pending.vertices.extend_from_slice(&mesh.vertices);
        self.pending.indices.extend_from_slice(&mesh.indices);

        log::debug!(
            "Added mesh '{}': {} vertices at {}, {} indices at {}",
            mesh.name,
            mesh.vertex_count(),
            totals.vertices,
            mesh.index_count(),
            totals.indices
        );

        let name = mesh.name.clone();
        let key = self.meshes.insert(mesh);
        self.mesh_names.insert(name, key);
        self.batch_meshes.push(key);
        Ok(key)
    }

    /// Register a material and queue its GPU table entry.
    ///
    /// `name` overrides the material's own name. Registering a name twice
    /// returns the first id.
    pub fn add_material(&mut self, mut material: Material, name: Option<&str>) -> SceneResult<MaterialId> {
        self.require_building("add_material")?;

        let name = name.map(str::to_string).or_else(|| material.name.clone());
        if let Some(existing) = name.as_ref().and_then(|n| self.materials.by_name.get(n)) {
            return Ok(*existing);
        }

        let id = MaterialId(self.materials.next_id);
        self.materials.next_id += 1;
        let index = self.materials.len();

        material.id = id;
        material.name.clone_from(&name);
        self.pending.materials.push(material.to_gpu());
        self.materials.entries.push(material);
        self.materials.index_of.insert(id, index);
        if let Some(name) = name {
            self.materials.by_name.insert(name, id);
        }

        log::debug!("Registered material {id:?} at index {index}");
        Ok(id)
    }

    /// Dense material table index of `id`, or 0 (the default material)
    pub fn material_index(&self, id: MaterialId) -> u32 {
        self.materials.index(id)
    }

    /// Id of a material registered under `name`
    pub fn material_id(&self, name: &str) -> Option<MaterialId> {
        self.materials.by_name.get(name).copied()
    }

    /// Registered material at `id`
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.index_of.get(&id).and_then(|&i| self.materials.entries.get(i as usize))
    }

    /// Number of material table entries, the default included
    pub fn material_count(&self) -> u32 {
        self.materials.len()
    }

    /// Create a node under the root. Returns `None` if the name is taken or
    /// the manager is not initialized.
    pub fn create_node(&mut self, name: &str) -> Option<NodeKey> {
        let root = self.root?;
        let key = self.tree.create_node(name, self.next_node_id)?;
        self.next_node_id += 1;
        if let Err(err) = self.tree.add_child(root, key) {
            log::error!("Failed to attach node '{name}': {err}");
            self.tree.destroy(key);
            return None;
        }
        self.dirty = true;
        Some(key)
    }

    /// Look up a node by name
    pub fn find_node(&self, name: &str) -> Option<NodeKey> {
        self.tree.find(name)
    }

    /// Destroy a node and its subtree. The root cannot be removed.
    ///
    /// Instance records already uploaded for the removed nodes stay in the
    /// GPU buffers.
    pub fn remove_node(&mut self, name: &str) -> bool {
        let Some(key) = self.tree.find(name) else {
            return false;
        };
        if Some(key) == self.root {
            log::warn!("Refusing to remove the scene root");
            return false;
        }
        let removed = self.tree.destroy(key);
        log::debug!("Removed node '{name}' and {} descendants", removed.len().saturating_sub(1));
        self.dirty = true;
        true
    }

    /// Re-parent `child` under `parent`; the child's world transform is
    /// refreshed immediately.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> SceneResult<()> {
        self.tree.add_child(parent, child)?;
        self.dirty = true;
        Ok(())
    }

    /// Borrow a node
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.tree.get(key)
    }

    /// Mutably borrow a node. Marks the scene dirty.
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        let node = self.tree.get_mut(key)?;
        self.dirty = true;
        Some(node)
    }

    /// Root node
    pub const fn root(&self) -> Option<NodeKey> {
        self.root
    }

    /// The node arena
    pub const fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// Make `node` draw `mesh`.
    ///
    /// Inside a transaction this also queues one instance record and one draw
    /// command per surface, using the node's freshly refreshed world matrix.
    pub fn add_mesh_instance(&mut self, node: NodeKey, mesh: MeshKey) -> SceneResult<()> {
        self.require_initialized()?;
        let mesh_bounds = self
            .meshes
            .get(mesh)
            .map(|m| m.bounds)
            .ok_or_else(|| SceneError::MeshNotFound(format!("{mesh:?}")))?;
        let scene_node = self
            .tree
            .get_mut(node)
            .ok_or_else(|| SceneError::NodeNotFound(format!("{node:?}")))?;
        scene_node.kind = NodeKind::StaticMesh { mesh };
        scene_node.local_bounds = mesh_bounds;

        let parent_world = self
            .tree
            .parent(node)
            .and_then(|p| self.tree.get(p))
            .map_or_else(Mat4::identity, |p| p.world_matrix);
        self.tree.refresh_transform(node, &parent_world);
        self.dirty = true;

        if self.state == UpdateState::Building {
            let world = self.tree.get(node).map_or_else(Mat4::identity, |n| n.world_matrix);
            self.emit_instances(&world, mesh);
        } else {
            log::debug!("Mesh attached outside a scene update; no instance records queued");
        }
        Ok(())
    }

    /// Merge an imported scene under the root.
    ///
    /// Materials and meshes are registered, world matrices are accumulated
    /// level by level through a [`TransformStore`], nodes are created with
    /// their decomposed local transforms, and every node with a mesh queues
    /// its instance records. Returns the keys of the imported root nodes.
    pub fn add_loaded_scene(&mut self, scene: LoadedScene) -> SceneResult<Vec<NodeKey>> {
        self.require_building("add_loaded_scene")?;
        let root = self.root.ok_or(SceneError::NotInitialized)?;

        let parents: Vec<Option<usize>> = scene.nodes.iter().map(|n| n.parent).collect();
        let locals: Vec<Mat4> = scene.nodes.iter().map(|n| n.local_matrix).collect();
        let mut store = TransformStore::from_parents(&parents, &locals)?;
        store.update_matrices();

        let mut material_ids = Vec::with_capacity(scene.materials.len());
        for material in scene.materials {
            material_ids.push(self.add_material(material, None)?);
        }

        let mut mesh_keys = Vec::with_capacity(scene.meshes.len());
        for (index, loaded) in scene.meshes.into_iter().enumerate() {
            let mut mesh = loaded.mesh;
            if mesh.name.is_empty() {
                mesh.name = format!("{}_mesh{index}", scene.name);
            }
            for (surface, slot) in mesh.surfaces.iter_mut().zip(&loaded.surface_materials) {
                surface.material = slot.and_then(|i| material_ids.get(i).copied());
            }
            mesh_keys.push(self.add_mesh(mesh)?);
        }

        let root_world = self.tree.get(root).map_or_else(Mat4::identity, |n| n.world_matrix);
        let mut created: Vec<Option<NodeKey>> = vec![None; scene.nodes.len()];
        let mut top_level = Vec::new();

        for batch in store.level_batches() {
            for index in batch {
                let loaded = &scene.nodes[index];
                let name = self.unique_node_name(&loaded.name);
                let key = self
                    .tree
                    .create_node(&name, self.next_node_id)
                    .ok_or_else(|| SceneError::InvalidHierarchy(format!("node name '{name}' already in use")))?;
                self.next_node_id += 1;
                created[index] = Some(key);

                let mesh = loaded.mesh.and_then(|m| mesh_keys.get(m).copied());
                if let Some(node) = self.tree.get_mut(key) {
                    node.transform = Transform::from_matrix(&loaded.local_matrix);
                    if let Some(mesh) = mesh {
                        node.kind = NodeKind::StaticMesh { mesh };
                        node.local_bounds = self.meshes.get(mesh).map(|m| m.bounds).unwrap_or_default();
                    }
                }

                let parent = loaded.parent.and_then(|p| created[p]).unwrap_or(root);
                self.tree.add_child(parent, key)?;
                if loaded.parent.is_none() {
                    top_level.push(key);
                }

                if let (Some(mesh), Some(world)) = (mesh, store.world_matrix(index)) {
                    self.emit_instances(&(root_world * world), mesh);
                }
            }
        }

        self.dirty = true;
        log::info!(
            "Merged scene '{}': {} nodes, {} meshes, {} materials",
            scene.name,
            scene.nodes.len(),
            mesh_keys.len(),
            material_ids.len()
        );
        Ok(top_level)
    }

    /// Aggregate world bounds of the scene
    pub const fn scene_bounds(&self) -> &Bounds {
        &self.scene_bounds
    }

    /// Registered mesh
    pub fn mesh(&self, key: MeshKey) -> Option<&MeshAsset> {
        self.meshes.get(key)
    }

    /// Look up a mesh by name
    pub fn find_mesh(&self, name: &str) -> Option<MeshKey> {
        self.mesh_names.get(name).copied()
    }

    /// Indirect buffer handle and the number of uploaded draw commands
    pub fn indirect_draws(&self) -> Option<(BufferHandle, u32)> {
        self.pool
            .as_ref()
            .map(|pool| (pool.handle(BufferKind::Indirect), self.committed.draws))
    }

    /// Cluster a registered mesh into meshlets with culling cones.
    ///
    /// Returns `None` for unknown meshes and meshes whose CPU data was
    /// released.
    pub fn build_meshlets(&self, key: MeshKey) -> Option<Vec<Meshlet>> {
        let mesh = self.meshes.get(key)?;
        if !mesh.has_cpu_data() {
            log::warn!("Cannot build meshlets for '{}': CPU data released", mesh.name);
            return None;
        }

        let builder = MeshletBuilder::default();
        let mut meshlets = builder.build(&mesh.indices);
        builder.build_cones(&mut meshlets, &mesh.positions());
        log::debug!("Built {} meshlets for '{}'", meshlets.len(), mesh.name);
        Some(meshlets)
    }

    /// Drop the CPU arrays of every uploaded mesh
    pub fn release_cpu_mesh_data(&mut self) {
        let committed_vertices = self.committed.vertices;
        for mesh in self.meshes.values_mut() {
            if mesh.vertex_offset.is_some_and(|offset| offset < committed_vertices) {
                mesh.release_cpu_data();
            }
        }
    }

    /// Render objects of every visible node with a mesh
    pub fn collect_render_objects(&self) -> Vec<RenderObject> {
        let mut ctx = DrawContext::new();
        if let Some(root) = self.root {
            self.tree.draw(root, &mut ctx);
        }
        ctx.objects
    }

    /// Transaction state
    pub const fn state(&self) -> UpdateState {
        self.state
    }

    /// Data waiting for upload
    pub const fn pending(&self) -> &PendingBatch {
        &self.pending
    }

    /// Element counts already uploaded
    pub const fn committed(&self) -> BufferCounts {
        self.committed
    }

    /// Resource pool, once initialized
    pub const fn pool(&self) -> Option<&GpuResourcePool> {
        self.pool.as_ref()
    }

    /// Configuration passed to `init`
    pub const fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Underlying device
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Underlying device, mutably
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Queue one instance record and draw command per surface of `mesh`
    fn emit_instances(&mut self, world: &Mat4, mesh: MeshKey) {
        let Some(asset) = self.meshes.get(mesh) else {
            return;
        };
        let (Some(vertex_offset), Some(index_offset)) = (asset.vertex_offset, asset.index_offset) else {
            log::warn!("Mesh '{}' has no buffer offsets; skipping instances", asset.name);
            return;
        };

        for surface in &asset.surfaces {
            let local = if surface.bounds.is_empty() { asset.bounds } else { surface.bounds };
            let world_bounds = local.transform(world);
            let material_index = surface.material.map_or(0, |id| self.materials.index(id));
            let object_id = self.committed.objects + self.pending.objects.len() as u32;

            self.pending.objects.push(ObjectData::new(world, &world_bounds, material_index));
            self.pending.draws.push(DrawCommand {
                index_count: surface.index_count,
                instance_count: 1,
                first_index: index_offset + surface.first_index,
                vertex_offset: vertex_offset as i32,
                first_instance: object_id,
                object_id,
            });
            self.scene_bounds.merge(&world_bounds);
        }
    }

    /// Upload every non-empty pending array at the committed offsets.
    ///
    /// Capacity is ensured for all buffers before the first upload, so a
    /// capacity failure leaves every GPU buffer untouched.
    fn upload_pending_data(&mut self) -> SceneResult<()> {
        let pool = self.pool.as_mut().ok_or(SceneError::NotInitialized)?;
        if self.pending.is_empty() {
            self.batch_meshes.clear();
            return Ok(());
        }

        let device = &mut self.device;
        let used = self.committed;
        let totals = used.with_pending(&self.pending);

        pool.ensure_vertex_capacity(device, totals.vertices.into(), used.vertices.into())?;
        pool.ensure_index_capacity(device, totals.indices.into(), used.indices.into())?;
        pool.ensure_instance_capacity(device, totals.objects.into(), used.objects.into())?;
        pool.ensure_indirect_capacity(device, totals.draws.into(), used.draws.into())?;
        pool.ensure_material_capacity(device, totals.materials.into(), used.materials.into())?;

        pool.upload(device, BufferKind::Vertex, used.vertices.into(), &self.pending.vertices)?;
        pool.upload(device, BufferKind::Index, used.indices.into(), &self.pending.indices)?;
        pool.upload(device, BufferKind::Instance, used.objects.into(), &self.pending.objects)?;
        pool.upload(device, BufferKind::Indirect, used.draws.into(), &self.pending.draws)?;
        pool.upload(device, BufferKind::Material, used.materials.into(), &self.pending.materials)?;

        log::debug!(
            "Uploaded pending batch: {} vertices, {} indices, {} objects, {} draws, {} materials",
            self.pending.vertices.len(),
            self.pending.indices.len(),
            self.pending.objects.len(),
            self.pending.draws.len(),
            self.pending.materials.len()
        );

        self.committed = totals;
        self.pending.clear();
        self.batch_meshes.clear();
        Ok(())
    }

    /// Drop a batch that never reached the GPU and unregister everything it
    /// added, so material indices and mesh offsets keep matching the
    /// committed buffers.
    fn discard_pending(&mut self) {
        log::warn!(
            "Discarding pending scene data that was never uploaded ({} meshes, {} materials)",
            self.batch_meshes.len(),
            self.pending.materials.len()
        );

        let table = &mut self.materials;
        let keep = (self.committed.materials as usize).min(table.entries.len());
        for material in table.entries.drain(keep..) {
            table.index_of.remove(&material.id);
            if let Some(name) = &material.name {
                table.by_name.remove(name);
            }
        }

        let dropped = std::mem::take(&mut self.batch_meshes);
        for key in &dropped {
            if let Some(mesh) = self.meshes.remove(*key) {
                self.mesh_names.remove(&mesh.name);
            }
        }

        let stale: Vec<NodeKey> = self
            .tree
            .iter()
            .filter(|(_, node)| node.kind.mesh().is_some_and(|mesh| dropped.contains(&mesh)))
            .map(|(key, _)| key)
            .collect();
        for key in stale {
            if let Some(node) = self.tree.get_mut(key) {
                node.kind = NodeKind::Empty;
                node.local_bounds = Bounds::default();
            }
        }

        self.pending.clear();
        self.dirty = true;
    }

    fn unique_node_name(&self, name: &str) -> String {
        if self.tree.find(name).is_none() {
            return name.to_string();
        }
        (1u32..)
            .map(|n| format!("{name}_{n}"))
            .find(|candidate| self.tree.find(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    fn require_initialized(&self) -> SceneResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            log::error!("Scene manager used before init");
            Err(SceneError::NotInitialized)
        }
    }

    fn require_building(&self, operation: &str) -> SceneResult<()> {
        self.require_initialized()?;
        if self.state == UpdateState::Building {
            Ok(())
        } else {
            log::error!("{operation} called outside begin_scene_update/end_scene_update");
            Err(SceneError::InvalidState {
                expected: UpdateState::Building,
                found: self.state,
            })
        }
    }
}
