//! Mesh assets for the road scene: procedural generators, binary glTF import
//! and a content-addressed store.
//!
//! Categories bind to meshes by content hash, so categories that share
//! geometry (both lane line kinds, both terrain sides) share one mesh entry.
//! The renderer consumes meshes by id, never by file path.

pub mod gltf;
pub mod mesh;

use lanescape_common::Category;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

pub use mesh::MeshData;

/// Content-addressed mesh id computed from the vertex and index data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u64);

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed glTF: {0}")]
    Gltf(String),
    #[error("unsupported glTF feature: {0}")]
    Unsupported(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mesh registry keyed by content hash, with one binding per category.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    meshes: BTreeMap<MeshId, MeshData>,
    bindings: BTreeMap<Category, MeshId>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh for a category and return its id.
    ///
    /// Identical geometry registered twice resolves to the same id.
    pub fn bind(&mut self, category: Category, mesh: MeshData) -> MeshId {
        let id = content_hash(&mesh);
        self.meshes.entry(id).or_insert(mesh);
        self.bindings.insert(category, id);
        id
    }

    /// Mesh id bound to a category.
    pub fn mesh_for(&self, category: Category) -> Option<MeshId> {
        self.bindings.get(&category).copied()
    }

    pub fn get(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(&id)
    }

    /// All distinct meshes, in id order.
    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &MeshData)> {
        self.meshes.iter().map(|(id, m)| (*id, m))
    }

    pub fn bindings(&self) -> &BTreeMap<Category, MeshId> {
        &self.bindings
    }

    /// Number of distinct meshes.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// Load a `.glb` model, falling back to `fallback` when the file is missing
/// or unreadable. Failures are logged and otherwise ignored.
pub fn load_model_or(path: &Path, fallback: impl FnOnce() -> MeshData) -> MeshData {
    match gltf::import_glb(path) {
        Ok(mesh) => {
            let size = mesh.extent();
            tracing::info!(
                model = %path.display(),
                triangles = mesh.triangle_count(),
                width = size.x,
                height = size.y,
                depth = size.z,
                "model loaded"
            );
            mesh
        }
        Err(e) => {
            tracing::error!(model = %path.display(), "failed to load model, using proxy: {e}");
            fallback()
        }
    }
}

fn content_hash(mesh: &MeshData) -> MeshId {
    let mut hasher = Sha256::new();
    for p in &mesh.positions {
        for c in p {
            hasher.update(c.to_le_bytes());
        }
    }
    for n in &mesh.normals {
        for c in n {
            hasher.update(c.to_le_bytes());
        }
    }
    for i in &mesh.indices {
        hasher.update(i.to_le_bytes());
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    MeshId(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::io::Write;

    #[test]
    fn shared_geometry_dedups() {
        let mut store = AssetStore::new();
        let a = store.bind(Category::CenterLine, mesh::plane(0.075, 30.0, 1, 1));
        let b = store.bind(Category::BarrierLine, mesh::plane(0.075, 30.0, 1, 1));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.bindings().len(), 2);
    }

    #[test]
    fn different_geometry_gets_different_ids() {
        let mut store = AssetStore::new();
        let road = store.bind(Category::RoadTile, mesh::plane(7.0, 30.0, 1, 1));
        let line = store.bind(Category::CenterLine, mesh::plane(0.075, 30.0, 1, 1));
        assert_ne!(road, line);
        assert_eq!(store.mesh_for(Category::RoadTile), Some(road));
        assert!(store.get(line).is_some());
        assert!(store.mesh_for(Category::Rider).is_none());
    }

    #[test]
    fn rebinding_replaces_the_category_binding() {
        let mut store = AssetStore::new();
        store.bind(Category::Rider, mesh::proxy_rider());
        let id = store.bind(Category::Rider, mesh::cuboid(Vec3::ONE, Vec3::ZERO));
        assert_eq!(store.mesh_for(Category::Rider), Some(id));
    }

    #[test]
    fn missing_model_falls_back() {
        let mesh = load_model_or(Path::new("/nonexistent/streetlight.glb"), mesh::proxy_street_light);
        assert_eq!(mesh.name, "proxy_street_light");
    }

    #[test]
    fn model_file_is_imported() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&gltf::tests::triangle_glb()).unwrap();
        tmp.flush().unwrap();

        let mesh = load_model_or(tmp.path(), mesh::proxy_rider);
        assert_eq!(mesh.triangle_count(), 1);
    }
}
