//! Binary glTF (`.glb`) import.
//!
//! Reads the JSON and BIN chunks, walks the default scene's node hierarchy and
//! flattens every triangle primitive into one [`MeshData`] in model space.
//! Textures, skins and morph targets are ignored.

use crate::AssetError;
use crate::mesh::MeshData;
use glam::{Mat3, Mat4, Quat, Vec3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

const MODE_TRIANGLES: u32 = 4;
const MAX_NODE_DEPTH: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<Scene>,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    meshes: Vec<Mesh>,
    #[serde(default)]
    accessors: Vec<Accessor>,
    #[serde(default)]
    buffer_views: Vec<BufferView>,
}

#[derive(Debug, Deserialize)]
struct Scene {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct Node {
    #[serde(default)]
    children: Vec<usize>,
    mesh: Option<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

impl Node {
    fn local_matrix(&self) -> Mat4 {
        if let Some(m) = self.matrix {
            return Mat4::from_cols_array(&m);
        }
        let t = self.translation.map(Vec3::from_array).unwrap_or(Vec3::ZERO);
        let r = self.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY);
        let s = self.scale.map(Vec3::from_array).unwrap_or(Vec3::ONE);
        Mat4::from_scale_rotation_translation(s, r, t)
    }
}

#[derive(Debug, Deserialize)]
struct Mesh {
    #[serde(default)]
    primitives: Vec<Primitive>,
}

#[derive(Debug, Deserialize)]
struct Primitive {
    attributes: BTreeMap<String, usize>,
    indices: Option<usize>,
    #[serde(default = "default_mode")]
    mode: u32,
}

fn default_mode() -> u32 {
    MODE_TRIANGLES
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
    sparse: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    #[serde(default)]
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

/// Import a `.glb` file from disk.
pub fn import_glb(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    parse_glb(&bytes, name)
}

/// Parse an in-memory `.glb` container.
pub fn parse_glb(bytes: &[u8], name: &str) -> Result<MeshData, AssetError> {
    let (json, bin) = split_chunks(bytes)?;
    let doc: Document = serde_json::from_slice(json)?;

    let roots: Vec<usize> = match doc.scenes.get(doc.scene.unwrap_or(0)) {
        Some(scene) => scene.nodes.clone(),
        None => {
            // No scene declared: every node that is nobody's child is a root
            let children: Vec<usize> = doc.nodes.iter().flat_map(|n| n.children.clone()).collect();
            (0..doc.nodes.len()).filter(|i| !children.contains(i)).collect()
        }
    };

    let mut out = MeshData::new(name);
    let mut stack: Vec<(usize, Mat4, usize)> =
        roots.into_iter().map(|i| (i, Mat4::IDENTITY, 0)).collect();

    while let Some((index, parent, depth)) = stack.pop() {
        if depth > MAX_NODE_DEPTH {
            return Err(AssetError::Gltf("node hierarchy too deep or cyclic".into()));
        }
        let node = doc
            .nodes
            .get(index)
            .ok_or_else(|| AssetError::Gltf(format!("node {index} out of range")))?;
        let world = parent * node.local_matrix();

        if let Some(mesh_index) = node.mesh {
            let mesh = doc
                .meshes
                .get(mesh_index)
                .ok_or_else(|| AssetError::Gltf(format!("mesh {mesh_index} out of range")))?;
            for primitive in &mesh.primitives {
                if primitive.mode != MODE_TRIANGLES {
                    tracing::warn!(model = name, mode = primitive.mode, "skipping non-triangle primitive");
                    continue;
                }
                let part = read_primitive(&doc, bin, primitive, world)?;
                out.merge(&part);
            }
        }

        for &child in &node.children {
            stack.push((child, world, depth + 1));
        }
    }

    if out.indices.is_empty() {
        return Err(AssetError::Gltf("no triangle geometry".into()));
    }
    Ok(out)
}

fn split_chunks(bytes: &[u8]) -> Result<(&[u8], &[u8]), AssetError> {
    if bytes.len() < 12 || read_u32(bytes, 0) != GLB_MAGIC {
        return Err(AssetError::Gltf("not a binary glTF container".into()));
    }
    let version = read_u32(bytes, 4);
    if version != 2 {
        return Err(AssetError::Unsupported(format!("glTF version {version}")));
    }
    let total = (read_u32(bytes, 8) as usize).min(bytes.len());

    let mut json = None;
    let mut bin: &[u8] = &[];
    let mut offset = 12;
    while offset + 8 <= total {
        let len = read_u32(bytes, offset) as usize;
        let kind = read_u32(bytes, offset + 4);
        let start = offset + 8;
        let end = start
            .checked_add(len)
            .filter(|&e| e <= total)
            .ok_or_else(|| AssetError::Gltf("chunk runs past end of file".into()))?;
        match kind {
            CHUNK_JSON => json = Some(&bytes[start..end]),
            CHUNK_BIN => bin = &bytes[start..end],
            _ => {}
        }
        offset = end;
    }

    let json = json.ok_or_else(|| AssetError::Gltf("missing JSON chunk".into()))?;
    Ok((json, bin))
}

fn read_primitive(
    doc: &Document,
    bin: &[u8],
    primitive: &Primitive,
    world: Mat4,
) -> Result<MeshData, AssetError> {
    let position_accessor = *primitive
        .attributes
        .get("POSITION")
        .ok_or_else(|| AssetError::Gltf("primitive has no POSITION".into()))?;
    let positions = read_vec3(doc, bin, position_accessor)?;

    let indices = match primitive.indices {
        Some(i) => read_indices(doc, bin, i)?,
        None => (0..positions.len() as u32).collect(),
    };
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(AssetError::Gltf(format!("index {bad} out of range")));
    }

    let mut part = MeshData::new("primitive");
    part.positions = positions
        .iter()
        .map(|p| world.transform_point3(Vec3::from_array(*p)).to_array())
        .collect();
    part.indices = indices;

    match primitive.attributes.get("NORMAL") {
        Some(&n) => {
            let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
            part.normals = read_vec3(doc, bin, n)?
                .iter()
                .map(|v| (normal_matrix * Vec3::from_array(*v)).normalize_or_zero().to_array())
                .collect();
            if part.normals.len() != part.positions.len() {
                return Err(AssetError::Gltf("NORMAL and POSITION counts differ".into()));
            }
        }
        None => part.compute_vertex_normals(),
    }
    Ok(part)
}

/// Byte slice and stride for the `count` elements behind an accessor.
fn accessor_bytes<'a>(
    doc: &Document,
    bin: &'a [u8],
    accessor: &Accessor,
    element_size: usize,
) -> Result<(&'a [u8], usize), AssetError> {
    if accessor.sparse.is_some() {
        return Err(AssetError::Unsupported("sparse accessors".into()));
    }
    let view_index = accessor
        .buffer_view
        .ok_or_else(|| AssetError::Unsupported("accessor without bufferView".into()))?;
    let view = doc
        .buffer_views
        .get(view_index)
        .ok_or_else(|| AssetError::Gltf(format!("bufferView {view_index} out of range")))?;
    if view.buffer != 0 {
        return Err(AssetError::Unsupported("external buffers".into()));
    }

    let overflow = || AssetError::Gltf("accessor range overflows".into());
    let stride = view.byte_stride.unwrap_or(element_size);
    let view_end = view
        .byte_offset
        .checked_add(view.byte_length)
        .ok_or_else(overflow)?;
    if view_end > bin.len() {
        return Err(AssetError::Gltf("bufferView runs past BIN chunk".into()));
    }
    let start = view
        .byte_offset
        .checked_add(accessor.byte_offset)
        .ok_or_else(overflow)?;
    let needed = match accessor.count {
        0 => 0,
        n => stride
            .checked_mul(n - 1)
            .and_then(|b| b.checked_add(element_size))
            .ok_or_else(overflow)?,
    };
    let end = start.checked_add(needed).ok_or_else(overflow)?;
    if end > view_end {
        return Err(AssetError::Gltf("accessor runs past its bufferView".into()));
    }
    Ok((&bin[start..end], stride))
}

fn read_vec3(doc: &Document, bin: &[u8], index: usize) -> Result<Vec<[f32; 3]>, AssetError> {
    let accessor = doc
        .accessors
        .get(index)
        .ok_or_else(|| AssetError::Gltf(format!("accessor {index} out of range")))?;
    if accessor.kind != "VEC3" || accessor.component_type != COMPONENT_F32 {
        return Err(AssetError::Unsupported(format!(
            "vertex attribute {} with component type {}",
            accessor.kind, accessor.component_type
        )));
    }
    let (bytes, stride) = accessor_bytes(doc, bin, accessor, 12)?;
    Ok((0..accessor.count)
        .map(|i| {
            let o = i * stride;
            [read_f32(bytes, o), read_f32(bytes, o + 4), read_f32(bytes, o + 8)]
        })
        .collect())
}

fn read_indices(doc: &Document, bin: &[u8], index: usize) -> Result<Vec<u32>, AssetError> {
    let accessor = doc
        .accessors
        .get(index)
        .ok_or_else(|| AssetError::Gltf(format!("accessor {index} out of range")))?;
    if accessor.kind != "SCALAR" {
        return Err(AssetError::Gltf(format!("index accessor of type {}", accessor.kind)));
    }
    let size = match accessor.component_type {
        COMPONENT_U8 => 1,
        COMPONENT_U16 => 2,
        COMPONENT_U32 => 4,
        other => return Err(AssetError::Unsupported(format!("index component type {other}"))),
    };
    let (bytes, stride) = accessor_bytes(doc, bin, accessor, size)?;
    Ok((0..accessor.count)
        .map(|i| {
            let o = i * stride;
            match size {
                1 => bytes[o] as u32,
                2 => u16::from_le_bytes([bytes[o], bytes[o + 1]]) as u32,
                _ => read_u32(bytes, o),
            }
        })
        .collect())
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_bits(read_u32(bytes, offset))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Assemble a `.glb` from a JSON document and a BIN payload.
    pub(crate) fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        let total = 12 + 8 + json.len() + 8 + bin.len();

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
        out
    }

    /// One triangle in the XY plane, indexed with u16, under a translated node.
    pub(crate) fn triangle_glb() -> Vec<u8> {
        let mut bin = Vec::new();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        let json = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"mesh": 0, "translation": [0.0, 1.0, 0.0]}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}],
            "buffers": [{"byteLength": 42}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ]
        }"#;
        glb(json, &bin)
    }

    #[test]
    fn parses_indexed_triangle_with_node_transform() {
        let mesh = parse_glb(&triangle_glb(), "tri").unwrap();
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.positions[2], [0.0, 2.0, 0.0]);
        // Normals were missing from the file and derived from winding
        for n in &mesh.normals {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = triangle_glb();
        bytes[0] = b'x';
        assert!(matches!(parse_glb(&bytes, "bad"), Err(AssetError::Gltf(_))));
    }

    #[test]
    fn rejects_truncated_chunk() {
        let bytes = triangle_glb();
        let cut = &bytes[..bytes.len() - 8];
        assert!(parse_glb(cut, "cut").is_err());
    }

    #[test]
    fn rejects_out_of_range_index() {
        let mut bin = vec![0u8; 36];
        for i in [0u16, 1, 7] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        let json = r#"{
            "nodes": [{"mesh": 0}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}],
            "bufferViews": [
                {"byteOffset": 0, "byteLength": 36},
                {"byteOffset": 36, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ]
        }"#;
        let err = parse_glb(&glb(json, &bin), "oob").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    fn single_accessor_glb(view: &str, count: &str) -> Vec<u8> {
        let json = format!(
            r#"{{
            "nodes": [{{"mesh": 0}}],
            "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
            "bufferViews": [{view}],
            "accessors": [
                {{"bufferView": 0, "componentType": 5126, "count": {count}, "type": "VEC3"}}
            ]
        }}"#
        );
        glb(&json, &[0u8; 36])
    }

    #[test]
    fn huge_buffer_view_offset_is_an_error() {
        let bytes = single_accessor_glb(
            r#"{"byteOffset": 18446744073709551610, "byteLength": 36}"#,
            "3",
        );
        let err = parse_glb(&bytes, "huge_offset").unwrap_err();
        assert!(err.to_string().contains("overflows"), "{err}");
    }

    #[test]
    fn huge_accessor_count_is_an_error() {
        let bytes = single_accessor_glb(
            r#"{"byteOffset": 0, "byteLength": 36}"#,
            "4611686018427387904",
        );
        let err = parse_glb(&bytes, "huge_count").unwrap_err();
        assert!(err.to_string().contains("overflows"), "{err}");
    }

    #[test]
    fn accessor_past_view_is_an_error() {
        let bytes = single_accessor_glb(r#"{"byteOffset": 0, "byteLength": 36}"#, "4");
        let err = parse_glb(&bytes, "long").unwrap_err();
        assert!(err.to_string().contains("past its bufferView"), "{err}");
    }

    #[test]
    fn scene_without_triangles_is_an_error() {
        let json = r#"{"scenes": [{"nodes": []}]}"#;
        assert!(matches!(parse_glb(&glb(json, &[]), "empty"), Err(AssetError::Gltf(_))));
    }
}
