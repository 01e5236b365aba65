//! Model assets: mesh/node payloads, OBJ parsing, and per-instance
//! working copies.

use std::sync::{Arc, RwLock, RwLockReadGuard};

use caldera_core::alloc::HashMap;
use caldera_core::math::{Mat4, Vec2, Vec3};

use crate::device::MeshId;
use crate::error::{AssetError, AssetResult};

/// CPU-side geometry for one mesh.
///
/// The attribute vectors are parallel: `positions`, `normals` and `uvs`
/// all have one entry per vertex, and `indices` index into them.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Position data as raw bytes for buffer uploads.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Index data as raw bytes for buffer uploads.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// One node in a model's node table.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    /// Index of the parent node; parents always precede children in the
    /// table.
    pub parent: Option<usize>,
    pub local_transform: Mat4,
    /// Index into the payload's mesh list, if this node carries geometry.
    pub mesh: Option<usize>,
}

/// The content behind a [`Model`] handle.
#[derive(Debug, Default)]
pub struct ModelPayload {
    pub nodes: Vec<ModelNode>,
    pub meshes: Vec<MeshData>,
    /// Device meshes, parallel to `meshes`. Empty until resource creation
    /// runs on the consumer thread.
    pub gpu_meshes: Vec<MeshId>,
}

impl ModelPayload {
    /// The empty-but-valid payload models start with: renderable (draws
    /// nothing) until the real content is swapped in.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn has_content(&self) -> bool {
        !self.meshes.is_empty()
    }
}

/// A shared model asset.
///
/// Like [`Texture`](crate::texture::Texture), callers hold `Arc<Model>`
/// and the payload behind it is hot-swapped when the async load finishes.
#[derive(Debug)]
pub struct Model {
    payload: RwLock<ModelPayload>,
}

impl Model {
    pub(crate) fn new(payload: ModelPayload) -> Self {
        Self {
            payload: RwLock::new(payload),
        }
    }

    /// Read access to the current payload.
    pub fn read(&self) -> RwLockReadGuard<'_, ModelPayload> {
        self.payload.read().unwrap()
    }

    pub fn node_count(&self) -> usize {
        self.read().nodes.len()
    }

    pub fn has_content(&self) -> bool {
        self.read().has_content()
    }

    /// Hot-swap: replace the payload in place, preserving identity.
    pub(crate) fn swap_payload(&self, new_payload: ModelPayload) {
        *self.payload.write().unwrap() = new_payload;
    }
}

/// Per-node mutable state owned by a [`ModelInstance`].
#[derive(Debug, Clone)]
pub struct NodeLocal {
    pub name: String,
    pub parent: Option<usize>,
    pub local_transform: Mat4,
    pub world_transform: Mat4,
    pub mesh: Option<usize>,
}

/// A mutable working copy derived from a shared [`Model`].
///
/// Instances copy the source's node table so they can animate transforms
/// independently. An async hot swap can change the source's node count
/// under a live instance, which would leave this copy structurally out of
/// sync; call [`sync`](Self::sync) before touching per-node state each
/// frame so the copy is rebuilt when that happens.
#[derive(Debug)]
pub struct ModelInstance {
    source: Arc<Model>,
    nodes: Vec<NodeLocal>,
}

impl ModelInstance {
    pub fn new(source: Arc<Model>) -> Self {
        let mut instance = Self {
            source,
            nodes: Vec::new(),
        };
        instance.sync();
        instance
    }

    pub fn source(&self) -> &Arc<Model> {
        &self.source
    }

    /// Rebuild the local node table if the source payload was swapped to
    /// one with a different node count. Returns `true` if a rebuild
    /// happened (any per-instance transform edits are lost).
    pub fn sync(&mut self) -> bool {
        let payload = self.source.read();
        if payload.nodes.len() == self.nodes.len() {
            return false;
        }

        self.nodes = payload
            .nodes
            .iter()
            .map(|node| NodeLocal {
                name: node.name.clone(),
                parent: node.parent,
                local_transform: node.local_transform,
                world_transform: node.local_transform,
                mesh: node.mesh,
            })
            .collect();
        drop(payload);

        self.update_world_transforms();
        true
    }

    /// Recompute world transforms from the local ones. Parents precede
    /// children in the table, so one forward pass suffices.
    pub fn update_world_transforms(&mut self) {
        for i in 0..self.nodes.len() {
            let world = match self.nodes[i].parent {
                Some(p) => self.nodes[p].world_transform * self.nodes[i].local_transform,
                None => self.nodes[i].local_transform,
            };
            self.nodes[i].world_transform = world;
        }
    }

    pub fn nodes(&self) -> &[NodeLocal] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [NodeLocal] {
        &mut self.nodes
    }
}

/// Parse Wavefront OBJ text into a model payload.
///
/// Supports `o`/`g` object splits, `v`/`vn`/`vt` attributes and `f` faces
/// with any of the index forms (`v`, `v/vt`, `v//vn`, `v/vt/vn`,
/// negative indices). Faces with more than three corners are triangulated
/// as a fan. `path` is only used for error reporting.
pub fn parse_obj(path: &str, bytes: &[u8]) -> AssetResult<ModelPayload> {
    let text = std::str::from_utf8(bytes).map_err(|e| AssetError::Decode {
        path: path.to_string(),
        message: format!("invalid UTF-8: {}", e),
    })?;

    let decode_err = |line_no: usize, message: String| AssetError::Decode {
        path: path.to_string(),
        message: format!("line {}: {}", line_no, message),
    };

    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();

    struct MeshBuilder {
        mesh: MeshData,
        // (position, uv, normal) -> vertex index, all resolved absolute
        seen: HashMap<(usize, usize, usize), u32>,
    }

    impl MeshBuilder {
        fn new(name: &str) -> Self {
            Self {
                mesh: MeshData {
                    name: name.to_string(),
                    ..MeshData::default()
                },
                seen: HashMap::new(),
            }
        }
    }

    let mut finished: Vec<MeshData> = Vec::new();
    let mut current = MeshBuilder::new("default");

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or("");
        match keyword {
            "v" => {
                positions.push(parse_vec3(&mut parts).map_err(|m| decode_err(line_no, m))?);
            }
            "vn" => {
                normals.push(parse_vec3(&mut parts).map_err(|m| decode_err(line_no, m))?);
            }
            "vt" => {
                uvs.push(parse_vec2(&mut parts).map_err(|m| decode_err(line_no, m))?);
            }
            "o" | "g" => {
                let name = parts.next().unwrap_or("unnamed");
                if !current.mesh.indices.is_empty() {
                    finished.push(current.mesh);
                }
                current = MeshBuilder::new(name);
            }
            "f" => {
                let mut corners: Vec<u32> = Vec::new();
                for corner in parts {
                    let (pi, ti, ni) = parse_face_corner(
                        corner,
                        positions.len(),
                        uvs.len(),
                        normals.len(),
                    )
                    .map_err(|m| decode_err(line_no, m))?;

                    let key = (pi, ti, ni);
                    let index = match current.seen.get(&key) {
                        Some(&existing) => existing,
                        None => {
                            let index = current.mesh.positions.len() as u32;
                            current.mesh.positions.push(positions[pi]);
                            current.mesh.uvs.push(if ti == usize::MAX {
                                Vec2::ZERO
                            } else {
                                uvs[ti]
                            });
                            current.mesh.normals.push(if ni == usize::MAX {
                                Vec3::ZERO
                            } else {
                                normals[ni]
                            });
                            current.seen.insert(key, index);
                            index
                        }
                    };
                    corners.push(index);
                }

                if corners.len() < 3 {
                    return Err(decode_err(
                        line_no,
                        format!("face has {} corners, need at least 3", corners.len()),
                    ));
                }

                // Fan triangulation.
                for i in 1..corners.len() - 1 {
                    current.mesh.indices.push(corners[0]);
                    current.mesh.indices.push(corners[i]);
                    current.mesh.indices.push(corners[i + 1]);
                }
            }
            // mtllib/usemtl/s and anything else we don't consume
            _ => {}
        }
    }

    if !current.mesh.indices.is_empty() {
        finished.push(current.mesh);
    }

    if finished.is_empty() {
        return Err(AssetError::Decode {
            path: path.to_string(),
            message: "no faces found".to_string(),
        });
    }

    let nodes = finished
        .iter()
        .enumerate()
        .map(|(i, mesh)| ModelNode {
            name: mesh.name.clone(),
            parent: None,
            local_transform: Mat4::IDENTITY,
            mesh: Some(i),
        })
        .collect();

    Ok(ModelPayload {
        nodes,
        meshes: finished,
        gpu_meshes: Vec::new(),
    })
}

fn parse_f32(part: Option<&str>) -> Result<f32, String> {
    let part = part.ok_or_else(|| "missing component".to_string())?;
    part.parse::<f32>()
        .map_err(|_| format!("invalid number '{}'", part))
}

fn parse_vec3<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Vec3, String> {
    Ok(Vec3::new(
        parse_f32(parts.next())?,
        parse_f32(parts.next())?,
        parse_f32(parts.next())?,
    ))
}

fn parse_vec2<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<Vec2, String> {
    Ok(Vec2::new(parse_f32(parts.next())?, parse_f32(parts.next())?))
}

/// Resolve one `f` corner into absolute `(position, uv, normal)` indices.
/// Missing attributes resolve to `usize::MAX`.
fn parse_face_corner(
    corner: &str,
    position_count: usize,
    uv_count: usize,
    normal_count: usize,
) -> Result<(usize, usize, usize), String> {
    let mut fields = corner.split('/');

    let position = resolve_index(fields.next(), position_count, corner)?
        .ok_or_else(|| format!("face corner '{}' has no position index", corner))?;
    let uv = resolve_index(fields.next(), uv_count, corner)?.unwrap_or(usize::MAX);
    let normal = resolve_index(fields.next(), normal_count, corner)?.unwrap_or(usize::MAX);

    Ok((position, uv, normal))
}

/// OBJ indices are 1-based; negative values count back from the end of
/// the attribute list.
fn resolve_index(
    field: Option<&str>,
    count: usize,
    corner: &str,
) -> Result<Option<usize>, String> {
    let field = match field {
        Some(f) if !f.is_empty() => f,
        _ => return Ok(None),
    };

    let value: i64 = field
        .parse()
        .map_err(|_| format!("invalid index '{}' in face corner '{}'", field, corner))?;

    let resolved = if value > 0 {
        (value - 1) as usize
    } else if value < 0 {
        let back = (-value) as usize;
        if back > count {
            return Err(format!("index {} out of range in '{}'", value, corner));
        }
        count - back
    } else {
        return Err(format!("index 0 is invalid in '{}'", corner));
    };

    if resolved >= count {
        return Err(format!("index {} out of range in '{}'", value, corner));
    }
    Ok(Some(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# simple triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn test_parse_triangle() {
        let payload = parse_obj("tri.obj", TRIANGLE.as_bytes()).unwrap();
        assert_eq!(payload.meshes.len(), 1);
        assert_eq!(payload.nodes.len(), 1);

        let mesh = &payload.meshes[0];
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.normals.len(), 3);
        assert_eq!(mesh.uvs.len(), 3);
        assert_eq!(mesh.positions[1], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_quad_is_triangulated() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
        let payload = parse_obj("quad.obj", obj.as_bytes()).unwrap();
        let mesh = &payload.meshes[0];
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_negative_indices() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
f -3 -2 -1
";
        let payload = parse_obj("neg.obj", obj.as_bytes()).unwrap();
        assert_eq!(payload.meshes[0].triangle_count(), 1);
        assert_eq!(payload.meshes[0].positions[0], Vec3::ZERO);
    }

    #[test]
    fn test_objects_become_nodes() {
        let obj = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 2 0 0
v 3 0 0
v 2 1 0
f 4 5 6
";
        let payload = parse_obj("two.obj", obj.as_bytes()).unwrap();
        assert_eq!(payload.meshes.len(), 2);
        assert_eq!(payload.nodes.len(), 2);
        assert_eq!(payload.nodes[0].name, "first");
        assert_eq!(payload.nodes[1].name, "second");
        assert_eq!(payload.nodes[1].mesh, Some(1));
    }

    #[test]
    fn test_out_of_range_index_is_an_error() {
        let obj = "\
v 0 0 0
f 1 2 3
";
        let result = parse_obj("bad.obj", obj.as_bytes());
        assert!(matches!(result, Err(AssetError::Decode { .. })));
    }

    #[test]
    fn test_no_faces_is_an_error() {
        let result = parse_obj("empty.obj", b"v 0 0 0\n");
        assert!(matches!(result, Err(AssetError::Decode { .. })));
    }

    #[test]
    fn test_instance_resyncs_after_swap() {
        let model = Arc::new(Model::new(ModelPayload::empty()));
        let mut instance = ModelInstance::new(Arc::clone(&model));
        assert!(instance.nodes().is_empty());

        let payload = parse_obj("tri.obj", TRIANGLE.as_bytes()).unwrap();
        model.swap_payload(payload);

        // The copy is structurally stale until the consumer resyncs.
        assert_ne!(instance.nodes().len(), model.node_count());
        assert!(instance.sync());
        assert_eq!(instance.nodes().len(), model.node_count());

        // A second sync with an unchanged source is a no-op.
        assert!(!instance.sync());
    }

    #[test]
    fn test_world_transforms_follow_parents() {
        let model = Arc::new(Model::new(ModelPayload {
            nodes: vec![
                ModelNode {
                    name: "root".into(),
                    parent: None,
                    local_transform: Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
                    mesh: None,
                },
                ModelNode {
                    name: "child".into(),
                    parent: Some(0),
                    local_transform: Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
                    mesh: None,
                },
            ],
            meshes: Vec::new(),
            gpu_meshes: Vec::new(),
        }));

        let instance = ModelInstance::new(model);
        let child_world = instance.nodes()[1].world_transform;
        let origin = child_world.transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(1.0, 2.0, 0.0));
    }
}
