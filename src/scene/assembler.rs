//! Scene assembly from decoded records.
//!
//! The assembler builds the transform skeleton up front (root group plus
//! one group per hierarchy node) and then adds meshes one at a time, which
//! is what allows the incremental builder to suspend between whole meshes
//! and never expose a partially built shape.

use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;
use std::mem;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use tracing::debug;

use crate::model::{Material, Mesh, Model, ROOT_NODE_ID};
use super::{
    Appearance, Group, GroupId, IndexedTriangles, Scene, SceneChild, Shape, SharedGroup,
};

/// Incremental scene assembler.
pub struct SceneAssembler {
    meshes: Vec<Mesh>,
    materials: HashMap<String, Material>,
    scene: Scene,
    /// Mesh name -> hierarchy groups referencing it.
    mesh_groups: HashMap<String, Vec<GroupId>>,
    /// Catch-all group for meshes the hierarchy never references.
    default_group: Option<GroupId>,
    next_mesh: usize,
}

impl SceneAssembler {
    /// Build the transform skeleton for `model`: coordinate-correction
    /// root plus the reconstructed hierarchy tree (or nothing yet, when
    /// the file had no keyframe data).
    pub fn new(model: Model) -> Self {
        // 3DS files are Z-up; the root rotates into Y-up and applies the
        // uniform master scale
        let root_transform = Mat4::from_rotation_x(-FRAC_PI_2)
            * Mat4::from_scale(Vec3::splat(model.master_scale));
        let mut scene = Scene::with_root(root_transform);

        let mut mesh_groups: HashMap<String, Vec<GroupId>> = HashMap::new();
        let mut by_node_id: HashMap<i16, GroupId> = HashMap::new();
        for node in &model.hierarchy {
            // Decode guarantees parents precede children
            let parent = match node.parent_id {
                ROOT_NODE_ID => scene.root,
                id => by_node_id.get(&id).copied().unwrap_or(scene.root),
            };
            let group = Group::new(Some(node.name.clone()), node.local_transform());
            let group_id = scene.add_group(parent, group);
            by_node_id.insert(node.node_id, group_id);
            if node.is_mesh_group {
                mesh_groups.entry(node.name.clone()).or_default().push(group_id);
            }
        }

        Self {
            meshes: model.meshes,
            materials: model.materials,
            scene,
            mesh_groups,
            default_group: None,
            next_mesh: 0,
        }
    }

    /// Total number of meshes to build.
    #[inline]
    pub fn total(&self) -> usize {
        self.meshes.len()
    }

    /// Number of meshes already built.
    #[inline]
    pub fn built(&self) -> usize {
        self.next_mesh
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.next_mesh >= self.meshes.len()
    }

    /// Build the next mesh into the graph, in decode order. Returns false
    /// when no mesh remained.
    pub fn build_next_mesh(&mut self) -> bool {
        if self.next_mesh >= self.meshes.len() {
            return false;
        }
        // The mesh record is consumed here; only its built shapes live on
        let mesh = mem::take(&mut self.meshes[self.next_mesh]);
        self.next_mesh += 1;

        let shapes = build_shapes(&mesh, &self.materials);
        let transform = mesh.transform.filter(|t| *t != Mat4::IDENTITY);
        let referencing = self.mesh_groups.get(&mesh.name).cloned().unwrap_or_default();

        match referencing.as_slice() {
            [] => {
                let parent = self.default_group();
                self.attach(parent, transform, shapes);
            }
            [only] => self.attach(*only, transform, shapes),
            many => {
                // Instanced mesh: store the geometry once and link it
                let shared_id = self.scene.shared.len();
                self.scene.shared.push(SharedGroup {
                    name: mesh.name.clone(),
                    transform: transform.unwrap_or(Mat4::IDENTITY),
                    shapes,
                });
                debug!(mesh = %mesh.name, instances = many.len(), "sharing instanced mesh");
                for &group_id in many {
                    self.scene.groups[group_id]
                        .children
                        .push(SceneChild::SharedLink(shared_id));
                }
            }
        }
        true
    }

    /// Finish the assembly and hand out the scene.
    pub fn into_scene(self) -> Scene {
        self.scene
    }

    /// Attach shapes under `parent`, wrapping them in an extra group when
    /// the mesh carries a non-identity local transform.
    fn attach(&mut self, parent: GroupId, transform: Option<Mat4>, shapes: Vec<Shape>) {
        let target = match transform {
            Some(t) => self.scene.add_group(parent, Group::new(None, t)),
            None => parent,
        };
        self.scene.groups[target]
            .children
            .extend(shapes.into_iter().map(SceneChild::Shape));
    }

    fn default_group(&mut self) -> GroupId {
        if let Some(id) = self.default_group {
            return id;
        }
        let id = self
            .scene
            .add_group(self.scene.root, Group::new(None, Mat4::IDENTITY));
        self.default_group = Some(id);
        id
    }
}

/// Emit one shape per contiguous material run of the (already sorted)
/// face list.
fn build_shapes(mesh: &Mesh, materials: &HashMap<String, Material>) -> Vec<Shape> {
    let positions = Arc::new(mesh.vertices.clone());
    let normals = Arc::new(mesh.normals.clone());
    let uvs = Arc::new(mesh.texture_coordinates.clone().unwrap_or_default());

    let mut shapes = Vec::new();
    let mut i = 0;
    while i < mesh.faces.len() {
        let run_material = mesh.faces[i].material;
        let mut position_indices = Vec::new();
        let mut normal_indices = Vec::new();
        while i < mesh.faces.len() && mesh.faces[i].material == run_material {
            let face = &mesh.faces[i];
            position_indices.extend(face.vertex_indices);
            if let Some(indices) = face.normal_indices {
                normal_indices.extend(indices);
            }
            i += 1;
        }

        let appearance = run_material
            .and_then(|slot| mesh.material_names.get(slot as usize))
            .and_then(|name| materials.get(name))
            .map(|m| Arc::new(Appearance::from_material(m)))
            .unwrap_or_else(Appearance::default_shared);

        shapes.push(Shape {
            name: Some(mesh.name.clone()),
            appearance,
            geometry: IndexedTriangles {
                positions: positions.clone(),
                normals: normals.clone(),
                uvs: uvs.clone(),
                position_indices,
                normal_indices,
            },
        });
    }
    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::normals;
    use crate::model::Face;

    fn triangle_mesh(name: &str) -> Mesh {
        let mut mesh = Mesh {
            name: name.to_string(),
            vertices: vec![
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            faces: vec![Face {
                index: 0,
                vertex_indices: [0, 2, 1],
                flags: 0,
                material: None,
                smoothing_group: None,
                normal_indices: None,
            }],
            ..Default::default()
        };
        normals::reconstruct(&mut mesh);
        mesh
    }

    #[test]
    fn test_unreferenced_mesh_goes_to_default_group() {
        let mut model = Model::new("test.3ds");
        model.meshes.push(triangle_mesh("tri"));

        let mut assembler = SceneAssembler::new(model);
        assert!(assembler.build_next_mesh());
        assert!(!assembler.build_next_mesh());
        let scene = assembler.into_scene();

        // Root plus one default group holding the shape
        assert_eq!(scene.groups.len(), 2);
        assert_eq!(scene.shape_count(), 1);
        assert!(matches!(scene.groups[1].children[0], SceneChild::Shape(_)));
    }

    #[test]
    fn test_mesh_transform_wraps_shapes() {
        let mut model = Model::new("test.3ds");
        let mut mesh = triangle_mesh("tri");
        mesh.transform = Some(Mat4::from_translation(Vec3::X));
        model.meshes.push(mesh);

        let mut assembler = SceneAssembler::new(model);
        assembler.build_next_mesh();
        let scene = assembler.into_scene();

        // Root -> default group -> transform group -> shape
        assert_eq!(scene.groups.len(), 3);
        assert_eq!(scene.groups[2].transform, Mat4::from_translation(Vec3::X));
        assert!(matches!(scene.groups[2].children[0], SceneChild::Shape(_)));
    }

    #[test]
    fn test_root_transform_applies_master_scale() {
        let mut model = Model::new("test.3ds");
        model.master_scale = 2.0;
        let assembler = SceneAssembler::new(model);
        let scene = assembler.into_scene();

        let expected =
            Mat4::from_rotation_x(-FRAC_PI_2) * Mat4::from_scale(Vec3::splat(2.0));
        assert_eq!(scene.groups[scene.root].transform, expected);
    }
}
