//! Assembled scene graph output.
//!
//! The graph is arena-based: groups live in [`Scene::groups`] and refer to
//! each other by index, which keeps parent/child wiring trivially
//! testable. A mesh referenced by more than one hierarchy node is built
//! once into a [`SharedGroup`] and linked from each referencing group.

pub mod assembler;
pub mod builder;

use std::sync::{Arc, OnceLock};

use glam::{Mat4, Vec2, Vec3};

use crate::model::Material;
use crate::util::BBox3f;

/// Index of a group in [`Scene::groups`].
pub type GroupId = usize;

/// Index of a shared group in [`Scene::shared`].
pub type SharedId = usize;

/// A complete assembled scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub groups: Vec<Group>,
    pub shared: Vec<SharedGroup>,
    pub root: GroupId,
}

impl Scene {
    /// Create a scene holding only a root group with the given transform.
    pub fn with_root(transform: Mat4) -> Self {
        Self {
            groups: vec![Group::new(None, transform)],
            shared: Vec::new(),
            root: 0,
        }
    }

    /// Append a group under `parent` and return its id.
    pub fn add_group(&mut self, parent: GroupId, group: Group) -> GroupId {
        let id = self.groups.len();
        self.groups.push(group);
        self.groups[parent].children.push(SceneChild::Group(id));
        id
    }

    /// Total number of shapes, counting each shared group once.
    pub fn shape_count(&self) -> usize {
        let direct: usize = self
            .groups
            .iter()
            .map(|g| {
                g.children
                    .iter()
                    .filter(|c| matches!(c, SceneChild::Shape(_)))
                    .count()
            })
            .sum();
        let shared: usize = self.shared.iter().map(|s| s.shapes.len()).sum();
        direct + shared
    }

    /// Iterate every shape in the scene, shared ones included.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.groups
            .iter()
            .flat_map(|g| g.children.iter())
            .filter_map(|c| match c {
                SceneChild::Shape(s) => Some(s),
                _ => None,
            })
            .chain(self.shared.iter().flat_map(|s| s.shapes.iter()))
    }

    /// Bounds of all geometry, in local (untransformed) coordinates.
    pub fn local_bounds(&self) -> BBox3f {
        let mut bounds = BBox3f::EMPTY;
        for shape in self.shapes() {
            bounds.expand_by_box(&shape.geometry.bounds());
        }
        bounds
    }
}

/// A transform group node.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub name: Option<String>,
    pub transform: Mat4,
    pub children: Vec<SceneChild>,
}

impl Group {
    pub fn new(name: Option<String>, transform: Mat4) -> Self {
        Self { name, transform, children: Vec::new() }
    }
}

/// A child of a transform group.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneChild {
    Group(GroupId),
    Shape(Shape),
    /// Link into [`Scene::shared`]; geometry stored once, instanced here.
    SharedLink(SharedId),
}

/// Geometry built once and instanced from several groups.
#[derive(Clone, Debug, PartialEq)]
pub struct SharedGroup {
    pub name: String,
    /// The mesh's own local transform, identity when it had none.
    pub transform: Mat4,
    pub shapes: Vec<Shape>,
}

/// A leaf shape: one contiguous material run of one mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub name: Option<String>,
    pub appearance: Arc<Appearance>,
    pub geometry: IndexedTriangles,
}

/// Simple reflectance description attached to a shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Appearance {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    /// Shininess coefficient in 0..1.
    pub shininess: f32,
    /// Transparency coefficient in 0..1.
    pub transparency: f32,
    /// Resolved archive entry path of the texture image.
    pub texture: Option<String>,
    /// False for two-sided materials.
    pub cull_back_faces: bool,
}

impl Appearance {
    /// The process-wide default appearance used for faces with no
    /// material. Constructed once, never mutated, shared by reference
    /// across decodes.
    pub fn default_shared() -> Arc<Appearance> {
        static DEFAULT: OnceLock<Arc<Appearance>> = OnceLock::new();
        DEFAULT
            .get_or_init(|| {
                Arc::new(Appearance {
                    ambient: Vec3::splat(0.2),
                    diffuse: Vec3::splat(0.8),
                    specular: Vec3::ZERO,
                    shininess: 0.0,
                    transparency: 0.0,
                    texture: None,
                    cull_back_faces: true,
                })
            })
            .clone()
    }

    /// Build an appearance from a decoded material.
    pub fn from_material(material: &Material) -> Appearance {
        let default = Self::default_shared();
        Appearance {
            ambient: material.ambient.unwrap_or(default.ambient),
            diffuse: material.diffuse.unwrap_or(default.diffuse),
            specular: material.specular.unwrap_or(default.specular),
            shininess: material.shininess.unwrap_or(0.0),
            transparency: material.transparency.unwrap_or(0.0),
            texture: material.texture.clone(),
            cull_back_faces: !material.two_sided,
        }
    }
}

/// Indexed triangle geometry for one shape.
///
/// The vertex-level arrays are shared between all shapes of one mesh;
/// texture coordinates are indexed by the position indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexedTriangles {
    pub positions: Arc<Vec<Vec3>>,
    pub normals: Arc<Vec<Vec3>>,
    /// Empty when the mesh carried no texture coordinates.
    pub uvs: Arc<Vec<Vec2>>,
    pub position_indices: Vec<u32>,
    pub normal_indices: Vec<u32>,
}

impl IndexedTriangles {
    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.position_indices.len() / 3
    }

    /// Bounds of the positions referenced by this shape.
    pub fn bounds(&self) -> BBox3f {
        let mut bounds = BBox3f::EMPTY;
        for &index in &self.position_indices {
            if let Some(&p) = self.positions.get(index as usize) {
                bounds.expand_by_point(p);
            }
        }
        bounds
    }
}
