//! Intermediate records produced by the binary decode phase.
//!
//! These records are owned by a single decode invocation: they are filled
//! by the [`crate::decode`] dispatchers, enriched by
//! [`crate::geom::normals`], and consumed by the scene assembler. Nothing
//! here survives a failed decode.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec2, Vec3};

/// Parent id sentinel attaching a hierarchy node directly to the root.
pub const ROOT_NODE_ID: i16 = -1;

/// One decoded triangle face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Face {
    /// Original decode-order index, used as the sort tie-breaker.
    pub index: u32,
    pub vertex_indices: [u32; 3],
    /// Raw face flags word from the file; stored but otherwise unused.
    pub flags: u16,
    /// Slot into [`Mesh::material_names`].
    pub material: Option<u16>,
    /// Smoothing-group bitmask; two faces sharing a vertex smooth together
    /// when their masks share any bit.
    pub smoothing_group: Option<u32>,
    /// Per-corner indices into [`Mesh::normals`], filled by normal
    /// reconstruction.
    pub normal_indices: Option<[u32; 3]>,
}

/// One decoded triangle mesh (named object).
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub texture_coordinates: Option<Vec<Vec2>>,
    pub faces: Vec<Face>,
    /// Smoothed per-corner normals, filled by normal reconstruction.
    pub normals: Vec<Vec3>,
    /// Material names referenced by this mesh's material groups, in
    /// encounter order.
    pub material_names: Vec<String>,
    /// Optional mesh color index.
    pub color: Option<u8>,
    /// Local-to-object transform, stored already inverted. A singular
    /// matrix in the file degrades to `None`.
    pub transform: Option<Mat4>,
}

impl Mesh {
    /// Slot of `name` in [`Self::material_names`], registering it when new.
    pub fn material_slot(&mut self, name: &str) -> u16 {
        if let Some(i) = self.material_names.iter().position(|n| n == name) {
            i as u16
        } else {
            self.material_names.push(name.to_string());
            (self.material_names.len() - 1) as u16
        }
    }
}

/// One decoded material. Names are unique within a decode; a later
/// material with the same name overwrites the earlier one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Option<Vec3>,
    pub diffuse: Option<Vec3>,
    pub specular: Option<Vec3>,
    /// Shininess coefficient in 0..1.
    pub shininess: Option<f32>,
    /// Transparency coefficient in 0..1.
    pub transparency: Option<f32>,
    /// Resolved archive entry path of the texture map.
    pub texture: Option<String>,
    pub two_sided: bool,
}

/// One node of the keyframe hierarchy, in stream encounter order.
///
/// Parents always precede their children in the stream; only the first
/// keyframe of each track is retained (static rest pose).
#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyNode {
    pub node_id: i16,
    pub parent_id: i16,
    pub name: String,
    /// False for the reserved dummy name marking a pivot-only group.
    pub is_mesh_group: bool,
    pub pivot: Option<Vec3>,
    pub position: Option<Vec3>,
    /// Rotation as (axis, angle in radians).
    pub rotation: Option<(Vec3, f32)>,
    pub scale: Option<Vec3>,
}

impl HierarchyNode {
    /// Local rest-pose transform of this node.
    ///
    /// Composed as translate(position) x rotate(axis, -angle) x
    /// scale x translate(-pivot); the file stores clockwise rotations, so
    /// the angle is negated, and the pivot applies only to mesh-bearing
    /// groups. The multiplication order matches the reference geometry and
    /// must not be rearranged.
    pub fn local_transform(&self) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        if let Some(position) = self.position {
            m *= Mat4::from_translation(position);
        }
        if let Some((axis, angle)) = self.rotation {
            if axis.length_squared() > 0.0 {
                m *= Mat4::from_quat(Quat::from_axis_angle(axis.normalize(), -angle));
            }
        }
        if let Some(scale) = self.scale {
            m *= Mat4::from_scale(scale);
        }
        if self.is_mesh_group {
            if let Some(pivot) = self.pivot {
                m *= Mat4::from_translation(-pivot);
            }
        }
        m
    }
}

/// Result of a full decode: input to scene assembly.
#[derive(Clone, Debug)]
pub struct Model {
    /// Archive entry name the model was decoded from; provides the
    /// directory prefix for texture resolution.
    pub entry_name: String,
    pub meshes: Vec<Mesh>,
    pub materials: HashMap<String, Material>,
    pub hierarchy: Vec<HierarchyNode>,
    /// Uniform scale applied at the scene root, default 1.0.
    pub master_scale: f32,
}

impl Model {
    /// Create an empty model for the given archive entry.
    pub fn new(entry_name: &str) -> Self {
        Self {
            entry_name: entry_name.to_string(),
            meshes: Vec::new(),
            materials: HashMap::new(),
            hierarchy: Vec::new(),
            master_scale: 1.0,
        }
    }
}
