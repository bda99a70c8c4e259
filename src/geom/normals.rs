//! Smoothed per-corner normal reconstruction.
//!
//! Two passes are required because the blend set for a corner depends on
//! every face sharing that vertex, and those faces are not necessarily
//! contiguous in face order. The first pass accumulates an angle-weighted
//! raw normal per corner into an index-addressed arena keyed by vertex;
//! the second pass resolves the blend set per corner from that arena.

use glam::Vec3;
use smallvec::SmallVec;

use crate::model::Mesh;

/// Contributions at one vertex: (face index, smoothing mask, raw normal).
type Contributions = SmallVec<[(u32, Option<u32>, Vec3); 8]>;

/// Compute smoothed per-corner normals for `mesh`, then sort its faces
/// into contiguous material runs so the assembler can emit one shape per
/// run in a single pass.
pub fn reconstruct(mesh: &mut Mesh) {
    let vertex_count = mesh.vertices.len();
    let mut arena: Vec<Contributions> = vec![SmallVec::new(); vertex_count];
    let mut raw: Vec<[Vec3; 3]> = vec![[Vec3::ZERO; 3]; mesh.faces.len()];

    // Pass 1: angle-weighted raw normal per corner
    for (face_index, face) in mesh.faces.iter().enumerate() {
        for corner in 0..3 {
            let i0 = face.vertex_indices[corner] as usize;
            let i1 = face.vertex_indices[(corner + 1) % 3] as usize;
            let i2 = face.vertex_indices[(corner + 2) % 3] as usize;
            let (Some(&p0), Some(&p1), Some(&p2)) =
                (mesh.vertices.get(i0), mesh.vertices.get(i1), mesh.vertices.get(i2))
            else {
                continue;
            };

            let edge1 = p1 - p0;
            let edge2 = p2 - p0;
            let cross = edge1.cross(edge2);
            // Weight by the angle subtended at this corner, not by area
            let angle = cross.length().atan2(edge1.dot(edge2));
            let normal = cross.normalize_or_zero() * angle;

            raw[face_index][corner] = normal;
            arena[i0].push((face_index as u32, face.smoothing_group, normal));
        }
    }

    // Pass 2: resolve the blend set per corner
    let mut normals = Vec::with_capacity(mesh.faces.len() * 3);
    for (face_index, face) in mesh.faces.iter_mut().enumerate() {
        let mut indices = [0u32; 3];
        for corner in 0..3 {
            let vertex = face.vertex_indices[corner] as usize;
            let own = raw[face_index][corner];
            let mut sum = Vec3::ZERO;

            if let Some(contributions) = arena.get(vertex) {
                match face.smoothing_group {
                    Some(mask) => {
                        // Transitive expansion: absorb the mask of every
                        // face at this vertex sharing any bit, to fixpoint
                        let mut expanded = mask;
                        loop {
                            let before = expanded;
                            for &(_, group, _) in contributions {
                                if let Some(g) = group {
                                    if g & expanded != 0 {
                                        expanded |= g;
                                    }
                                }
                            }
                            if expanded == before {
                                break;
                            }
                        }
                        for &(_, group, normal) in contributions {
                            if group.is_some_and(|g| g & expanded != 0) {
                                sum += normal;
                            }
                        }
                    }
                    None => {
                        // Ungrouped faces blend only with other ungrouped
                        // faces facing the same way; opposed raw normals
                        // mark a crease and stay separate
                        for &(_, group, normal) in contributions {
                            if group.is_none() && normal.dot(own) >= 0.0 {
                                sum += normal;
                            }
                        }
                    }
                }
            }

            let smoothed = if sum.length_squared() > 0.0 {
                sum.normalize()
            } else {
                // Exact cancellation: fall back to the face's own raw normal
                own.normalize_or_zero()
            };
            indices[corner] = normals.len() as u32;
            normals.push(smoothed);
        }
        face.normal_indices = Some(indices);
    }
    mesh.normals = normals;

    // Contiguous material runs: no material first, then per-mesh slot
    // order, ties broken by original face index
    mesh.faces.sort_by_key(|f| match f.material {
        None => (0u8, 0u16, f.index),
        Some(slot) => (1, slot, f.index),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Face;

    fn face(index: u32, vertices: [u32; 3], smoothing_group: Option<u32>) -> Face {
        Face {
            index,
            vertex_indices: vertices,
            flags: 0,
            material: None,
            smoothing_group,
            normal_indices: None,
        }
    }

    fn corner_normal(mesh: &Mesh, face_index: usize, corner: usize) -> Vec3 {
        let indices = mesh.faces[face_index].normal_indices.unwrap();
        mesh.normals[indices[corner] as usize]
    }

    #[test]
    fn test_coplanar_fan_smooths_to_plane_normal() {
        // Fan of coplanar triangles sharing vertex 0, no smoothing groups
        let mut mesh = Mesh {
            vertices: vec![
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(-1.0, 0.0, 1.0),
            ],
            faces: vec![
                face(0, [0, 2, 1], None),
                face(1, [0, 3, 2], None),
                face(2, [0, 4, 3], None),
            ],
            ..Default::default()
        };
        reconstruct(&mut mesh);

        // The corner at the shared vertex gets the same smoothed normal on
        // every face, equal to the plane normal
        let expected = Vec3::Y;
        for face_index in 0..3 {
            let n = corner_normal(&mesh, face_index, 0);
            assert!((n - expected).length() < 1e-5, "face {face_index}: {n:?}");
        }
    }

    #[test]
    fn test_crease_not_averaged_across_opposed_normals() {
        // Two faces over the same edge with opposite winding: raw normals
        // oppose, so each side keeps its own direction
        let mut mesh = Mesh {
            vertices: vec![
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            faces: vec![face(0, [0, 2, 1], None), face(1, [0, 1, 2], None)],
            ..Default::default()
        };
        reconstruct(&mut mesh);

        let up = corner_normal(&mesh, 0, 0);
        let down = corner_normal(&mesh, 1, 0);
        assert!((up - Vec3::Y).length() < 1e-5);
        assert!((down - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_smoothing_groups_blend_when_sharing_bits() {
        // A ridge of two faces; separate groups keep the crease, a shared
        // bit smooths across it
        let vertices = vec![
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        ];

        let mut creased = Mesh {
            vertices: vertices.clone(),
            faces: vec![face(0, [0, 1, 2], Some(1)), face(1, [1, 3, 2], Some(2))],
            ..Default::default()
        };
        reconstruct(&mut creased);
        let left = corner_normal(&creased, 0, 1);
        let right = corner_normal(&creased, 1, 0);
        assert!((left - right).length() > 1e-3);

        let mut smoothed = Mesh {
            vertices,
            faces: vec![face(0, [0, 1, 2], Some(1)), face(1, [1, 3, 2], Some(3))],
            ..Default::default()
        };
        reconstruct(&mut smoothed);
        let left = corner_normal(&smoothed, 0, 1);
        let right = corner_normal(&smoothed, 1, 0);
        assert!((left - right).length() < 1e-5);
    }

    #[test]
    fn test_transitive_mask_expansion() {
        // Groups 1 and 4 share no bit, but group 5 overlaps both: all
        // three faces at the shared vertex blend together
        let vertices = vec![
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 1.0),
            Vec3::new(-0.5, 0.5, 1.0),
            Vec3::new(-1.0, 0.0, 0.0),
        ];
        let mut mesh = Mesh {
            vertices,
            faces: vec![
                face(0, [0, 2, 1], Some(1)),
                face(1, [0, 3, 2], Some(5)),
                face(2, [0, 4, 3], Some(4)),
            ],
            ..Default::default()
        };
        reconstruct(&mut mesh);

        let a = corner_normal(&mesh, 0, 0);
        let c = corner_normal(&mesh, 2, 0);
        // Faces 0 and 2 share no smoothing bit directly, yet resolve to
        // the same blended normal through face 1
        assert!((a - c).length() < 1e-5);
    }

    #[test]
    fn test_faces_sorted_into_material_runs() {
        let mut mesh = Mesh {
            vertices: vec![
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            faces: vec![
                face(0, [0, 2, 1], None),
                face(1, [0, 2, 1], None),
                face(2, [0, 2, 1], None),
                face(3, [0, 2, 1], None),
            ],
            ..Default::default()
        };
        mesh.material_names = vec!["a".to_string(), "b".to_string()];
        mesh.faces[0].material = Some(1);
        mesh.faces[2].material = Some(0);
        mesh.faces[3].material = Some(0);
        reconstruct(&mut mesh);

        let order: Vec<_> = mesh.faces.iter().map(|f| (f.material, f.index)).collect();
        assert_eq!(
            order,
            vec![(None, 1), (Some(0), 2), (Some(0), 3), (Some(1), 0)]
        );
    }
}
