//! Named object and triangle mesh decoding.

use glam::{Mat4, Vec2};
use tracing::warn;

use crate::chunk::format;
use crate::chunk::ChunkStream;
use crate::model::{Face, Mesh, Model};
use crate::util::Result;

/// Decode one NAMED_OBJECT chunk. Only the triangle mesh sub-chunk is of
/// interest; cameras and lights are skipped.
pub(crate) fn decode_named_object(stream: &mut ChunkStream, model: &mut Model) -> Result<()> {
    let name = stream.read_string()?;
    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::TRIANGLE_MESH => decode_triangle_mesh(stream, model, &name)?,
            _ => stream.read_until_chunk_end()?,
        }
        stream.release_chunk()?;
    }
    Ok(())
}

fn decode_triangle_mesh(stream: &mut ChunkStream, model: &mut Model, name: &str) -> Result<()> {
    let mut mesh = Mesh { name: name.to_string(), ..Default::default() };
    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::MESH_MATRIX => mesh.transform = decode_mesh_matrix(stream, name)?,
            format::MESH_COLOR => mesh.color = Some(stream.read_u8()?),
            format::POINT_ARRAY => {
                let count = stream.read_u16()? as usize;
                let mut vertices = Vec::with_capacity(count);
                for _ in 0..count {
                    vertices.push(stream.read_vec3()?);
                }
                mesh.vertices = vertices;
            }
            format::TEXTURE_COORDINATES => {
                let count = stream.read_u16()? as usize;
                let mut coordinates = Vec::with_capacity(count);
                for _ in 0..count {
                    let u = stream.read_f32()?;
                    let v = stream.read_f32()?;
                    coordinates.push(Vec2::new(u, v));
                }
                mesh.texture_coordinates = Some(coordinates);
            }
            format::FACE_ARRAY => decode_face_array(stream, &mut mesh)?,
            _ => stream.read_until_chunk_end()?,
        }
        stream.release_chunk()?;
    }
    model.meshes.push(mesh);
    Ok(())
}

/// Read the 4x3 local transform (three axis rows plus an origin row,
/// embedded in a 4x4 with an implicit last column) and invert it. A
/// singular matrix degrades to no transform rather than failing the
/// decode.
fn decode_mesh_matrix(stream: &mut ChunkStream, name: &str) -> Result<Option<Mat4>> {
    let x_axis = stream.read_vec3()?;
    let y_axis = stream.read_vec3()?;
    let z_axis = stream.read_vec3()?;
    let origin = stream.read_vec3()?;
    let matrix = Mat4::from_cols(
        x_axis.extend(0.0),
        y_axis.extend(0.0),
        z_axis.extend(0.0),
        origin.extend(1.0),
    );
    // Small uniform scales give tiny but valid determinants; only an
    // actually non-invertible matrix is rejected
    let inverse = matrix.inverse();
    if matrix.determinant() == 0.0 || !inverse.is_finite() {
        warn!(mesh = %name, "mesh matrix is singular, ignoring local transform");
        return Ok(None);
    }
    Ok(Some(inverse))
}

/// Decode the face array plus its nested material-group and
/// smoothing-group sub-chunks.
fn decode_face_array(stream: &mut ChunkStream, mesh: &mut Mesh) -> Result<()> {
    let count = stream.read_u16()? as usize;
    let mut faces = Vec::with_capacity(count);
    for index in 0..count {
        let a = stream.read_u16()? as u32;
        let b = stream.read_u16()? as u32;
        let c = stream.read_u16()? as u32;
        let flags = stream.read_u16()?;
        faces.push(Face {
            index: index as u32,
            vertex_indices: [a, b, c],
            flags,
            material: None,
            smoothing_group: None,
            normal_indices: None,
        });
    }
    mesh.faces = faces;

    // Material assignments and smoothing masks live in the face array's
    // own sub-scope
    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::MATERIAL_GROUP => {
                let material = stream.read_string()?;
                let slot = mesh.material_slot(&material);
                let assigned = stream.read_u16()? as usize;
                for _ in 0..assigned {
                    let face_index = stream.read_u16()? as usize;
                    if let Some(face) = mesh.faces.get_mut(face_index) {
                        face.material = Some(slot);
                    }
                }
            }
            format::SMOOTHING_GROUP => {
                // One 32-bit mask per face, in face order; zero means the
                // face belongs to no group
                for face in &mut mesh.faces {
                    let mask = stream.read_u32()?;
                    face.smoothing_group = (mask != 0).then_some(mask);
                }
            }
            _ => stream.read_until_chunk_end()?,
        }
        stream.release_chunk()?;
    }
    Ok(())
}
