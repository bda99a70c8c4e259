//! Keyframe hierarchy decoding.
//!
//! The keyframe chunk carries a flat list of named nodes. Parents always
//! precede their children in the stream; the transform tree itself is
//! rebuilt by the scene assembler from the encounter-ordered node list.
//! Only the first keyframe of each track is read: the decoder reconstructs
//! the static rest pose, not the animation.

use crate::chunk::format;
use crate::chunk::ChunkStream;
use crate::model::{HierarchyNode, Model, ROOT_NODE_ID};
use crate::util::{Error, Result};

/// Decode the KEYFRAMER_DATA container.
pub(crate) fn decode_keyframer_data(stream: &mut ChunkStream, model: &mut Model) -> Result<()> {
    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::OBJECT_NODE_TAG => decode_object_node(stream, model)?,
            _ => stream.read_until_chunk_end()?,
        }
        stream.release_chunk()?;
    }
    Ok(())
}

/// Decode one object node into `model.hierarchy`.
fn decode_object_node(stream: &mut ChunkStream, model: &mut Model) -> Result<()> {
    let mut node = HierarchyNode {
        // Older files omit NODE_ID; encounter order stands in for it
        node_id: model.hierarchy.len() as i16,
        parent_id: ROOT_NODE_ID,
        name: String::new(),
        is_mesh_group: true,
        pivot: None,
        position: None,
        rotation: None,
        scale: None,
    };

    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::NODE_ID => node.node_id = stream.read_i16()?,
            format::NODE_HEADER => {
                node.name = stream.read_string()?;
                let _flags1 = stream.read_u16()?;
                let _flags2 = stream.read_u16()?;
                node.parent_id = stream.read_i16()?;
            }
            format::PIVOT => node.pivot = Some(stream.read_vec3()?),
            format::POSITION_TRACK => {
                if begin_track(stream)? {
                    node.position = Some(stream.read_vec3()?);
                }
                stream.read_until_chunk_end()?;
            }
            format::ROTATION_TRACK => {
                if begin_track(stream)? {
                    let angle = stream.read_f32()?;
                    let axis = stream.read_vec3()?;
                    node.rotation = Some((axis, angle));
                }
                stream.read_until_chunk_end()?;
            }
            format::SCALE_TRACK => {
                if begin_track(stream)? {
                    node.scale = Some(stream.read_vec3()?);
                }
                stream.read_until_chunk_end()?;
            }
            _ => stream.read_until_chunk_end()?,
        }
        stream.release_chunk()?;
    }

    // Parents must precede their children in the stream
    if node.parent_id != ROOT_NODE_ID
        && !model.hierarchy.iter().any(|n| n.node_id == node.parent_id)
    {
        return Err(Error::InconsistentHierarchy {
            name: node.name,
            parent_id: node.parent_id,
        });
    }

    node.is_mesh_group = node.name != format::DUMMY_NODE_NAME;
    model.hierarchy.push(node);
    Ok(())
}

/// Read a track header up to the data of its first key. Returns false when
/// the track holds no keys at all; remaining keys are left for the caller
/// to discard.
fn begin_track(stream: &mut ChunkStream) -> Result<bool> {
    let _flags = stream.read_u16()?;
    let _reserved = stream.read_u32()?;
    let _reserved = stream.read_u32()?;
    let keys = stream.read_u32()?;
    if keys == 0 {
        return Ok(false);
    }

    // First key header: frame number plus optional spline parameters,
    // one float per set bit in the low bits of the spline flags
    let _frame = stream.read_u32()?;
    let spline_flags = stream.read_u16()?;
    for bit in 0..5 {
        if spline_flags & (1 << bit) != 0 {
            stream.read_f32()?;
        }
    }
    Ok(true)
}
