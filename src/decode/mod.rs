//! Table-driven recursive-descent decoding of the chunk container.
//!
//! The dispatcher loops "read header -> dispatch by id -> release" for
//! every container chunk; [`ChunkStream::release_chunk`] after each branch
//! is the single enforcement point for the byte-accounting invariant.
//! Unknown ids are skipped over their declared length, which is what gives
//! the format its forward compatibility.
//!
//! Decoding is all-or-nothing: any error discards everything accumulated
//! for the current decode and becomes the sole result.

mod hierarchy;
mod material;
mod mesh;

use tracing::{debug, trace};

use crate::archive::ModelArchive;
use crate::chunk::format::{self, chunk_name};
use crate::chunk::ChunkStream;
use crate::geom::normals;
use crate::model::Model;
use crate::util::{Error, Result};

/// Decode a complete 3DS byte buffer into intermediate records.
///
/// `entry_name` is the archive entry the buffer came from; its directory
/// prefix anchors texture map resolution. `archive` supplies the entry
/// list for that resolution and may be `None` when texture paths are not
/// wanted (map names then decode to unresolved).
///
/// This phase is fully synchronous: it runs to completion or fails, and
/// the chunk stack is never left suspended mid-chunk.
pub fn decode(data: &[u8], entry_name: &str, archive: Option<&dyn ModelArchive>) -> Result<Model> {
    let mut stream = ChunkStream::new(data);
    let mut model = Model::new(entry_name);

    let root = stream.read_chunk_header()?;
    match root.id {
        format::M3D_FILE | format::MATERIAL_LIBRARY | format::PROJECT_FILE => {
            while !stream.is_chunk_end_reached() {
                let chunk = stream.read_chunk_header()?;
                match chunk.id {
                    format::VERSION => stream.read_until_chunk_end()?,
                    format::EDITOR_DATA => decode_editor_data(&mut stream, &mut model, archive)?,
                    format::KEYFRAMER_DATA => {
                        hierarchy::decode_keyframer_data(&mut stream, &mut model)?
                    }
                    id => skip_chunk(&mut stream, id)?,
                }
                stream.release_chunk()?;
            }
        }
        // Some exporters write the editor data chunk with no magic wrapper
        format::EDITOR_DATA => decode_editor_data(&mut stream, &mut model, archive)?,
        id => return Err(Error::BadMagicNumber(id)),
    }
    stream.release_chunk()?;

    for mesh in &mut model.meshes {
        normals::reconstruct(mesh);
    }

    debug!(
        meshes = model.meshes.len(),
        materials = model.materials.len(),
        nodes = model.hierarchy.len(),
        master_scale = model.master_scale,
        "decode complete"
    );
    Ok(model)
}

/// Decode the editor data container: master scale, materials and meshes.
fn decode_editor_data(
    stream: &mut ChunkStream,
    model: &mut Model,
    archive: Option<&dyn ModelArchive>,
) -> Result<()> {
    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::MESH_VERSION => stream.read_until_chunk_end()?,
            format::MASTER_SCALE => model.master_scale = stream.read_f32()?,
            format::NAMED_OBJECT => mesh::decode_named_object(stream, model)?,
            format::MATERIAL_ENTRY => material::decode_material_entry(stream, model, archive)?,
            id => skip_chunk(stream, id)?,
        }
        stream.release_chunk()?;
    }
    Ok(())
}

/// Skip an unrecognized or intentionally ignored chunk.
fn skip_chunk(stream: &mut ChunkStream, id: u16) -> Result<()> {
    trace!(
        id = format_args!("{:#06x}", id),
        name = chunk_name(id).unwrap_or("unknown"),
        "skipping chunk"
    );
    stream.read_until_chunk_end()
}
