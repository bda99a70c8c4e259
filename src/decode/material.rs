//! Material entry decoding.

use glam::Vec3;
use tracing::warn;

use crate::archive::{resolve_entry, ModelArchive};
use crate::chunk::format;
use crate::chunk::ChunkStream;
use crate::model::{Material, Model};
use crate::util::{Error, Result};

/// Decode one MATERIAL_ENTRY chunk into `model.materials`.
///
/// A later material with the same name overwrites the earlier one.
pub(crate) fn decode_material_entry(
    stream: &mut ChunkStream,
    model: &mut Model,
    archive: Option<&dyn ModelArchive>,
) -> Result<()> {
    let mut material = Material::default();
    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::MATERIAL_NAME => material.name = stream.read_string()?,
            format::MATERIAL_AMBIENT => {
                material.ambient = Some(decode_color(stream, chunk.id)?);
            }
            format::MATERIAL_DIFFUSE => {
                material.diffuse = Some(decode_color(stream, chunk.id)?);
            }
            format::MATERIAL_SPECULAR => {
                material.specular = Some(decode_color(stream, chunk.id)?);
            }
            format::MATERIAL_SHININESS => {
                material.shininess = Some(decode_percentage(stream, chunk.id)?);
            }
            format::MATERIAL_TRANSPARENCY => {
                material.transparency = Some(decode_percentage(stream, chunk.id)?);
            }
            format::MATERIAL_TWO_SIDED => {
                // Presence-only flag; any payload is irrelevant
                material.two_sided = true;
                stream.read_until_chunk_end()?;
            }
            format::MATERIAL_TEXMAP => {
                material.texture = decode_texture_map(stream, &model.entry_name, archive)?;
            }
            _ => stream.read_until_chunk_end()?,
        }
        stream.release_chunk()?;
    }
    model.materials.insert(material.name.clone(), material);
    Ok(())
}

/// Decode a color slot chunk holding one or more color variant sub-chunks.
///
/// When both a linear and a plain variant are present for the same slot,
/// the linear one wins and the plain one is ignored. A slot closing with
/// no variant at all is [`Error::MissingRequiredValue`].
fn decode_color(stream: &mut ChunkStream, slot_id: u16) -> Result<Vec3> {
    let mut color = None;
    let mut linear = false;
    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::LINEAR_COLOR_24 => {
                color = Some(read_color_24(stream)?);
                linear = true;
            }
            format::COLOR_24 => {
                let c = read_color_24(stream)?;
                if !linear {
                    color = Some(c);
                }
            }
            format::LINEAR_FLOAT_COLOR => {
                color = Some(stream.read_vec3()?);
                linear = true;
            }
            format::FLOAT_COLOR => {
                let c = stream.read_vec3()?;
                if !linear {
                    color = Some(c);
                }
            }
            _ => stream.read_until_chunk_end()?,
        }
        stream.release_chunk()?;
    }
    color.ok_or(Error::MissingRequiredValue { id: slot_id })
}

/// Three bytes, each scaled to 0..1.
fn read_color_24(stream: &mut ChunkStream) -> Result<Vec3> {
    let r = stream.read_u8()? as f32 / 255.0;
    let g = stream.read_u8()? as f32 / 255.0;
    let b = stream.read_u8()? as f32 / 255.0;
    Ok(Vec3::new(r, g, b))
}

/// Decode a percentage chunk: a 16-bit integer scaled by 1/100 or a raw
/// float, whichever variant is present.
fn decode_percentage(stream: &mut ChunkStream, slot_id: u16) -> Result<f32> {
    let mut value = None;
    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::PERCENTAGE_INT => value = Some(stream.read_i16()? as f32 / 100.0),
            format::PERCENTAGE_FLOAT => value = Some(stream.read_f32()?),
            _ => stream.read_until_chunk_end()?,
        }
        stream.release_chunk()?;
    }
    value.ok_or(Error::MissingRequiredValue { id: slot_id })
}

/// Decode a texture map chunk and resolve its map name against the
/// archive entry list. An unresolvable name is tolerated and yields no
/// texture.
fn decode_texture_map(
    stream: &mut ChunkStream,
    entry_name: &str,
    archive: Option<&dyn ModelArchive>,
) -> Result<Option<String>> {
    let mut map_name = None;
    while !stream.is_chunk_end_reached() {
        let chunk = stream.read_chunk_header()?;
        match chunk.id {
            format::MATERIAL_MAPNAME => map_name = Some(stream.read_string()?),
            _ => stream.read_until_chunk_end()?,
        }
        stream.release_chunk()?;
    }

    let Some(map_name) = map_name else { return Ok(None) };
    let Some(archive) = archive else {
        warn!(map = %map_name, "no archive available, texture left unresolved");
        return Ok(None);
    };
    let resolved = resolve_entry(archive, entry_name, &map_name);
    if resolved.is_none() {
        warn!(map = %map_name, "texture entry not found in archive");
    }
    Ok(resolved)
}
