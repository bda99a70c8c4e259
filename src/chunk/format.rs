//! 3DS chunk id table.
//!
//! The ids form a fixed enumerable table that must be reproduced
//! byte-for-byte for compatibility with existing files. Unknown ids are
//! skipped over by their declared length; no other extension mechanism
//! exists in the format.

/// Size of a chunk header in bytes (u16 id + u32 length).
pub const HEADER_SIZE: u32 = 6;

// Top-level magic ids
/// Model file magic.
pub const M3D_FILE: u16 = 0x4D4D;
/// Material library file magic.
pub const MATERIAL_LIBRARY: u16 = 0x3DAA;
/// Project file magic.
pub const PROJECT_FILE: u16 = 0xC23D;

/// File format version (payload discarded).
pub const VERSION: u16 = 0x0002;

// Editor data
/// Editor data container; also accepted bare at top level.
pub const EDITOR_DATA: u16 = 0x3D3D;
/// Mesh format version (payload discarded).
pub const MESH_VERSION: u16 = 0x3D3E;
/// Uniform master scale applied at the scene root.
pub const MASTER_SCALE: u16 = 0x0100;

// Named objects and triangle meshes
pub const NAMED_OBJECT: u16 = 0x4000;
pub const TRIANGLE_MESH: u16 = 0x4100;
pub const POINT_ARRAY: u16 = 0x4110;
pub const FACE_ARRAY: u16 = 0x4120;
pub const MATERIAL_GROUP: u16 = 0x4130;
pub const TEXTURE_COORDINATES: u16 = 0x4140;
pub const SMOOTHING_GROUP: u16 = 0x4150;
pub const MESH_MATRIX: u16 = 0x4160;
pub const MESH_COLOR: u16 = 0x4165;

// Materials
pub const MATERIAL_ENTRY: u16 = 0xAFFF;
pub const MATERIAL_NAME: u16 = 0xA000;
pub const MATERIAL_AMBIENT: u16 = 0xA010;
pub const MATERIAL_DIFFUSE: u16 = 0xA020;
pub const MATERIAL_SPECULAR: u16 = 0xA030;
pub const MATERIAL_SHININESS: u16 = 0xA040;
pub const MATERIAL_TRANSPARENCY: u16 = 0xA050;
pub const MATERIAL_TWO_SIDED: u16 = 0xA081;
pub const MATERIAL_TEXMAP: u16 = 0xA200;
pub const MATERIAL_MAPNAME: u16 = 0xA300;

// Color variants nested in ambient/diffuse/specular chunks
pub const FLOAT_COLOR: u16 = 0x0010;
pub const COLOR_24: u16 = 0x0011;
pub const LINEAR_COLOR_24: u16 = 0x0012;
pub const LINEAR_FLOAT_COLOR: u16 = 0x0013;

// Percentage variants nested in shininess/transparency chunks
pub const PERCENTAGE_INT: u16 = 0x0030;
pub const PERCENTAGE_FLOAT: u16 = 0x0031;

// Keyframe hierarchy
pub const KEYFRAMER_DATA: u16 = 0xB000;
pub const OBJECT_NODE_TAG: u16 = 0xB002;
pub const NODE_HEADER: u16 = 0xB010;
pub const PIVOT: u16 = 0xB013;
pub const POSITION_TRACK: u16 = 0xB020;
pub const ROTATION_TRACK: u16 = 0xB021;
pub const SCALE_TRACK: u16 = 0xB022;
pub const NODE_ID: u16 = 0xB030;

/// Display name marking a pivot-only hierarchy node with no mesh.
pub const DUMMY_NODE_NAME: &str = "$$$DUMMY";

/// Human-readable name of a known chunk id, for logging and inspection.
pub fn chunk_name(id: u16) -> Option<&'static str> {
    Some(match id {
        M3D_FILE => "M3D_FILE",
        MATERIAL_LIBRARY => "MATERIAL_LIBRARY",
        PROJECT_FILE => "PROJECT_FILE",
        VERSION => "VERSION",
        EDITOR_DATA => "EDITOR_DATA",
        MESH_VERSION => "MESH_VERSION",
        MASTER_SCALE => "MASTER_SCALE",
        NAMED_OBJECT => "NAMED_OBJECT",
        TRIANGLE_MESH => "TRIANGLE_MESH",
        POINT_ARRAY => "POINT_ARRAY",
        FACE_ARRAY => "FACE_ARRAY",
        MATERIAL_GROUP => "MATERIAL_GROUP",
        TEXTURE_COORDINATES => "TEXTURE_COORDINATES",
        SMOOTHING_GROUP => "SMOOTHING_GROUP",
        MESH_MATRIX => "MESH_MATRIX",
        MESH_COLOR => "MESH_COLOR",
        MATERIAL_ENTRY => "MATERIAL_ENTRY",
        MATERIAL_NAME => "MATERIAL_NAME",
        MATERIAL_AMBIENT => "MATERIAL_AMBIENT",
        MATERIAL_DIFFUSE => "MATERIAL_DIFFUSE",
        MATERIAL_SPECULAR => "MATERIAL_SPECULAR",
        MATERIAL_SHININESS => "MATERIAL_SHININESS",
        MATERIAL_TRANSPARENCY => "MATERIAL_TRANSPARENCY",
        MATERIAL_TWO_SIDED => "MATERIAL_TWO_SIDED",
        MATERIAL_TEXMAP => "MATERIAL_TEXMAP",
        MATERIAL_MAPNAME => "MATERIAL_MAPNAME",
        FLOAT_COLOR => "FLOAT_COLOR",
        COLOR_24 => "COLOR_24",
        LINEAR_COLOR_24 => "LINEAR_COLOR_24",
        LINEAR_FLOAT_COLOR => "LINEAR_FLOAT_COLOR",
        PERCENTAGE_INT => "PERCENTAGE_INT",
        PERCENTAGE_FLOAT => "PERCENTAGE_FLOAT",
        KEYFRAMER_DATA => "KEYFRAMER_DATA",
        OBJECT_NODE_TAG => "OBJECT_NODE_TAG",
        NODE_HEADER => "NODE_HEADER",
        PIVOT => "PIVOT",
        POSITION_TRACK => "POSITION_TRACK",
        ROTATION_TRACK => "ROTATION_TRACK",
        SCALE_TRACK => "SCALE_TRACK",
        NODE_ID => "NODE_ID",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_ids() {
        assert_eq!(M3D_FILE, 0x4D4D);
        assert_eq!(MATERIAL_LIBRARY, 0x3DAA);
        assert_eq!(PROJECT_FILE, 0xC23D);
        assert_eq!(EDITOR_DATA, 0x3D3D);
    }

    #[test]
    fn test_chunk_names() {
        assert_eq!(chunk_name(0x4D4D), Some("M3D_FILE"));
        assert_eq!(chunk_name(0xB030), Some("NODE_ID"));
        assert_eq!(chunk_name(0xFFFF), None);
    }
}
