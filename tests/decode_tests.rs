//! Integration tests over synthetic 3DS chunk streams.

use std::sync::Arc;
use std::time::Duration;

use glam::{Mat4, Vec3};
use max3ds::archive::MemoryArchive;
use max3ds::model::Model;
use max3ds::scene::builder::SceneBuild;
use max3ds::scene::{Appearance, SceneChild};
use max3ds::{build_scene, decode, Error};

// ============================================================================
// Stream construction helpers
// ============================================================================

/// Wrap a payload in a chunk header.
fn chunk(id: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(6 + payload.len());
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32 + 6).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn cstr(s: &str) -> Vec<u8> {
    let mut out = s.as_bytes().to_vec();
    out.push(0);
    out
}

fn u16s(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn f32s(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn point_array(points: &[[f32; 3]]) -> Vec<u8> {
    let mut payload = u16s(&[points.len() as u16]);
    for p in points {
        payload.extend(f32s(p));
    }
    chunk(0x4110, &payload)
}

fn face_array(faces: &[[u16; 3]], nested: &[u8]) -> Vec<u8> {
    let mut payload = u16s(&[faces.len() as u16]);
    for f in faces {
        payload.extend(u16s(&[f[0], f[1], f[2], 0]));
    }
    payload.extend_from_slice(nested);
    chunk(0x4120, &payload)
}

fn named_object(name: &str, mesh_chunks: &[u8]) -> Vec<u8> {
    let mut payload = cstr(name);
    payload.extend_from_slice(&chunk(0x4100, mesh_chunks));
    chunk(0x4000, &payload)
}

fn model_file(editor_chunks: &[u8], keyframe_chunks: Option<&[u8]>) -> Vec<u8> {
    let mut payload = chunk(0x3D3D, editor_chunks);
    if let Some(kf) = keyframe_chunks {
        payload.extend_from_slice(&chunk(0xB000, kf));
    }
    chunk(0x4D4D, &payload)
}

/// A track chunk holding one key with the given values.
fn track(id: u16, values: &[f32]) -> Vec<u8> {
    let mut payload = u16s(&[0]); // track flags
    payload.extend_from_slice(&[0; 8]); // reserved
    payload.extend_from_slice(&1u32.to_le_bytes()); // key count
    payload.extend_from_slice(&0u32.to_le_bytes()); // frame number
    payload.extend(u16s(&[0])); // spline flags
    payload.extend(f32s(values));
    chunk(id, &payload)
}

fn object_node(
    node_id: i16,
    parent_id: i16,
    name: &str,
    position: Option<[f32; 3]>,
    pivot: Option<[f32; 3]>,
) -> Vec<u8> {
    let mut payload = chunk(0xB030, &node_id.to_le_bytes());
    let mut header = cstr(name);
    header.extend(u16s(&[0, 0]));
    header.extend_from_slice(&parent_id.to_le_bytes());
    payload.extend_from_slice(&chunk(0xB010, &header));
    if let Some(p) = pivot {
        payload.extend_from_slice(&chunk(0xB013, &f32s(&p)));
    }
    if let Some(p) = position {
        payload.extend_from_slice(&track(0xB020, &p));
    }
    chunk(0xB002, &payload)
}

/// Unit cube around the origin: 8 vertices, 12 triangles.
fn cube_object(name: &str) -> Vec<u8> {
    let vertices: Vec<[f32; 3]> = (0..8)
        .map(|i| {
            [
                if i & 1 != 0 { 1.0 } else { -1.0 },
                if i & 2 != 0 { 1.0 } else { -1.0 },
                if i & 4 != 0 { 1.0 } else { -1.0 },
            ]
        })
        .collect();
    let faces: [[u16; 3]; 12] = [
        [0, 2, 1], [1, 2, 3], // z = -1
        [4, 5, 6], [5, 7, 6], // z = +1
        [0, 1, 4], [1, 5, 4], // y = -1
        [2, 6, 3], [3, 6, 7], // y = +1
        [0, 4, 2], [2, 4, 6], // x = -1
        [1, 3, 5], [3, 7, 5], // x = +1
    ];
    let mut mesh_chunks = point_array(&vertices);
    mesh_chunks.extend_from_slice(&face_array(&faces, &[]));
    named_object(name, &mesh_chunks)
}

fn decode_model(data: &[u8]) -> Result<Model, Error> {
    decode(data, "test.3ds", None)
}

// ============================================================================
// Container and dispatcher
// ============================================================================

#[test]
fn decodes_minimal_cube_model() {
    let data = model_file(&cube_object("Box"), None);
    let model = decode_model(&data).unwrap();

    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.master_scale, 1.0);
    let mesh = &model.meshes[0];
    assert_eq!(mesh.name, "Box");
    assert_eq!(mesh.vertices.len(), 8);
    assert_eq!(mesh.faces.len(), 12);
    assert_eq!(mesh.normals.len(), 36);
}

#[test]
fn cube_scene_has_default_appearance_and_exact_bounds() {
    let data = model_file(&cube_object("Box"), None);
    let scene = build_scene(&data, "test.3ds", None).unwrap();

    assert_eq!(scene.shape_count(), 1);
    let shape = scene.shapes().next().unwrap();
    assert!(Arc::ptr_eq(&shape.appearance, &Appearance::default_shared()));
    assert_eq!(shape.geometry.triangle_count(), 12);

    let bounds = shape.geometry.bounds();
    assert_eq!(bounds.min, Vec3::splat(-1.0));
    assert_eq!(bounds.max, Vec3::splat(1.0));
}

#[test]
fn accepts_bare_editor_data_without_magic() {
    let data = chunk(0x3D3D, &cube_object("Box"));
    let model = decode_model(&data).unwrap();
    assert_eq!(model.meshes.len(), 1);
}

#[test]
fn rejects_unknown_magic() {
    let data = chunk(0x1234, &[]);
    assert!(matches!(decode_model(&data), Err(Error::BadMagicNumber(0x1234))));
}

#[test]
fn skips_unknown_chunks() {
    let mut editor = chunk(0x7777, &[1, 2, 3, 4, 5]);
    editor.extend_from_slice(&cube_object("Box"));
    let data = model_file(&editor, None);
    assert_eq!(decode_model(&data).unwrap().meshes.len(), 1);
}

#[test]
fn reads_master_scale() {
    let mut editor = chunk(0x0100, &1.25f32.to_le_bytes());
    editor.extend_from_slice(&cube_object("Box"));
    let data = model_file(&editor, None);
    assert_eq!(decode_model(&data).unwrap().master_scale, 1.25);
}

#[test]
fn padded_chunk_length_is_a_mismatch() {
    let mut scale = chunk(0x0100, &1.0f32.to_le_bytes());
    scale[2] = 12; // declared 12, actual 10
    let mut editor = scale;
    editor.extend_from_slice(&[0, 0]); // padding bytes the chunk claims
    let data = model_file(&editor, None);
    assert!(matches!(
        decode_model(&data),
        Err(Error::ChunkLengthMismatch { id: 0x0100, expected: 12, actual: 10 })
    ));
}

#[test]
fn truncated_buffer_is_eof() {
    let data = model_file(&cube_object("Box"), None);
    let truncated = &data[..data.len() - 10];
    assert!(matches!(decode_model(truncated), Err(Error::UnexpectedEof(_))));
}

// ============================================================================
// Materials
// ============================================================================

fn color_24(id: u16, rgb: [u8; 3]) -> Vec<u8> {
    chunk(id, &rgb)
}

fn material_entry(name: &str, body: &[u8]) -> Vec<u8> {
    let mut payload = chunk(0xA000, &cstr(name));
    payload.extend_from_slice(body);
    chunk(0xAFFF, &payload)
}

#[test]
fn linear_color_wins_over_plain() {
    // Plain first, linear second
    let mut diffuse = color_24(0x0011, [255, 0, 0]);
    diffuse.extend_from_slice(&color_24(0x0012, [0, 255, 0]));
    let entry = material_entry("paint", &chunk(0xA020, &diffuse));
    let data = model_file(&entry, None);
    let model = decode_model(&data).unwrap();
    assert_eq!(model.materials["paint"].diffuse, Some(Vec3::new(0.0, 1.0, 0.0)));

    // Linear first, plain second: linear still wins
    let mut diffuse = color_24(0x0012, [0, 255, 0]);
    diffuse.extend_from_slice(&color_24(0x0011, [255, 0, 0]));
    let entry = material_entry("paint", &chunk(0xA020, &diffuse));
    let data = model_file(&entry, None);
    let model = decode_model(&data).unwrap();
    assert_eq!(model.materials["paint"].diffuse, Some(Vec3::new(0.0, 1.0, 0.0)));
}

#[test]
fn empty_color_chunk_is_missing_value() {
    let entry = material_entry("paint", &chunk(0xA020, &[]));
    let data = model_file(&entry, None);
    assert!(matches!(
        decode_model(&data),
        Err(Error::MissingRequiredValue { id: 0xA020 })
    ));
}

#[test]
fn empty_percentage_chunk_is_missing_value() {
    let entry = material_entry("dull", &chunk(0xA040, &[]));
    let data = model_file(&entry, None);
    assert!(matches!(
        decode_model(&data),
        Err(Error::MissingRequiredValue { id: 0xA040 })
    ));
}

#[test]
fn percentage_variants() {
    let shininess = chunk(0xA040, &chunk(0x0030, &25i16.to_le_bytes()));
    let transparency = chunk(0xA050, &chunk(0x0031, &0.75f32.to_le_bytes()));
    let mut body = shininess;
    body.extend_from_slice(&transparency);
    body.extend_from_slice(&chunk(0xA081, &[])); // two-sided flag
    let entry = material_entry("glass", &body);
    let data = model_file(&entry, None);

    let model = decode_model(&data).unwrap();
    let glass = &model.materials["glass"];
    assert_eq!(glass.shininess, Some(0.25));
    assert_eq!(glass.transparency, Some(0.75));
    assert!(glass.two_sided);
}

#[test]
fn texture_map_resolves_case_insensitively() {
    let texmap = chunk(0xA200, &chunk(0xA300, &cstr("WOOD.JPG")));
    let entry = material_entry("oak", &texmap);
    let data = model_file(&entry, None);

    let mut archive = MemoryArchive::new();
    archive.insert("models/wood.jpg", vec![0]);
    let model = decode(&data, "models/box.3ds", Some(&archive)).unwrap();
    assert_eq!(model.materials["oak"].texture, Some("models/wood.jpg".to_string()));
}

#[test]
fn unresolved_texture_is_tolerated() {
    let texmap = chunk(0xA200, &chunk(0xA300, &cstr("missing.jpg")));
    let entry = material_entry("oak", &texmap);
    let data = model_file(&entry, None);

    let archive = MemoryArchive::new();
    let model = decode(&data, "box.3ds", Some(&archive)).unwrap();
    assert_eq!(model.materials["oak"].texture, None);
}

#[test]
fn material_groups_split_shapes_by_run() {
    let mut red_group = cstr("red");
    red_group.extend(u16s(&[2, 0, 2])); // faces 0 and 2
    let mut blue_group = cstr("blue");
    blue_group.extend(u16s(&[1, 1])); // face 1
    let mut nested = chunk(0x4130, &red_group);
    nested.extend_from_slice(&chunk(0x4130, &blue_group));

    let points: Vec<[f32; 3]> = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
    ];
    let faces: [[u16; 3]; 4] = [[0, 2, 1], [1, 2, 3], [0, 1, 3], [0, 3, 2]];
    let mut mesh_chunks = point_array(&points);
    mesh_chunks.extend_from_slice(&face_array(&faces, &nested));

    let mut editor = material_entry("red", &[]);
    editor.extend_from_slice(&material_entry("blue", &[]));
    editor.extend_from_slice(&named_object("quad", &mesh_chunks));
    let data = model_file(&editor, None);

    let scene = build_scene(&data, "test.3ds", None).unwrap();
    // Runs: unassigned face 3, then "red" faces 0+2, then "blue" face 1
    assert_eq!(scene.shape_count(), 3);
    let triangles: Vec<usize> =
        scene.shapes().map(|s| s.geometry.triangle_count()).collect();
    assert_eq!(triangles, vec![1, 2, 1]);
    assert!(Arc::ptr_eq(
        &scene.shapes().next().unwrap().appearance,
        &Appearance::default_shared()
    ));
}

// ============================================================================
// Mesh matrix
// ============================================================================

#[test]
fn mesh_matrix_is_inverted() {
    // Identity axes with origin (1, 2, 3)
    let matrix = f32s(&[
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 2.0, 3.0,
    ]);
    let mut mesh_chunks = chunk(0x4160, &matrix);
    mesh_chunks.extend_from_slice(&point_array(&[[0.0; 3]]));
    let data = model_file(&named_object("m", &mesh_chunks), None);

    let model = decode_model(&data).unwrap();
    let expected = Mat4::from_translation(Vec3::new(-1.0, -2.0, -3.0));
    let transform = model.meshes[0].transform.unwrap();
    assert!(transform.abs_diff_eq(expected, 1e-6), "{transform:?}");
}

#[test]
fn small_scale_mesh_matrix_still_inverts() {
    // A uniform scale of 0.004 has a determinant near 6.4e-8; tiny, but
    // the matrix is perfectly invertible and must not be dropped
    let s = 0.004f32;
    let matrix = f32s(&[
        s, 0.0, 0.0, //
        0.0, s, 0.0, //
        0.0, 0.0, s, //
        0.0, 0.0, 0.0,
    ]);
    let mesh_chunks = chunk(0x4160, &matrix);
    let data = model_file(&named_object("m", &mesh_chunks), None);

    let model = decode_model(&data).unwrap();
    let transform = model.meshes[0].transform.expect("invertible matrix was dropped");
    let expected = Mat4::from_scale(Vec3::splat(1.0 / s));
    assert!(transform.abs_diff_eq(expected, 1e-2), "{transform:?}");
}

#[test]
fn singular_mesh_matrix_degrades_to_none() {
    let matrix = f32s(&[0.0; 12]);
    let mesh_chunks = chunk(0x4160, &matrix);
    let data = model_file(&named_object("m", &mesh_chunks), None);
    let model = decode_model(&data).unwrap();
    assert_eq!(model.meshes[0].transform, None);
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn dummy_pivot_group_with_two_mesh_children() {
    let mut editor = cube_object("A");
    editor.extend_from_slice(&cube_object("B"));

    let mut keyframe = object_node(0, -1, "$$$DUMMY", Some([0.0, 2.0, 0.0]), None);
    keyframe.extend_from_slice(&object_node(1, 0, "A", None, None));
    keyframe.extend_from_slice(&object_node(2, 0, "B", Some([5.0, 0.0, 0.0]), None));

    let data = model_file(&editor, Some(&keyframe));
    let model = decode_model(&data).unwrap();
    assert_eq!(model.hierarchy.len(), 3);
    assert!(!model.hierarchy[0].is_mesh_group);

    let scene = build_scene(&data, "test.3ds", None).unwrap();
    // groups: root, dummy, A, B
    assert_eq!(scene.groups.len(), 4);
    let dummy = &scene.groups[1];
    assert_eq!(dummy.name.as_deref(), Some("$$$DUMMY"));
    assert_eq!(dummy.transform, Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));
    // Both children hang off the dummy and inherit its transform
    assert_eq!(
        dummy
            .children
            .iter()
            .filter(|c| matches!(c, SceneChild::Group(_)))
            .count(),
        2
    );
    // The dummy itself carries no shapes
    assert!(dummy.children.iter().all(|c| matches!(c, SceneChild::Group(_))));
    assert_eq!(scene.shape_count(), 2);
    assert_eq!(
        scene.groups[3].transform,
        Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0))
    );
}

#[test]
fn forward_parent_reference_is_inconsistent() {
    let keyframe = object_node(0, 5, "A", None, None);
    let data = model_file(&cube_object("A"), Some(&keyframe));
    assert!(matches!(
        decode_model(&data),
        Err(Error::InconsistentHierarchy { parent_id: 5, .. })
    ));
}

#[test]
fn failed_decode_discards_all_meshes() {
    let mut editor = cube_object("A");
    editor.extend_from_slice(&material_entry("broken", &chunk(0xA020, &[])));
    let data = model_file(&editor, None);
    // The mesh decoded fine before the material fault, but the error is
    // the sole result
    assert!(decode_model(&data).is_err());
}

#[test]
fn mesh_referenced_by_two_nodes_is_shared() {
    let mut keyframe = object_node(0, -1, "Box", None, None);
    keyframe.extend_from_slice(&object_node(1, -1, "Box", Some([3.0, 0.0, 0.0]), None));

    let data = model_file(&cube_object("Box"), Some(&keyframe));
    let scene = build_scene(&data, "test.3ds", None).unwrap();

    assert_eq!(scene.shared.len(), 1);
    assert_eq!(scene.shared[0].shapes.len(), 1);
    let links: Vec<_> = scene
        .groups
        .iter()
        .flat_map(|g| &g.children)
        .filter(|c| matches!(c, SceneChild::SharedLink(0)))
        .collect();
    assert_eq!(links.len(), 2);
    // Geometry is stored once
    assert_eq!(scene.shape_count(), 1);
}

// ============================================================================
// Build modes
// ============================================================================

#[test]
fn incremental_build_produces_identical_scene() {
    let mut editor = cube_object("A");
    editor.extend_from_slice(&cube_object("B"));
    editor.extend_from_slice(&cube_object("C"));
    let data = model_file(&editor, None);

    let synchronous = build_scene(&data, "test.3ds", None).unwrap();

    let model = decode_model(&data).unwrap();
    let mut build = SceneBuild::new(model);
    assert_eq!(build.total(), 3);
    let mut steps = 0;
    while build.step() {
        steps += 1;
    }
    assert_eq!(steps, 2); // third step reports completion
    assert_eq!(build.built(), 3);
    assert_eq!(build.finish(), synchronous);

    // Sliced pumping produces the same graph too
    let model = decode_model(&data).unwrap();
    let mut build = SceneBuild::new(model);
    while build.step_for(Duration::from_millis(10)) {}
    assert_eq!(build.finish(), synchronous);
}
