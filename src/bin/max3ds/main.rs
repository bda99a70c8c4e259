//! max3ds CLI - Tool for inspecting 3DS model files.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use max3ds::archive::{DirectoryArchive, ModelArchive};
use max3ds::scene::{Scene, SceneChild};
use max3ds::{build_scene, decode, Result};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "warn";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    if filtered_args.len() < 2 {
        print_usage(&args[0]);
        return ExitCode::FAILURE;
    }

    let result = match filtered_args[0] {
        "info" | "i" => cmd_info(filtered_args[1]),
        "tree" | "t" => cmd_tree(filtered_args[1]),
        "materials" | "m" => cmd_materials(filtered_args[1]),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&args[0]);
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage(program: &str) {
    println!(
        "max3ds - 3D Studio (.3ds) model inspector (built {})",
        env!("MAX3DS_BUILD_DATE")
    );
    println!();
    println!("Usage: {} [flags] <command> <file.3ds>", program);
    println!();
    println!("Commands:");
    println!("  info, i       Summary of meshes, materials and hierarchy");
    println!("  tree, t       Print the assembled scene tree");
    println!("  materials, m  List decoded materials");
    println!();
    println!("Flags:");
    println!("  -v, --verbose   Debug logging");
    println!("  -vv, --trace    Trace logging (per-chunk)");
    println!("  -q, --quiet     Errors only");
}

/// Directory-backed archive rooted next to the file, so texture maps
/// sitting beside the model resolve.
fn open(path: &str) -> Result<(DirectoryArchive, String, Vec<u8>)> {
    let path = Path::new(path);
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    let entry = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let archive = DirectoryArchive::new(root);
    let data = archive.read_entry(&entry)?;
    Ok((archive, entry, data))
}

fn cmd_info(path: &str) -> Result<()> {
    let (archive, entry, data) = open(path)?;
    let model = decode(&data, &entry, Some(&archive))?;

    println!("File: {} ({} bytes)", path, data.len());
    println!("Master scale: {}", model.master_scale);
    println!("Meshes: {}", model.meshes.len());
    for mesh in &model.meshes {
        println!(
            "  {} - {} vertices, {} faces{}",
            mesh.name,
            mesh.vertices.len(),
            mesh.faces.len(),
            if mesh.texture_coordinates.is_some() { ", textured" } else { "" }
        );
    }
    println!("Materials: {}", model.materials.len());
    println!("Hierarchy nodes: {}", model.hierarchy.len());
    Ok(())
}

fn cmd_tree(path: &str) -> Result<()> {
    let (archive, entry, data) = open(path)?;
    let scene = build_scene(&data, &entry, Some(&archive))?;
    print_group(&scene, scene.root, 0);
    if !scene.shared.is_empty() {
        println!("shared:");
        for shared in &scene.shared {
            println!("  [{}] {} shapes", shared.name, shared.shapes.len());
        }
    }
    Ok(())
}

fn print_group(scene: &Scene, group: usize, depth: usize) {
    let g = &scene.groups[group];
    let name = g.name.as_deref().unwrap_or("(group)");
    println!("{}{}", "  ".repeat(depth), name);
    for child in &g.children {
        match child {
            SceneChild::Group(id) => print_group(scene, *id, depth + 1),
            SceneChild::Shape(shape) => println!(
                "{}shape {} ({} triangles)",
                "  ".repeat(depth + 1),
                shape.name.as_deref().unwrap_or(""),
                shape.geometry.triangle_count()
            ),
            SceneChild::SharedLink(id) => {
                println!("{}link -> {}", "  ".repeat(depth + 1), scene.shared[*id].name)
            }
        }
    }
}

fn cmd_materials(path: &str) -> Result<()> {
    let (archive, entry, data) = open(path)?;
    let model = decode(&data, &entry, Some(&archive))?;

    let mut names: Vec<_> = model.materials.keys().collect();
    names.sort();
    for name in names {
        let m = &model.materials[name];
        println!("{}", name);
        if let Some(c) = m.ambient {
            println!("  ambient:      {:.3} {:.3} {:.3}", c.x, c.y, c.z);
        }
        if let Some(c) = m.diffuse {
            println!("  diffuse:      {:.3} {:.3} {:.3}", c.x, c.y, c.z);
        }
        if let Some(c) = m.specular {
            println!("  specular:     {:.3} {:.3} {:.3}", c.x, c.y, c.z);
        }
        if let Some(s) = m.shininess {
            println!("  shininess:    {:.3}", s);
        }
        if let Some(t) = m.transparency {
            println!("  transparency: {:.3}", t);
        }
        if let Some(t) = &m.texture {
            println!("  texture:      {}", t);
        }
        if m.two_sided {
            println!("  two-sided");
        }
    }
    Ok(())
}
