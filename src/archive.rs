//! Archive collaborator boundary.
//!
//! The decoder receives its raw bytes from some container (a zip-like
//! archive, a directory, an in-memory map) and only needs two things from
//! it: raw bytes by entry name, and the entry name list for texture map
//! resolution. Texture image decoding itself is out of scope.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::util::{Error, Result};

/// Access to the container a model is loaded from.
pub trait ModelArchive {
    /// Raw bytes of a named entry.
    fn read_entry(&self, name: &str) -> Result<Vec<u8>>;

    /// All entry names in the archive, using `/` separators.
    fn entry_names(&self) -> Vec<String>;
}

/// Resolve a texture map name against the archive entry list.
///
/// The candidate path is the map name prefixed with the directory of the
/// model entry itself. An exact match wins; otherwise the first
/// case-insensitive match is taken (3DS map names are frequently stored
/// upper-cased). Returns `None` when nothing matches.
pub fn resolve_entry(
    archive: &dyn ModelArchive,
    entry_name: &str,
    map_name: &str,
) -> Option<String> {
    let prefix = match entry_name.rfind('/') {
        Some(i) => &entry_name[..=i],
        None => "",
    };
    let candidate = format!("{prefix}{map_name}");
    let names = archive.entry_names();
    if names.iter().any(|n| n == &candidate) {
        return Some(candidate);
    }
    names.into_iter().find(|n| n.eq_ignore_ascii_case(&candidate))
}

/// In-memory archive backed by a name -> bytes map.
#[derive(Clone, Debug, Default)]
pub struct MemoryArchive {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.entries.insert(name.into(), data);
    }
}

impl ModelArchive for MemoryArchive {
    fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))
    }

    fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Filesystem-backed archive rooted at a directory.
#[derive(Clone, Debug)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collect_names(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) {
        let Ok(entries) = fs::read_dir(dir) else { return };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if path.is_dir() {
                self.collect_names(&path, &format!("{prefix}{name}/"), out);
            } else {
                out.push(format!("{prefix}{name}"));
            }
        }
    }
}

impl ModelArchive for DirectoryArchive {
    fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::EntryNotFound(name.to_string())
            } else {
                Error::Io(e)
            }
        })
    }

    fn entry_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&self.root, "", &mut names);
        names.sort();
        names
    }
}
