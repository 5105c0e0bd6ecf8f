//! ROM directory collaborator.
//!
//! Lists and resolves Game Boy images under one configured directory. The
//! listing is sorted by name so repeated calls report in a stable order.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Recognised image extensions, lowercase.
const ROM_EXTENSIONS: [&str; 2] = ["gb", "gbc"];

/// One entry in a ROM directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RomEntry {
    /// File name within the ROM directory.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
}

/// A directory of ROM images.
#[derive(Debug, Clone)]
pub struct RomDir {
    root: PathBuf,
}

impl RomDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List ROM images, sorted by name. An empty directory yields an empty
    /// list; a missing one is an error.
    pub fn list(&self) -> io::Result<Vec<RomEntry>> {
        let mut entries = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !is_rom_file(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            entries.push(RomEntry {
                name: name.to_string(),
                size: entry.metadata()?.len(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Resolve a requested image against this directory.
    ///
    /// Absolute paths and paths that already resolve from the working
    /// directory pass through untouched; bare names are looked up under the
    /// ROM directory.
    #[must_use]
    pub fn resolve(&self, requested: &Path) -> PathBuf {
        if requested.is_absolute() || requested.exists() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        }
    }
}

fn is_rom_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ROM_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}
