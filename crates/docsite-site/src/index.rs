//! Index of documented source objects.
//!
//! Pages named after a documented object (for example a page `Diffusion.md`
//! for a `Diffusion` class) get extra links to the object's header, source
//! and API docs. The index maps object names to their files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Lookup of documented objects by name.
pub trait ObjectIndex: Send + Sync {
    /// Header files declaring `name`, empty if the object is unknown.
    fn filenames(&self, name: &str) -> Vec<PathBuf>;

    /// API documentation URL for `name`.
    fn doxygen(&self, name: &str) -> Option<String>;

    /// Whether `name` is a known object.
    fn has_object(&self, name: &str) -> bool {
        !self.filenames(name).is_empty()
    }
}

/// Index without any objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoObjects;

impl ObjectIndex for NoObjects {
    fn filenames(&self, _name: &str) -> Vec<PathBuf> {
        Vec::new()
    }

    fn doxygen(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Error returned when an object index file cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// I/O error reading the file.
    #[error("Failed to read object index {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid index.
    #[error("Invalid object index {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Object entry in a [`MapObjectIndex`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ObjectEntry {
    /// Header files, the first one is linked.
    #[serde(default)]
    pub filenames: Vec<PathBuf>,
    /// API documentation URL.
    #[serde(default)]
    pub doxygen: Option<String>,
}

/// [`ObjectIndex`] backed by a map, loadable from YAML:
///
/// ```yaml
/// Diffusion:
///   filenames: [framework/include/kernels/Diffusion.h]
///   doxygen: https://example.org/doxygen/classDiffusion.html
/// ```
#[derive(Clone, Debug, Default)]
pub struct MapObjectIndex {
    objects: HashMap<String, ObjectEntry>,
}

impl MapObjectIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an index file. Relative filenames are resolved against the
    /// directory containing the file.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the file can't be read or parsed.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let text = fs::read_to_string(path).map_err(|e| IndexError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut objects: HashMap<String, ObjectEntry> =
            serde_yaml::from_str(&text).map_err(|e| IndexError::Yaml {
                path: path.to_path_buf(),
                source: e,
            })?;

        let base = path.parent().unwrap_or(Path::new(""));
        for entry in objects.values_mut() {
            for filename in &mut entry.filenames {
                if filename.is_relative() {
                    *filename = base.join(&*filename);
                }
            }
        }

        tracing::debug!(path = %path.display(), objects = objects.len(), "Loaded object index");
        Ok(Self { objects })
    }

    /// Add or replace an object.
    pub fn insert(&mut self, name: impl Into<String>, entry: ObjectEntry) {
        self.objects.insert(name.into(), entry);
    }
}

impl ObjectIndex for MapObjectIndex {
    fn filenames(&self, name: &str) -> Vec<PathBuf> {
        self.objects
            .get(name)
            .map(|entry| entry.filenames.clone())
            .unwrap_or_default()
    }

    fn doxygen(&self, name: &str) -> Option<String> {
        self.objects.get(name).and_then(|entry| entry.doxygen.clone())
    }
}
