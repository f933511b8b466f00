//! Source provider abstraction for filesystem-independent loading.
//!
//! The [`SourceProvider`] trait abstracts file enumeration and reading so the
//! loader can run against a real source tree or an in-memory fixture.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File I/O used by the load pipeline.
pub trait SourceProvider {
    /// Read the full text of one source file.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// Every file under `root`, recursively, in a stable order.
    fn list_sources(&self, root: &Path) -> Result<Vec<PathBuf>, std::io::Error>;
}

/// Default provider backed by `std::fs`.
pub struct FileSystemProvider;

impl FileSystemProvider {
    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .map(|e| e.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        entries.sort();
        for path in entries {
            if path.is_dir() {
                Self::walk(&path, out)?;
            } else {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }

    fn list_sources(&self, root: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
        if root.is_file() {
            return Ok(vec![root.to_owned()]);
        }
        let mut out = Vec::new();
        Self::walk(root, &mut out)?;
        Ok(out)
    }
}

/// In-memory source provider for tests and embedding.
#[derive(Default)]
pub struct InMemoryProvider {
    files: BTreeMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(Self::normalize_path(&path.into()), text.into());
        self
    }

    /// Resolve `.` and `..` components without touching the filesystem.
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                std::path::Component::CurDir => {}
                std::path::Component::ParentDir => {
                    components.pop();
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = Self::normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }

    fn list_sources(&self, root: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
        let root = Self::normalize_path(root);
        let found: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|k| k.starts_with(&root))
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no sources under {}", root.display()),
            ));
        }
        Ok(found)
    }
}
