//! Loading documents from the project through the host file system

use std::path::{Path, PathBuf};
use tracing::debug;
use trellis_common::{normalize, FileSystem};
use trellis_markup::parse;
use trellis_materializer::{DocumentLoader, LoadError};
use trellis_model::Document;

/// [`DocumentLoader`] that reads markup files below a project root
pub struct ProjectLoader<F: FileSystem> {
    fs: F,
    root: PathBuf,
}

impl<F: FileSystem> ProjectLoader<F> {
    pub fn new(fs: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    /// File system location of a project path
    pub fn file_path(&self, project_path: &str) -> Result<PathBuf, LoadError> {
        let normalized = normalize(project_path)?;
        Ok(self.root.join(normalized.trim_start_matches('/')))
    }

    pub fn exists(&self, project_path: &str) -> bool {
        self.file_path(project_path)
            .map(|path| self.fs.exists(&path))
            .unwrap_or(false)
    }

    fn read(&self, path: &Path, project_path: &str) -> Result<String, LoadError> {
        if !self.fs.exists(path) {
            return Err(LoadError::NotFound {
                path: project_path.to_string(),
            });
        }
        Ok(self.fs.read_to_string(path)?)
    }
}

impl<F: FileSystem> DocumentLoader for ProjectLoader<F> {
    fn load(&self, path: &str) -> Result<Document, LoadError> {
        let identity = normalize(path)?;
        let file = self.file_path(&identity)?;
        let text = self.read(&file, &identity)?;

        let document = parse(&text, &identity).map_err(|err| LoadError::Parse {
            path: identity.clone(),
            message: err.to_string(),
        })?;
        debug!(path = %identity, nodes = document.len(), "Loaded document");
        Ok(document)
    }
}
