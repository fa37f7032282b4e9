use crate::error::CommonError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File system abstraction so document loading can be driven by the host or by tests
pub trait FileSystem {
    /// Check if a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Read a whole file as UTF-8 text
    fn read_to_string(&self, path: &Path) -> Result<String, CommonError>;
}

/// Real file system implementation
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String, CommonError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// In-memory file system for testing
#[derive(Debug, Default)]
pub struct MockFileSystem {
    pub files: HashMap<PathBuf, String>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, CommonError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| CommonError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            })
    }
}
