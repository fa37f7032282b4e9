use crate::error::LoadError;
use std::collections::HashMap;
use trellis_model::Document;

/// Resolves a project path to the Document stored there
pub trait DocumentLoader {
    fn load(&self, path: &str) -> Result<Document, LoadError>;
}

/// Loader over documents already held in memory, keyed by identity
#[derive(Debug, Default, Clone)]
pub struct InMemoryLoader {
    documents: HashMap<String, Document>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: Document) {
        self.documents
            .insert(document.identity().to_string(), document);
    }

    pub fn with(mut self, document: Document) -> Self {
        self.insert(document);
        self
    }
}

impl DocumentLoader for InMemoryLoader {
    fn load(&self, path: &str) -> Result<Document, LoadError> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                path: path.to_string(),
            })
    }
}
