use crate::live::LiveId;
use thiserror::Error;
use trellis_common::CommonError;
use trellis_model::ModelError;

pub type MaterializeResult<T> = Result<T, MaterializeError>;

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Circular template inclusion of '{path}'\nInclusion chain: {}", chain.join(" → "))]
    CircularInclusion { path: String, chain: Vec<String> },

    #[error("Live node {id} does not exist in the target tree")]
    InvalidTarget { id: LiveId },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Failure to produce the Document behind a project path
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Document not found: {path}")]
    NotFound { path: String },

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] CommonError),
}
