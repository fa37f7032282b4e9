//! Error types for the editor

use crate::mutations::MutationError;
use thiserror::Error;
use trellis_common::CommonError;
use trellis_markup::MarkupError;
use trellis_materializer::{LoadError, MaterializeError};
use trellis_model::{ModelError, NodeId};

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Materialize error: {0}")]
    Materialize(#[from] MaterializeError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("IO error: {0}")]
    Io(#[from] CommonError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Document '{name}' could not be serialized: {reason}")]
    SaveFailed { name: String, reason: String },

    #[error("Node {id} cannot be extracted: {reason}")]
    CannotExtract { id: NodeId, reason: String },
}
