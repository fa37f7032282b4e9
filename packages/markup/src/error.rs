use thiserror::Error;
use trellis_common::CommonError;
use trellis_model::{ModelError, NodeId};

pub type MarkupResult<T> = Result<T, MarkupError>;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Expected a UXML root element, found '{found}'")]
    UnexpectedRoot { found: String },

    #[error("<{tag}> is missing required attribute '{attribute}'")]
    MissingAttribute { tag: String, attribute: String },

    #[error("Node {node} references missing style rule {index}")]
    StyleRuleMissing { node: NodeId, index: usize },

    #[error("Malformed style declaration '{declaration}': {reason}")]
    MalformedStyle { declaration: String, reason: String },

    #[error("Invalid reference: {0}")]
    Path(#[from] CommonError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}
