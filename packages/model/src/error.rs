use crate::node::NodeId;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Structural errors: the caller asked for something the node store cannot represent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid parent: {parent}")]
    InvalidParent { parent: NodeId },

    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    #[error("Moving {node} under {parent} would create a cycle")]
    CycleDetected { node: NodeId, parent: NodeId },

    #[error("Node {id} is not a template instance")]
    NotATemplate { id: NodeId },

    #[error("Node {id} is not a direct child of a template instance")]
    NotATemplateChild { id: NodeId },

    #[error("Style rule {index} not found")]
    StyleRuleNotFound { index: usize },

    #[error("Template alias '{alias}' is not registered")]
    UnknownAlias { alias: String },

    #[error("Template alias '{alias}' is already registered")]
    DuplicateAlias { alias: String },
}
