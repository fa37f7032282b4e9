//! # Trellis Model
//!
//! The flattened document model behind every open UI document.
//!
//! ```text
//! Document
//!  ├─ nodes: Vec<Node>          (arena, parent-pointer linkage by id)
//!  ├─ style_rules: StyleRuleStore (arena, referenced by Node::rule_index)
//!  └─ usings: alias -> path      (template registrations)
//! ```
//!
//! Nodes never hold references to each other; children are recovered on
//! demand with [`Document::children_map`].

pub mod document;
pub mod error;
pub mod id_generator;
pub mod node;
pub mod ordering;
pub mod style;
pub mod swallow;

pub use document::Document;
pub use error::{ModelError, ModelResult};
pub use id_generator::{get_document_hash, IdGenerator};
pub use node::{
    canonical_type_name, AttributeOverride, Node, NodeId, StyleSheetRef, TemplateInstance,
    CORE_NAMESPACE, NAME_ATTRIBUTE, ROOT_ID, SLOT_NAME_ATTRIBUTE, UNSAVED_SHEET_PREFIX,
};
pub use ordering::{ORDER_HALF_INCREMENT, ORDER_INCREMENT};
pub use style::{StyleProperty, StyleRule, StyleRuleStore};
pub use swallow::SwallowReport;
