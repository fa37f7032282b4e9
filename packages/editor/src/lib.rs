//! # Trellis Editor
//!
//! Editing handle for open UI documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ markup: text ⇄ Document                     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditorDocument + mutations          │
//! │  - Load through the host file system        │
//! │  - Apply mutations with validation          │
//! │  - Clipboard, extract / unpack templates    │
//! │  - Save failure policy, notifications       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ materializer: Document → LiveTree           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use trellis_editor::{EditorDocument, Mutation, TracingSink};
//!
//! let mut doc = EditorDocument::from_source("/ui/main.uxml", &text)?;
//!
//! let mutation = Mutation::SetAttribute {
//!     node_id: button,
//!     name: "text".to_string(),
//!     value: "Continue".to_string(),
//! };
//! doc.apply(mutation, &TracingSink)?;
//!
//! let live = doc.materialize(&factory, &loader)?;
//! let text = doc.serialize_for_save(&TracingSink)?;
//! ```

mod document;
mod errors;
mod loader;
mod mutations;
mod notifications;
mod templates;

pub use document::{EditorDocument, INVALID_SUFFIX};
pub use errors::EditorError;
pub use loader::ProjectLoader;
pub use mutations::{Change, Mutation, MutationError, MutationResult};
pub use notifications::{Notification, NotificationSink, RecordingSink, TracingSink};
pub use templates::ExtractedTemplate;

// Re-export common types for convenience
pub use trellis_markup::SerializeOptions;
pub use trellis_materializer::{FactoryRegistry, LiveTree, MaterializeReport};
pub use trellis_model::{Document, Node, NodeId, ROOT_ID};
