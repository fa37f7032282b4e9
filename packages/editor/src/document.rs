//! # Document Handle
//!
//! Editing state of one open UI document.
//!
//! The flattened [`Document`] model is the single source of truth. Markup text
//! and live trees are derived from it on demand and never cached.
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Parse → Edit → Materialize → Serialize → Save
//!   ↓      ↓       ↓         ↓            ↓         ↓
//! Text   Model  Mutations  LiveTree     Text    (host)
//! ```

use crate::errors::EditorError;
use crate::mutations::{Change, Mutation, MutationResult};
use crate::notifications::NotificationSink;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use trellis_markup::{parse, serialize, SerializeOptions};
use trellis_materializer::{
    DocumentLoader, MaterializeReport, MaterializeResult, Materializer, NodeFactory,
};
use trellis_model::{Document, NodeId};

/// Appended to the display name of a document whose last serialization failed
pub const INVALID_SUFFIX: &str = " (invalid)";

/// Editable UI document
#[derive(Debug, Clone)]
pub struct EditorDocument {
    /// Display name, derived from the file name
    name: String,

    /// Current version number (increments on each applied mutation)
    pub version: u64,

    dirty: bool,
    model: Document,
}

/// Serialized editing state handed to the host's undo/redo infrastructure
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    version: u64,
    model: Document,
}

impl EditorDocument {
    /// Empty document at the project path `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self::from_model(Document::new(path))
    }

    pub fn from_model(model: Document) -> Self {
        Self {
            name: display_name(model.identity()),
            version: 0,
            dirty: false,
            model,
        }
    }

    /// Parse markup text stored at the project path `path`
    pub fn from_source(path: impl Into<String>, source: &str) -> Result<Self, EditorError> {
        let path = path.into();
        let model = parse(source, &path)?;
        Ok(Self::from_model(model))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project path of the document
    pub fn path(&self) -> &str {
        self.model.identity()
    }

    pub fn model(&self) -> &Document {
        &self.model
    }

    /// Direct access to the model. Marks the document dirty.
    pub fn model_mut(&mut self) -> &mut Document {
        self.dirty = true;
        &mut self.model
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the last serialization failed
    pub fn is_marked_invalid(&self) -> bool {
        self.name.ends_with(INVALID_SUFFIX)
    }

    /// Apply a mutation and notify the host of the resulting changes
    #[instrument(skip(self, sink), fields(document = %self.name))]
    pub fn apply(
        &mut self,
        mutation: Mutation,
        sink: &dyn NotificationSink,
    ) -> Result<MutationResult, EditorError> {
        let changes = mutation.apply(&mut self.model)?;
        Ok(self.commit(changes, sink))
    }

    /// Record changes made directly on the model as one new version
    pub(crate) fn commit(&mut self, changes: Vec<Change>, sink: &dyn NotificationSink) -> MutationResult {
        self.version += 1;
        self.dirty = true;
        sink.document_changed(self.model.identity(), self.version, &changes);
        debug!(version = self.version, changes = changes.len(), "Committed changes");
        MutationResult {
            version: self.version,
            changes,
        }
    }

    /// Markup text to write to the document's own path.
    ///
    /// On failure the document name is marked invalid and a blocking error is
    /// raised once; later failures on the marked document only warn.
    #[instrument(skip(self, sink), fields(document = %self.name))]
    pub fn serialize_for_save(&mut self, sink: &dyn NotificationSink) -> Result<String, EditorError> {
        let options = SerializeOptions::to_file(self.model.identity());
        match serialize(&self.model, &options) {
            Ok(text) => {
                if self.is_marked_invalid() {
                    let len = self.name.len() - INVALID_SUFFIX.len();
                    self.name.truncate(len);
                    info!("Document serializes again, clearing invalid mark");
                }
                self.dirty = false;
                Ok(text)
            }
            Err(err) => {
                let reason = err.to_string();
                if self.is_marked_invalid() {
                    warn!(%reason, "Document is still invalid");
                    sink.warning(&format!("{} could not be saved: {}", self.name, reason));
                } else {
                    self.name.push_str(INVALID_SUFFIX);
                    sink.error_dialog(
                        "Invalid document",
                        &format!(
                            "{} could not be saved and has been marked invalid: {}",
                            self.path(),
                            reason
                        ),
                    );
                }
                Err(EditorError::SaveFailed {
                    name: self.name.clone(),
                    reason,
                })
            }
        }
    }

    /// Markup of `node` and its subtree, keeping editor-only state
    pub fn to_clipboard(&self, node: NodeId) -> Result<String, EditorError> {
        let options = SerializeOptions {
            writing_to_file: false,
            subtree: Some(node),
            ..SerializeOptions::default()
        };
        Ok(serialize(&self.model, &options)?)
    }

    /// Parse copied markup and transplant it under `target`. Returns the new top-level ids.
    #[instrument(skip(self, text, sink), fields(document = %self.name))]
    pub fn paste(
        &mut self,
        text: &str,
        target: NodeId,
        sink: &dyn NotificationSink,
    ) -> Result<Vec<NodeId>, EditorError> {
        let donor = parse(text, self.model.identity())?;
        let report = self.model.swallow(target, &donor, None)?;

        let mut changes: Vec<Change> = report
            .roots
            .iter()
            .map(|id| Change::NodeAdded { id: *id })
            .collect();
        if !report.added_usings.is_empty() {
            changes.push(Change::UsingsChanged);
        }
        changes.push(Change::HierarchyReordered);
        self.commit(changes, sink);

        Ok(report.roots)
    }

    /// Build the live tree for this document
    pub fn materialize(
        &self,
        factory: &dyn NodeFactory,
        loader: &dyn DocumentLoader,
    ) -> MaterializeResult<MaterializeReport> {
        Materializer::new(factory, loader).materialize(&self.model)
    }

    /// JSON snapshot of the editing state
    pub fn snapshot(&self) -> Result<String, EditorError> {
        let snapshot = Snapshot {
            version: self.version,
            model: self.model.clone(),
        };
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Replace the model with a snapshot taken earlier
    pub fn restore(&mut self, snapshot: &str, sink: &dyn NotificationSink) -> Result<(), EditorError> {
        let snapshot: Snapshot = serde_json::from_str(snapshot)?;
        debug!(from_version = snapshot.version, "Restoring snapshot");
        self.model = snapshot.model;
        self.commit(vec![Change::HierarchyReordered], sink);
        Ok(())
    }
}

/// File name of a project path
fn display_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}
