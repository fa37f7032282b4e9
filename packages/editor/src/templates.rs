//! Template workflows: extract a subtree into its own document, or unpack a
//! template reference back into inline nodes.

use crate::document::EditorDocument;
use crate::errors::EditorError;
use crate::mutations::Change;
use crate::notifications::NotificationSink;
use indexmap::IndexMap;
use tracing::{debug, info, instrument, warn};
use trellis_common::normalize;
use trellis_markup::{serialize, SerializeOptions};
use trellis_materializer::DocumentLoader;
use trellis_model::{Document, ModelError, Node, NodeId, ROOT_ID};

/// Outcome of [`EditorDocument::extract_to_template`]
#[derive(Debug, Clone)]
pub struct ExtractedTemplate {
    /// Normalized project path of the new document
    pub path: String,
    /// Markup to write at `path`
    pub text: String,
    pub document: Document,
    /// Template reference that replaced the subtree
    pub instance: NodeId,
}

impl EditorDocument {
    /// Move `node` and its subtree into a new document at `path` and put a
    /// reference to it, registered as `alias`, in its place.
    #[instrument(skip(self, sink), fields(document = %self.name()))]
    pub fn extract_to_template(
        &mut self,
        node: NodeId,
        alias: &str,
        path: &str,
        sink: &dyn NotificationSink,
    ) -> Result<ExtractedTemplate, EditorError> {
        let path = normalize(path)?;
        if path == self.path() {
            return Err(EditorError::CannotExtract {
                id: node,
                reason: "a document cannot reference itself".to_string(),
            });
        }
        if let Some(existing) = self.model().resolve_alias(alias) {
            if existing != path {
                return Err(EditorError::CannotExtract {
                    id: node,
                    reason: format!("alias '{}' already points to {}", alias, existing),
                });
            }
        }

        let source = self.model().get(node)?.clone();
        let parent = source.parent_id;
        let index = position_of(self.model(), parent, node);
        let slot = self.model().slot_of(node).map(str::to_string);

        let mut extracted = Document::new(path.clone());
        extracted.swallow(ROOT_ID, self.model(), Some(node))?;
        let text = serialize(&extracted, &SerializeOptions::to_file(path.clone()))?;

        let model = self.model_mut();
        let mut changes: Vec<Change> = model
            .remove_subtree(node)?
            .into_iter()
            .map(|removed| Change::NodeRemoved { id: removed.id })
            .collect();
        model.add_using(alias, path.clone());
        changes.push(Change::UsingsChanged);

        let mut reference = Node::template_instance(alias);
        if source.is_root() {
            reference.style_sheets = source.style_sheets.clone();
        }
        let instance = model.add_node(parent, Some(index), reference)?;
        if let Some(slot) = slot {
            model.assign_slot(instance, slot)?;
        }
        model.reorder_document();
        changes.push(Change::NodeAdded { id: instance });
        changes.push(Change::HierarchyReordered);

        info!(node, alias, path = %path, nodes = extracted.len(), "Extracted subtree to template");
        self.commit(changes, sink);

        Ok(ExtractedTemplate {
            path,
            text,
            document: extracted,
            instance,
        })
    }

    /// Replace the template reference `instance` with a copy of the document it
    /// references. Children routed to slots land in the matching insertion
    /// points, the rest under the first unpacked root. When `instance` is itself
    /// routed into a slot of its parent, the unpacked roots inherit that slot.
    /// Returns the unpacked roots.
    #[instrument(skip(self, loader, sink), fields(document = %self.name()))]
    pub fn unpack_template(
        &mut self,
        instance: NodeId,
        loader: &dyn DocumentLoader,
        sink: &dyn NotificationSink,
    ) -> Result<Vec<NodeId>, EditorError> {
        let node = self.model().get(instance)?.clone();
        let template = node
            .template
            .clone()
            .ok_or(ModelError::NotATemplate { id: instance })?;
        let path = self
            .model()
            .resolve_alias(&template.alias)
            .ok_or_else(|| ModelError::UnknownAlias {
                alias: template.alias.clone(),
            })?
            .to_string();
        let referenced = loader.load(&path)?;

        let parent = node.parent_id;
        let index = position_of(self.model(), parent, instance);
        let own_children = self.model().children_of(instance);
        let routed_slot = self.model().slot_of(instance).map(str::to_string);

        let model = self.model_mut();
        let report = model.swallow(parent, &referenced, None)?;
        for (offset, root) in report.roots.iter().enumerate() {
            model.move_to_index(*root, index + offset)?;
        }

        // Insertion points and named elements of the unpacked copy
        let mut insertion_points: IndexMap<String, NodeId> = IndexMap::new();
        let mut unpacked: Vec<NodeId> = Vec::new();
        for donor_id in referenced.depth_first() {
            let Some(new_id) = report.id_map.get(&donor_id).copied() else {
                continue;
            };
            unpacked.push(new_id);
            if let Some(slot) = referenced.find(donor_id).and_then(Node::declared_slot) {
                insertion_points.entry(slot.to_string()).or_insert(new_id);
            }
        }

        for o in &template.attribute_overrides {
            for id in &unpacked {
                let target = model.get_mut(*id)?;
                if target.name() == Some(o.element_name.as_str()) {
                    target
                        .attributes
                        .insert(o.attribute_name.clone(), o.value.clone());
                }
            }
        }

        let fallback = report.roots.first().copied().unwrap_or(parent);
        for child in &own_children {
            let destination = match template.slot_usages.get(child) {
                Some(slot) => match insertion_points.get(slot) {
                    Some(point) => *point,
                    None => {
                        warn!(child, slot = %slot, "Unpacked template has no such slot, keeping child under its root");
                        fallback
                    }
                },
                None => fallback,
            };
            model.reparent(*child, destination, None)?;
        }

        if node.is_root() && !node.style_sheets.is_empty() {
            if let Some(first) = report.roots.first() {
                model.get_mut(*first)?.style_sheets.extend(node.style_sheets.clone());
            }
        }

        model.remove_node(instance)?;
        if let Some(slot) = &routed_slot {
            for root in &report.roots {
                model.assign_slot(*root, slot.clone())?;
            }
            debug!(instance, slot = %slot, roots = report.roots.len(), "Unpacked roots take over the reference's slot");
        }
        model.reorder_document();

        let mut changes = vec![Change::NodeRemoved { id: instance }];
        changes.extend(report.roots.iter().map(|id| Change::NodeAdded { id: *id }));
        if routed_slot.is_some() {
            changes.extend(report.roots.iter().map(|id| Change::SlotChanged { id: *id }));
        }
        changes.extend(own_children.iter().map(|id| Change::NodeMoved {
            id: *id,
            parent_id: self.model().find(*id).map(|n| n.parent_id).unwrap_or(parent),
        }));
        if !report.added_usings.is_empty() {
            changes.push(Change::UsingsChanged);
        }
        changes.push(Change::HierarchyReordered);

        info!(instance, path = %path, roots = report.roots.len(), "Unpacked template");
        self.commit(changes, sink);
        Ok(report.roots)
    }
}

/// Index of `node` among the children of `parent`
fn position_of(document: &Document, parent: NodeId, node: NodeId) -> usize {
    document
        .children_of(parent)
        .iter()
        .position(|id| *id == node)
        .unwrap_or(0)
}
