//! # Document Mutations
//!
//! Semantic edit operations on a trellis [`Document`].
//!
//! Every mutation validates before touching the model, so a rejected mutation
//! leaves the document unchanged. Applying a mutation yields the list of
//! [`Change`]s the host needs to refresh its views.
//!
//! ## Structural mutations
//!
//! Adding, removing and moving nodes end with a full reorder pass so sibling
//! order values stay dense and distinct.
//!
//! ### RemoveNode
//! - Removes the node and every descendant
//! - Slot usages pointing at removed nodes are dropped
//!
//! ### MoveElement
//! - Fails if the new parent does not exist or would create a cycle
//! - A top-level node moving under a parent loses its style sheets

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trellis_model::{Document, ModelError, Node, NodeId, StyleSheetRef, ROOT_ID};

/// Attributes that are modeled separately and cannot be set as plain attributes
const RESERVED_ATTRIBUTES: &[&str] = &["class", "style", "slot"];

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert a detached element under a parent, appended or at index
    AddElement {
        parent_id: NodeId,
        index: Option<usize>,
        element: Node,
    },

    /// Insert a reference to another document, registering its alias when a path is given
    AddTemplateInstance {
        parent_id: NodeId,
        index: Option<usize>,
        alias: String,
        path: Option<String>,
    },

    /// Remove a node and all of its descendants
    RemoveNode { node_id: NodeId },

    /// Move an element to a new parent, appended or at index
    MoveElement {
        node_id: NodeId,
        new_parent_id: NodeId,
        index: Option<usize>,
    },

    SetAttribute {
        node_id: NodeId,
        name: String,
        value: String,
    },

    RemoveAttribute { node_id: NodeId, name: String },

    AddClass { node_id: NodeId, class: String },

    RemoveClass { node_id: NodeId, class: String },

    /// Set one inline style declaration
    SetInlineStyle {
        node_id: NodeId,
        property: String,
        value: String,
    },

    ClearInlineStyle { node_id: NodeId, property: String },

    /// Route a template child into a slot; `None` clears the routing
    AssignSlot {
        node_id: NodeId,
        slot: Option<String>,
    },

    /// Set an attribute override on a template reference; `None` removes it
    SetAttributeOverride {
        node_id: NodeId,
        element_name: String,
        attribute_name: String,
        value: Option<String>,
    },

    /// Attach a style sheet to a top-level node
    AttachStyleSheet { node_id: NodeId, path: String },

    DetachStyleSheet { node_id: NodeId, path: String },

    /// Rename a template alias and every reference using it
    RenameUsing { old_alias: String, new_alias: String },
}

/// What a mutation changed, for the host's views
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Change {
    NodeAdded { id: NodeId },
    NodeRemoved { id: NodeId },
    NodeMoved { id: NodeId, parent_id: NodeId },
    AttributesChanged { id: NodeId },
    ClassesChanged { id: NodeId },
    InlineStyleChanged { id: NodeId },
    SlotChanged { id: NodeId },
    OverridesChanged { id: NodeId },
    StyleSheetsChanged { id: NodeId },
    UsingsChanged,
    /// Sibling order values were renumbered
    HierarchyReordered,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Parent not found: {0}")]
    ParentNotFound(NodeId),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Node {0} is not a template instance")]
    NotATemplate(NodeId),

    #[error("Unknown template alias: {0}")]
    UnknownAlias(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

impl From<ModelError> for MutationError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidParent { parent } => MutationError::ParentNotFound(parent),
            ModelError::NodeNotFound { id } => MutationError::NodeNotFound(id),
            ModelError::CycleDetected { .. } => MutationError::CycleDetected,
            ModelError::NotATemplate { id } | ModelError::NotATemplateChild { id } => {
                MutationError::NotATemplate(id)
            }
            ModelError::UnknownAlias { alias } => MutationError::UnknownAlias(alias),
            other => MutationError::InvalidStructure(other.to_string()),
        }
    }
}

impl Mutation {
    /// Add, remove and move mutations; they end with a reorder pass
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::AddElement { .. }
                | Mutation::AddTemplateInstance { .. }
                | Mutation::RemoveNode { .. }
                | Mutation::MoveElement { .. }
        )
    }

    /// Apply mutation to the document with validation
    pub fn apply(&self, doc: &mut Document) -> Result<Vec<Change>, MutationError> {
        self.validate(doc)?;

        let mut changes = match self {
            Mutation::AddElement {
                parent_id,
                index,
                element,
            } => {
                let id = doc.add_node(*parent_id, *index, element.clone())?;
                vec![Change::NodeAdded { id }]
            }

            Mutation::AddTemplateInstance {
                parent_id,
                index,
                alias,
                path,
            } => {
                let mut changes = Vec::new();
                if let Some(path) = path {
                    doc.add_using(alias.clone(), path.clone());
                    changes.push(Change::UsingsChanged);
                }
                let id = doc.add_node(*parent_id, *index, Node::template_instance(alias.clone()))?;
                changes.push(Change::NodeAdded { id });
                changes
            }

            Mutation::RemoveNode { node_id } => doc
                .remove_subtree(*node_id)?
                .into_iter()
                .map(|node| Change::NodeRemoved { id: node.id })
                .collect(),

            Mutation::MoveElement {
                node_id,
                new_parent_id,
                index,
            } => {
                let had_sheets = !doc.get(*node_id)?.style_sheets.is_empty();
                doc.reparent(*node_id, *new_parent_id, *index)?;
                let mut changes = vec![Change::NodeMoved {
                    id: *node_id,
                    parent_id: *new_parent_id,
                }];
                if had_sheets && doc.get(*node_id)?.style_sheets.is_empty() {
                    changes.push(Change::StyleSheetsChanged { id: *node_id });
                }
                changes
            }

            Mutation::SetAttribute {
                node_id,
                name,
                value,
            } => {
                doc.get_mut(*node_id)?
                    .attributes
                    .insert(name.clone(), value.clone());
                vec![Change::AttributesChanged { id: *node_id }]
            }

            Mutation::RemoveAttribute { node_id, name } => {
                match doc.get_mut(*node_id)?.attributes.shift_remove(name) {
                    Some(_) => vec![Change::AttributesChanged { id: *node_id }],
                    None => vec![],
                }
            }

            Mutation::AddClass { node_id, class } => {
                if doc.get_mut(*node_id)?.classes.insert(class.clone()) {
                    vec![Change::ClassesChanged { id: *node_id }]
                } else {
                    vec![]
                }
            }

            Mutation::RemoveClass { node_id, class } => {
                if doc.get_mut(*node_id)?.classes.shift_remove(class) {
                    vec![Change::ClassesChanged { id: *node_id }]
                } else {
                    vec![]
                }
            }

            Mutation::SetInlineStyle {
                node_id,
                property,
                value,
            } => {
                doc.set_inline_style(*node_id, property.clone(), value.clone())?;
                vec![Change::InlineStyleChanged { id: *node_id }]
            }

            Mutation::ClearInlineStyle { node_id, property } => {
                if doc.clear_inline_style(*node_id, property)? {
                    vec![Change::InlineStyleChanged { id: *node_id }]
                } else {
                    vec![]
                }
            }

            Mutation::AssignSlot { node_id, slot } => {
                match slot {
                    Some(slot) => doc.assign_slot(*node_id, slot.clone())?,
                    None => {
                        let template_id = doc
                            .slot_owner(*node_id)
                            .ok_or(MutationError::NotATemplate(*node_id))?;
                        doc.template_mut(template_id)?
                            .slot_usages
                            .shift_remove(node_id);
                    }
                }
                vec![Change::SlotChanged { id: *node_id }]
            }

            Mutation::SetAttributeOverride {
                node_id,
                element_name,
                attribute_name,
                value,
            } => {
                let template = doc.template_mut(*node_id)?;
                let changed = match value {
                    Some(value) => {
                        template.set_override(element_name.clone(), attribute_name.clone(), value.clone());
                        true
                    }
                    None => template.remove_override(element_name, attribute_name),
                };
                if changed {
                    vec![Change::OverridesChanged { id: *node_id }]
                } else {
                    vec![]
                }
            }

            Mutation::AttachStyleSheet { node_id, path } => {
                let node = doc.get_mut(*node_id)?;
                if node.style_sheets.iter().any(|s| &s.path == path) {
                    vec![]
                } else {
                    node.style_sheets.push(StyleSheetRef::new(path.clone()));
                    vec![Change::StyleSheetsChanged { id: *node_id }]
                }
            }

            Mutation::DetachStyleSheet { node_id, path } => {
                let node = doc.get_mut(*node_id)?;
                let before = node.style_sheets.len();
                node.style_sheets.retain(|s| &s.path != path);
                if node.style_sheets.len() != before {
                    vec![Change::StyleSheetsChanged { id: *node_id }]
                } else {
                    vec![]
                }
            }

            Mutation::RenameUsing {
                old_alias,
                new_alias,
            } => {
                doc.rename_using(old_alias, new_alias)?;
                vec![Change::UsingsChanged]
            }
        };

        if self.is_structural() {
            doc.reorder_document();
            changes.push(Change::HierarchyReordered);
        }

        Ok(changes)
    }

    /// Check the mutation against the document without applying it
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::AddElement {
                parent_id, element, ..
            } => {
                require_parent(doc, *parent_id)?;
                if element.type_name.is_empty() {
                    return Err(MutationError::InvalidStructure(
                        "Element type name cannot be empty".to_string(),
                    ));
                }
                if element.is_template() {
                    return Err(MutationError::InvalidStructure(
                        "Use AddTemplateInstance to insert template references".to_string(),
                    ));
                }
                if *parent_id != ROOT_ID && !element.style_sheets.is_empty() {
                    return Err(MutationError::InvalidStructure(
                        "Style sheets can only be attached to top-level nodes".to_string(),
                    ));
                }
            }

            Mutation::AddTemplateInstance {
                parent_id,
                alias,
                path,
                ..
            } => {
                require_parent(doc, *parent_id)?;
                if alias.is_empty() {
                    return Err(MutationError::InvalidStructure(
                        "Template alias cannot be empty".to_string(),
                    ));
                }
                if path.is_none() && doc.resolve_alias(alias).is_none() {
                    return Err(MutationError::UnknownAlias(alias.clone()));
                }
            }

            Mutation::RemoveNode { node_id } => require_node(doc, *node_id)?,

            Mutation::MoveElement {
                node_id,
                new_parent_id,
                ..
            } => {
                require_node(doc, *node_id)?;
                require_parent(doc, *new_parent_id)?;
                if node_id == new_parent_id || doc.is_descendant_of(*new_parent_id, *node_id) {
                    return Err(MutationError::CycleDetected);
                }
            }

            Mutation::SetAttribute { node_id, name, .. } => {
                require_node(doc, *node_id)?;
                if name.is_empty() {
                    return Err(MutationError::InvalidStructure(
                        "Attribute name cannot be empty".to_string(),
                    ));
                }
                if RESERVED_ATTRIBUTES.contains(&name.as_str()) {
                    return Err(MutationError::InvalidStructure(format!(
                        "'{}' is not a plain attribute",
                        name
                    )));
                }
            }

            Mutation::AddClass { node_id, class } => {
                require_node(doc, *node_id)?;
                if class.is_empty() || class.contains(char::is_whitespace) {
                    return Err(MutationError::InvalidStructure(format!(
                        "Invalid class name '{}'",
                        class
                    )));
                }
            }

            Mutation::SetInlineStyle {
                node_id,
                property,
                value,
            } => {
                require_node(doc, *node_id)?;
                if property.is_empty() || value.is_empty() {
                    return Err(MutationError::InvalidStructure(
                        "Style declarations need a property and a value".to_string(),
                    ));
                }
            }

            Mutation::AssignSlot { node_id, slot } => {
                require_node(doc, *node_id)?;
                if doc.slot_owner(*node_id).is_none() {
                    return Err(MutationError::NotATemplate(*node_id));
                }
                if slot.as_deref() == Some("") {
                    return Err(MutationError::InvalidStructure(
                        "Slot name cannot be empty".to_string(),
                    ));
                }
            }

            Mutation::SetAttributeOverride { node_id, .. } => {
                if !doc.get(*node_id)?.is_template() {
                    return Err(MutationError::NotATemplate(*node_id));
                }
            }

            Mutation::AttachStyleSheet { node_id, path } => {
                if !doc.get(*node_id)?.is_root() {
                    return Err(MutationError::InvalidStructure(
                        "Style sheets can only be attached to top-level nodes".to_string(),
                    ));
                }
                if path.is_empty() {
                    return Err(MutationError::InvalidStructure(
                        "Style sheet path cannot be empty".to_string(),
                    ));
                }
            }

            Mutation::RenameUsing {
                old_alias,
                new_alias,
            } => {
                if doc.resolve_alias(old_alias).is_none() {
                    return Err(MutationError::UnknownAlias(old_alias.clone()));
                }
                if new_alias.is_empty() {
                    return Err(MutationError::InvalidStructure(
                        "Template alias cannot be empty".to_string(),
                    ));
                }
            }

            Mutation::RemoveAttribute { node_id, .. }
            | Mutation::RemoveClass { node_id, .. }
            | Mutation::ClearInlineStyle { node_id, .. }
            | Mutation::DetachStyleSheet { node_id, .. } => require_node(doc, *node_id)?,
        }

        Ok(())
    }
}

fn require_node(doc: &Document, id: NodeId) -> Result<(), MutationError> {
    if doc.contains(id) {
        Ok(())
    } else {
        Err(MutationError::NodeNotFound(id))
    }
}

fn require_parent(doc: &Document, id: NodeId) -> Result<(), MutationError> {
    if doc.is_valid_parent(id) {
        Ok(())
    } else {
        Err(MutationError::ParentNotFound(id))
    }
}

/// Result of applying a mutation to an editor document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    /// New version number
    pub version: u64,

    pub changes: Vec<Change>,
}

impl MutationResult {
    /// Id of the first node the mutation created, if any
    pub fn created(&self) -> Option<NodeId> {
        self.changes.iter().find_map(|c| match c {
            Change::NodeAdded { id } => Some(*id),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::SetAttributeOverride {
            node_id: 42,
            element_name: "title".to_string(),
            attribute_name: "text".to_string(),
            value: Some("Hello".to_string()),
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: Mutation = serde_json::from_str(&json).unwrap();
        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_validation_rejects_missing_nodes() {
        let doc = Document::new("/ui/main.uxml");
        let mutation = Mutation::SetAttribute {
            node_id: 7,
            name: "text".to_string(),
            value: "x".to_string(),
        };
        assert_eq!(mutation.validate(&doc), Err(MutationError::NodeNotFound(7)));
    }

    #[test]
    fn test_reserved_attributes_are_rejected() {
        let mut doc = Document::new("/ui/main.uxml");
        let id = doc.add_node(ROOT_ID, None, Node::element("Label")).unwrap();
        for name in ["class", "style", "slot"] {
            let mutation = Mutation::SetAttribute {
                node_id: id,
                name: name.to_string(),
                value: "x".to_string(),
            };
            assert!(matches!(
                mutation.apply(&mut doc),
                Err(MutationError::InvalidStructure(_))
            ));
        }
        assert!(doc.find(id).unwrap().attributes.is_empty());
    }

    #[test]
    fn test_structural_mutations_reorder() {
        let mut doc = Document::new("/ui/main.uxml");
        let changes = Mutation::AddElement {
            parent_id: ROOT_ID,
            index: Some(0),
            element: Node::element("Label"),
        }
        .apply(&mut doc)
        .unwrap();

        assert!(matches!(changes[0], Change::NodeAdded { .. }));
        assert_eq!(changes.last(), Some(&Change::HierarchyReordered));
        assert_eq!(doc.nodes()[0].order_in_document, 0);
    }

    #[test]
    fn test_style_sheets_only_at_root_scope() {
        let mut doc = Document::new("/ui/main.uxml");
        let root = doc.add_node(ROOT_ID, None, Node::element("VisualElement")).unwrap();
        let child = doc.add_node(root, None, Node::element("Label")).unwrap();

        let attach = |node_id| Mutation::AttachStyleSheet {
            node_id,
            path: "/ui/main.uss".to_string(),
        };
        assert!(attach(child).apply(&mut doc).is_err());
        assert_eq!(
            attach(root).apply(&mut doc).unwrap(),
            vec![Change::StyleSheetsChanged { id: root }]
        );
        // Attaching twice is a no-op
        assert!(attach(root).apply(&mut doc).unwrap().is_empty());
    }
}
