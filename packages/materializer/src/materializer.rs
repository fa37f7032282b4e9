//! # Tree materialization
//!
//! Walks a Document depth-first and builds the matching [`LiveTree`].
//!
//! Template references are expanded in place: the referenced document is
//! materialized under the reference's container, its declared insertion points
//! (`slot-name`) are collected, attribute overrides are applied by element
//! name, and only then are the reference's own children attached, each routed
//! to the insertion point named by the reference's slot usages.
//!
//! Slot maps and override lists are scoped to one template-reference boundary.
//! Overrides apply own first, then inherited from enclosing references, so the
//! outermost reference wins.
//!
//! Content problems never abort the pass; they degrade locally and are
//! recorded as [`Diagnostic`]s. Circular inclusion is the one hard failure and
//! is detected with the stack of documents currently being materialized.

use crate::error::{MaterializeError, MaterializeResult};
use crate::factory::NodeFactory;
use crate::live::{LiveId, LiveNode, LiveTree, SourceLink};
use crate::loader::DocumentLoader;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument, warn};
use trellis_model::{
    AttributeOverride, Document, Node, NodeId, TemplateInstance, ROOT_ID,
};

/// Options for one materialization pass
#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    pub apply_overrides: bool,
    /// Type of the container created by [`Materializer::materialize`]
    pub root_type_name: String,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            apply_overrides: true,
            root_type_name: TemplateInstance::TYPE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// A content problem handled during materialization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Identity of the document holding the offending node
    pub document: String,
    pub node: Option<NodeId>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct MaterializeReport {
    pub tree: LiveTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl MaterializeReport {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Insertion points declared by one materialized template: slot name -> live node
type SlotMap = IndexMap<String, LiveId>;

pub struct Materializer<'a> {
    factory: &'a dyn NodeFactory,
    loader: &'a dyn DocumentLoader,
    options: MaterializeOptions,
    /// Documents currently being materialized, outermost first
    inclusion_stack: Vec<String>,
    /// Override lists of the enclosing template references, outermost first
    inherited_overrides: Vec<Vec<AttributeOverride>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Materializer<'a> {
    pub fn new(factory: &'a dyn NodeFactory, loader: &'a dyn DocumentLoader) -> Self {
        Self {
            factory,
            loader,
            options: MaterializeOptions::default(),
            inclusion_stack: Vec::new(),
            inherited_overrides: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: MaterializeOptions) -> Self {
        self.options = options;
        self
    }

    /// Materialize `document` into a fresh tree rooted at a container
    #[instrument(skip_all, fields(document = %document.identity()))]
    pub fn materialize(&mut self, document: &Document) -> MaterializeResult<MaterializeReport> {
        let mut tree = LiveTree::new(self.options.root_type_name.clone());
        let root = tree.root();
        let diagnostics = self.materialize_into(document, &mut tree, root)?;
        Ok(MaterializeReport { tree, diagnostics })
    }

    /// Materialize `document` as children of the existing live node `target`
    pub fn materialize_into(
        &mut self,
        document: &Document,
        tree: &mut LiveTree,
        target: LiveId,
    ) -> MaterializeResult<Vec<Diagnostic>> {
        if !tree.contains(target) {
            return Err(MaterializeError::InvalidTarget { id: target });
        }
        self.inclusion_stack.clear();
        self.inherited_overrides.clear();
        self.diagnostics.clear();

        let before = tree.len();
        // Insertion points of the top-level document have no consumer
        let mut slots = SlotMap::new();
        self.clone_document(document, tree, target, &mut slots)?;

        info!(
            created = tree.len() - before,
            diagnostics = self.diagnostics.len(),
            "Materialized document"
        );
        Ok(std::mem::take(&mut self.diagnostics))
    }

    fn clone_document(
        &mut self,
        document: &Document,
        tree: &mut LiveTree,
        target: LiveId,
        slots: &mut SlotMap,
    ) -> MaterializeResult<()> {
        self.inclusion_stack.push(document.identity().to_string());

        let children = document.children_map();
        if let Some(roots) = children.get(&ROOT_ID) {
            for root in roots {
                self.clone_node(document, &children, *root, tree, target, slots)?;
            }
        }

        self.inclusion_stack.pop();
        Ok(())
    }

    fn clone_node(
        &mut self,
        document: &Document,
        children: &HashMap<NodeId, Vec<NodeId>>,
        id: NodeId,
        tree: &mut LiveTree,
        parent: LiveId,
        slots: &mut SlotMap,
    ) -> MaterializeResult<LiveId> {
        let node = document.get(id)?;

        let mut live = self.construct(document, node);
        live.classes = node.classes.iter().cloned().collect();
        live.attributes = node.attributes.clone();
        self.apply_inline_style(document, node, &mut live);
        live.source = Some(SourceLink {
            document: document.identity().to_string(),
            node: id,
        });

        let live_id = tree
            .append(parent, live)
            .ok_or(MaterializeError::InvalidTarget { id: parent })?;

        if let Some(slot) = node.declared_slot() {
            slots.entry(slot.to_string()).or_insert(live_id);
        }

        let own_children = children.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        let Some(template) = &node.template else {
            for child in own_children {
                self.clone_node(document, children, *child, tree, live_id, slots)?;
            }
            return Ok(live_id);
        };

        let Some(template_slots) = self.clone_template(document, id, template, tree, live_id)?
        else {
            return Ok(live_id);
        };

        for child in own_children {
            let destination = match template.slot_usages.get(child) {
                Some(slot) => match template_slots.get(slot) {
                    Some(point) => *point,
                    None => {
                        error!(
                            alias = %template.alias,
                            slot = %slot,
                            child = *child,
                            "Template declares no such slot, appending child at the template root"
                        );
                        self.report(
                            Severity::Error,
                            document,
                            Some(*child),
                            format!(
                                "Slot '{}' not found in template '{}'",
                                slot, template.alias
                            ),
                        );
                        live_id
                    }
                },
                None => live_id,
            };
            self.clone_node(document, children, *child, tree, destination, slots)?;
        }

        for (routed, slot) in &template.slot_usages {
            if own_children.contains(routed) {
                continue;
            }
            error!(
                alias = %template.alias,
                slot = %slot,
                node = *routed,
                "Slot usage on a node that is not a direct child of the template reference"
            );
            self.report(
                Severity::Error,
                document,
                Some(*routed),
                format!(
                    "Slot '{}' requested by a node that is not a direct child of '{}'",
                    slot, template.alias
                ),
            );
        }

        Ok(live_id)
    }

    /// Expand the referenced document under `container`.
    ///
    /// Returns its insertion points, or `None` when the container stays empty.
    fn clone_template(
        &mut self,
        document: &Document,
        id: NodeId,
        template: &TemplateInstance,
        tree: &mut LiveTree,
        container: LiveId,
    ) -> MaterializeResult<Option<SlotMap>> {
        let Some(path) = document.resolve_alias(&template.alias) else {
            warn!(alias = %template.alias, "Template alias is not registered, leaving an empty container");
            self.report(
                Severity::Warning,
                document,
                Some(id),
                format!("Template alias '{}' is not registered", template.alias),
            );
            return Ok(None);
        };

        if self.inclusion_stack.iter().any(|open| open == path) {
            let mut chain = self.inclusion_stack.clone();
            chain.push(path.to_string());
            error!(path, chain = ?chain, "Circular template inclusion detected");
            return Err(MaterializeError::CircularInclusion {
                path: path.to_string(),
                chain,
            });
        }

        let template_document = match self.loader.load(path) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(path, error = %err, "Template could not be loaded, leaving an empty container");
                self.report(
                    Severity::Warning,
                    document,
                    Some(id),
                    format!("Template '{}' could not be loaded: {}", path, err),
                );
                return Ok(None);
            }
        };

        debug!(alias = %template.alias, path, "Expanding template");
        let mut template_slots = SlotMap::new();
        self.inherited_overrides
            .push(template.attribute_overrides.clone());
        let expanded = self.clone_document(&template_document, tree, container, &mut template_slots);
        self.inherited_overrides.pop();
        expanded?;

        if self.options.apply_overrides {
            let mut applied = apply_overrides(tree, container, &template.attribute_overrides);
            for inherited in self.inherited_overrides.iter().rev() {
                applied += apply_overrides(tree, container, inherited);
            }
            debug!(alias = %template.alias, applied, "Applied attribute overrides");
        }

        Ok(Some(template_slots))
    }

    fn construct(&mut self, document: &Document, node: &Node) -> LiveNode {
        if let Some(live) = self.factory.create(&node.type_name) {
            return live;
        }
        warn!(type_name = %node.type_name, "No factory for type, building a plain element");
        self.report(
            Severity::Warning,
            document,
            Some(node.id),
            format!("No factory registered for '{}'", node.type_name),
        );
        LiveNode::new(node.type_name.clone())
    }

    fn apply_inline_style(&mut self, document: &Document, node: &Node, live: &mut LiveNode) {
        let Some(index) = node.rule_index else {
            return;
        };
        match document.style_rules().get(index) {
            Some(rule) => {
                for property in rule.iter() {
                    if property.name.is_empty() {
                        warn!(id = node.id, index, "Skipping style declaration without a name");
                        continue;
                    }
                    live.inline_style
                        .insert(property.name.clone(), property.value.clone());
                }
            }
            None => {
                warn!(id = node.id, index, "Style rule is missing, no inline style applied");
                self.report(
                    Severity::Warning,
                    document,
                    Some(node.id),
                    format!("Style rule {} is missing", index),
                );
            }
        }
    }

    fn report(
        &mut self,
        severity: Severity,
        document: &Document,
        node: Option<NodeId>,
        message: String,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            document: document.identity().to_string(),
            node,
            message,
        });
    }
}

/// Set each override on the descendants of `scope` carrying its element name
fn apply_overrides(tree: &mut LiveTree, scope: LiveId, overrides: &[AttributeOverride]) -> usize {
    let mut applied = 0;
    for o in overrides {
        for target in tree.find_by_name(scope, &o.element_name) {
            if let Some(node) = tree.get_mut(target) {
                node.attributes
                    .insert(o.attribute_name.clone(), o.value.clone());
                applied += 1;
            }
        }
    }
    applied
}
