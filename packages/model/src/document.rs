//! # Node Store
//!
//! [`Document`] owns the flattened node arena of one UI document together with
//! its style rule arena and its template usings.
//!
//! ## Invariants
//!
//! - `Node::id` is unique within the document and never `ROOT_ID`
//! - `Node::parent_id` is `ROOT_ID` or the id of a node in this document
//! - `Node::rule_index` is `None` or a valid index into `style_rules`
//!
//! Removing a node does not cascade: callers remove descendants first (or use
//! [`Document::remove_subtree`]). Adjacency is rebuilt on every request since
//! documents are editor sized.

use crate::error::{ModelError, ModelResult};
use crate::id_generator::IdGenerator;
use crate::node::{canonical_type_name, Node, NodeId, TemplateInstance, ROOT_ID};
use crate::style::{StyleRule, StyleRuleStore};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One editable UI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Project path (or any stable name for in-memory documents)
    identity: String,
    nodes: Vec<Node>,
    style_rules: StyleRuleStore,
    /// Template alias -> referenced document path
    usings: IndexMap<String, String>,
    id_generator: IdGenerator,
}

impl Document {
    pub fn new(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            id_generator: IdGenerator::new(&identity),
            identity,
            nodes: Vec::new(),
            style_rules: StyleRuleStore::new(),
            usings: IndexMap::new(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Rename the document (e.g. "save as"). Existing ids are kept.
    pub fn set_identity(&mut self, identity: impl Into<String>) {
        self.identity = identity.into();
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Push an already-identified node without touching its linkage
    pub(crate) fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Plain element nodes, arena order
    pub fn elements(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.template.is_none())
    }

    /// Template-reference nodes, arena order
    pub fn template_instances(&self) -> impl Iterator<Item = (&Node, &TemplateInstance)> {
        self.nodes
            .iter()
            .filter_map(|n| n.template.as_ref().map(|t| (n, t)))
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn get(&self, id: NodeId) -> ModelResult<&Node> {
        self.find(id).ok_or(ModelError::NodeNotFound { id })
    }

    pub fn get_mut(&mut self, id: NodeId) -> ModelResult<&mut Node> {
        self.find_mut(id).ok_or(ModelError::NodeNotFound { id })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// `true` for the root sentinel and for every existing node
    pub fn is_valid_parent(&self, id: NodeId) -> bool {
        id == ROOT_ID || self.contains(id)
    }

    /// Build `parent_id -> children` with children in presentation order.
    ///
    /// Ties on `order_in_document` fall back to arena order.
    pub fn children_map(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut grouped: HashMap<NodeId, Vec<(i64, usize, NodeId)>> = HashMap::new();
        for (position, node) in self.nodes.iter().enumerate() {
            grouped
                .entry(node.parent_id)
                .or_default()
                .push((node.order_in_document, position, node.id));
        }

        grouped
            .into_iter()
            .map(|(parent, mut children)| {
                children.sort();
                (parent, children.into_iter().map(|(_, _, id)| id).collect())
            })
            .collect()
    }

    /// Children of `parent` in presentation order
    pub fn children_of(&self, parent: NodeId) -> Vec<NodeId> {
        let mut children: Vec<(i64, usize, NodeId)> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent_id == parent)
            .map(|(position, n)| (n.order_in_document, position, n.id))
            .collect();
        children.sort();
        children.into_iter().map(|(_, _, id)| id).collect()
    }

    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.children_of(ROOT_ID)
    }

    /// All descendants of `id` in depth-first presentation order (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let map = self.children_map();
        let mut out = Vec::new();
        collect_descendants(&map, id, &mut out);
        out
    }

    /// Every node reachable from the root, depth-first in presentation order
    pub fn depth_first(&self) -> Vec<NodeId> {
        self.descendants(ROOT_ID)
    }

    /// `true` when `node` sits somewhere below `ancestor`
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = match self.find(node) {
            Some(n) => n.parent_id,
            None => return false,
        };
        // Bounded walk so a corrupted (cyclic) parent chain cannot spin forever
        for _ in 0..=self.nodes.len() {
            if current == ancestor {
                return true;
            }
            if current == ROOT_ID {
                return false;
            }
            current = match self.find(current) {
                Some(n) => n.parent_id,
                None => return false,
            };
        }
        false
    }

    /// Nearest ancestor that is a template reference
    pub fn enclosing_template(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.find(id)?.parent_id;
        for _ in 0..=self.nodes.len() {
            if current == ROOT_ID {
                return None;
            }
            let node = self.find(current)?;
            if node.is_template() {
                return Some(node.id);
            }
            current = node.parent_id;
        }
        None
    }

    /// Template reference that can route `id` into one of its slots: its direct parent
    pub fn slot_owner(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.find(id)?.parent_id;
        self.find(parent)
            .filter(|node| node.is_template())
            .map(|node| node.id)
    }

    /// Draw a fresh id that is not in use
    pub fn generate_id(&mut self, parent: Option<NodeId>) -> NodeId {
        loop {
            let id = self.id_generator.next_id(parent);
            if id != ROOT_ID && !self.contains(id) {
                return id;
            }
            debug!(id, "Generated id collided, drawing again");
        }
    }

    /// Insert `node` under `parent`, appended or at `index` among its siblings.
    ///
    /// The node's `id`, `parent_id` and `order_in_document` are overwritten.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        index: Option<usize>,
        mut node: Node,
    ) -> ModelResult<NodeId> {
        if !self.is_valid_parent(parent) {
            return Err(ModelError::InvalidParent { parent });
        }

        let id = self.generate_id((parent != ROOT_ID).then_some(parent));
        node.id = id;
        node.parent_id = parent;
        node.type_name = canonical_type_name(&node.type_name);
        node.order_in_document = self.append_order(parent);
        self.nodes.push(node);

        if let Some(index) = index {
            self.place_at_index(id, index);
        }

        debug!(id, parent, ?index, "Added node");
        Ok(id)
    }

    /// Remove a single node. Its children are left orphaned.
    pub fn remove_node(&mut self, id: NodeId) -> ModelResult<Node> {
        let position = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(ModelError::NodeNotFound { id })?;
        self.forget_slot_usage(id);
        Ok(self.nodes.remove(position))
    }

    /// Remove a node and every descendant, deepest first
    pub fn remove_subtree(&mut self, id: NodeId) -> ModelResult<Vec<Node>> {
        if !self.contains(id) {
            return Err(ModelError::NodeNotFound { id });
        }
        let mut doomed = self.descendants(id);
        doomed.reverse();
        doomed.push(id);

        let mut removed = Vec::with_capacity(doomed.len());
        for node_id in doomed {
            removed.push(self.remove_node(node_id)?);
        }
        Ok(removed)
    }

    /// Drop `id` from the slot usages of every template reference
    pub(crate) fn forget_slot_usage(&mut self, id: NodeId) {
        for node in &mut self.nodes {
            if let Some(template) = node.template.as_mut() {
                template.slot_usages.shift_remove(&id);
            }
        }
    }

    pub fn style_rules(&self) -> &StyleRuleStore {
        &self.style_rules
    }

    pub fn style_rules_mut(&mut self) -> &mut StyleRuleStore {
        &mut self.style_rules
    }

    /// The inline rule of `id`, if it has one
    pub fn rule_for(&self, id: NodeId) -> Option<&StyleRule> {
        let index = self.find(id)?.rule_index?;
        self.style_rules.get(index)
    }

    /// Set one inline declaration, allocating the node's rule on first use
    pub fn set_inline_style(
        &mut self,
        id: NodeId,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> ModelResult<()> {
        let existing = self.get(id)?.rule_index;
        let index = match existing {
            Some(index) if self.style_rules.get(index).is_some() => index,
            Some(index) => return Err(ModelError::StyleRuleNotFound { index }),
            None => {
                let index = self.style_rules.push(StyleRule::new());
                self.get_mut(id)?.rule_index = Some(index);
                index
            }
        };

        self.style_rules
            .get_mut(index)
            .ok_or(ModelError::StyleRuleNotFound { index })?
            .set(property, value);
        Ok(())
    }

    /// Remove one inline declaration. Returns whether anything was removed.
    pub fn clear_inline_style(&mut self, id: NodeId, property: &str) -> ModelResult<bool> {
        let Some(index) = self.get(id)?.rule_index else {
            return Ok(false);
        };
        let rule = self
            .style_rules
            .get_mut(index)
            .ok_or(ModelError::StyleRuleNotFound { index })?;
        Ok(rule.remove(property))
    }

    /// Give `id` its own copy of `rule`
    pub fn assign_rule(&mut self, id: NodeId, rule: StyleRule) -> ModelResult<usize> {
        self.get(id)?;
        let index = self.style_rules.push(rule);
        self.get_mut(id)?.rule_index = Some(index);
        Ok(index)
    }

    pub fn usings(&self) -> &IndexMap<String, String> {
        &self.usings
    }

    /// Register (or repoint) a template alias
    pub fn add_using(&mut self, alias: impl Into<String>, path: impl Into<String>) {
        self.usings.insert(alias.into(), path.into());
    }

    pub fn remove_using(&mut self, alias: &str) -> Option<String> {
        self.usings.shift_remove(alias)
    }

    /// Rename a template alias in place and repoint every reference using it.
    ///
    /// Returns the number of template references updated.
    pub fn rename_using(&mut self, old_alias: &str, new_alias: &str) -> ModelResult<usize> {
        let Some(index) = self.usings.get_index_of(old_alias) else {
            return Err(ModelError::UnknownAlias {
                alias: old_alias.to_string(),
            });
        };
        if old_alias == new_alias {
            return Ok(0);
        }
        if self.usings.contains_key(new_alias) {
            return Err(ModelError::DuplicateAlias {
                alias: new_alias.to_string(),
            });
        }

        if let Some(path) = self.usings.shift_remove(old_alias) {
            self.usings.shift_insert(index, new_alias.to_string(), path);
        }

        let mut updated = 0;
        for node in &mut self.nodes {
            if let Some(template) = node.template.as_mut() {
                if template.alias == old_alias {
                    template.alias = new_alias.to_string();
                    updated += 1;
                }
            }
        }
        debug!(old_alias, new_alias, updated, "Renamed using");
        Ok(updated)
    }

    /// Path registered for `alias`
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.usings.get(alias).map(String::as_str)
    }

    pub fn template_mut(&mut self, id: NodeId) -> ModelResult<&mut TemplateInstance> {
        self.get_mut(id)?
            .template
            .as_mut()
            .ok_or(ModelError::NotATemplate { id })
    }

    /// Route the template child `child` into the slot named `slot`.
    ///
    /// Only direct children of a template reference can be routed.
    pub fn assign_slot(&mut self, child: NodeId, slot: impl Into<String>) -> ModelResult<()> {
        self.get(child)?;
        let template_id = self
            .slot_owner(child)
            .ok_or(ModelError::NotATemplateChild { id: child })?;
        self.template_mut(template_id)?
            .slot_usages
            .insert(child, slot.into());
        Ok(())
    }

    /// Slot assigned to `id` by its enclosing template reference
    pub fn slot_of(&self, id: NodeId) -> Option<&str> {
        let template_id = self.slot_owner(id)?;
        self.find(template_id)?
            .template
            .as_ref()?
            .slot_usages
            .get(&id)
            .map(String::as_str)
    }
}

fn collect_descendants(map: &HashMap<NodeId, Vec<NodeId>>, id: NodeId, out: &mut Vec<NodeId>) {
    if let Some(children) = map.get(&id) {
        for child in children {
            out.push(*child);
            collect_descendants(map, *child, out);
        }
    }
}
