//! # Ordering & Identity Engine
//!
//! Sibling order lives in `Node::order_in_document`. Values are sparse so a
//! single move only touches the moved node:
//!
//! - append: `(sibling_count + 1) * ORDER_INCREMENT`
//! - move/insert to `index`: `index * ORDER_INCREMENT`, nudged by half an
//!   increment towards the side the node is coming from
//! - [`Document::reorder_document`]: collapse every sibling group back to
//!   `position * ORDER_INCREMENT`
//!
//! An index move first canonicalizes the destination group so the base value
//! always lines up with the sibling currently at `index`. Repeated moves can
//! therefore never exhaust the spacing between two siblings.

use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::node::{NodeId, ROOT_ID};
use tracing::{debug, instrument};

pub const ORDER_INCREMENT: i64 = 10;
pub const ORDER_HALF_INCREMENT: i64 = ORDER_INCREMENT / 2;

impl Document {
    /// Order value that places a new node after every current child of `parent`.
    ///
    /// `(sibling_count + 1) * ORDER_INCREMENT`, raised past the largest sibling
    /// order when a group has not been reordered since a removal.
    pub(crate) fn append_order(&self, parent: NodeId) -> i64 {
        let mut sibling_count = 0i64;
        let mut last = i64::MIN;
        for node in self.nodes().iter().filter(|n| n.parent_id == parent) {
            sibling_count += 1;
            last = last.max(node.order_in_document);
        }

        let appended = (sibling_count + 1) * ORDER_INCREMENT;
        if sibling_count > 0 && appended <= last {
            last + ORDER_INCREMENT
        } else {
            appended
        }
    }

    /// Rewrite the orders of `parent`'s children to `position * ORDER_INCREMENT`
    fn canonicalize_group(&mut self, parent: NodeId) {
        let children = self.children_of(parent);
        for (position, child) in children.into_iter().enumerate() {
            if let Some(node) = self.find_mut(child) {
                node.order_in_document = position as i64 * ORDER_INCREMENT;
            }
        }
    }

    /// Reposition `id` among its current siblings so it ends up at `index`
    pub(crate) fn place_at_index(&mut self, id: NodeId, index: usize) {
        let Some(parent) = self.find(id).map(|n| n.parent_id) else {
            return;
        };

        self.canonicalize_group(parent);
        let siblings = self.children_of(parent);
        let current = siblings.iter().position(|s| *s == id);

        // `siblings` includes the node itself, so the last reachable slot is len - 1
        let index = index.min(siblings.len().saturating_sub(1));
        let base = index as i64 * ORDER_INCREMENT;
        let order = match current {
            Some(position) if position < index => base + ORDER_HALF_INCREMENT,
            _ => base - ORDER_HALF_INCREMENT,
        };

        if let Some(node) = self.find_mut(id) {
            node.order_in_document = order;
        }
    }

    /// Move `id` to `index` among its current siblings
    pub fn move_to_index(&mut self, id: NodeId, index: usize) -> ModelResult<()> {
        self.get(id)?;
        self.place_at_index(id, index);
        Ok(())
    }

    /// Move `id` under `new_parent`, appended or at `index`.
    ///
    /// A top-level node moving under a parent loses its attached style sheets,
    /// which are only meaningful at root scope.
    #[instrument(skip(self))]
    pub fn reparent(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        index: Option<usize>,
    ) -> ModelResult<()> {
        let old_parent = self.get(id)?.parent_id;
        if !self.is_valid_parent(new_parent) {
            return Err(ModelError::InvalidParent { parent: new_parent });
        }
        if new_parent == id || self.is_descendant_of(new_parent, id) {
            return Err(ModelError::CycleDetected {
                node: id,
                parent: new_parent,
            });
        }

        if old_parent != new_parent {
            let order = self.append_order(new_parent);
            let node = self.get_mut(id)?;
            node.parent_id = new_parent;
            node.order_in_document = order;

            if old_parent == ROOT_ID && new_parent != ROOT_ID && !node.style_sheets.is_empty() {
                debug!(
                    id,
                    sheets = node.style_sheets.len(),
                    "Stripping style sheets from node leaving root scope"
                );
                node.style_sheets.clear();
            }

            // Slot routing only survives while the node stays a child of the same template
            let still_routed = self
                .slot_owner(id)
                .and_then(|t| self.find(t))
                .and_then(|t| t.template.as_ref())
                .is_some_and(|t| t.slot_usages.contains_key(&id));
            if !still_routed {
                self.forget_slot_usage(id);
            }
        }

        if let Some(index) = index {
            self.place_at_index(id, index);
        } else if old_parent == new_parent {
            let order = self.append_order(new_parent);
            self.get_mut(id)?.order_in_document = order;
        }

        Ok(())
    }

    /// Collapse every sibling group to dense, distinct order values.
    ///
    /// Runs depth-first from the root; required after structural edits.
    pub fn reorder_document(&mut self) {
        let map = self.children_map();
        let mut stack = vec![ROOT_ID];
        let mut assigned = 0usize;

        while let Some(parent) = stack.pop() {
            let Some(children) = map.get(&parent) else {
                continue;
            };
            for (position, child) in children.iter().enumerate() {
                if let Some(node) = self.find_mut(*child) {
                    node.order_in_document = position as i64 * ORDER_INCREMENT;
                    assigned += 1;
                }
            }
            stack.extend(children.iter().rev().copied());
        }

        debug!(nodes = assigned, "Reordered document");
    }
}
