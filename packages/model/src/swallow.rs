//! # Swallow (merge / transplant)
//!
//! Copies a donor document, or one donor subtree, under a target node.
//!
//! For every donor node:
//! - a fresh id is drawn (ids are never carried across documents)
//! - donor roots are re-parented onto the target, the rest follow the id map
//! - order values continue after the target's current last child
//! - its style rule is deep copied into this document's rule store
//! - slot usages are translated through the id map
//!
//! Usings referenced by the donor are copied when the alias is unknown here.
//! A full reorder pass runs at the end.

use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::node::{NodeId, ROOT_ID};
use crate::ordering::ORDER_INCREMENT;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Outcome of a swallow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwallowReport {
    /// Donor id -> id in this document
    pub id_map: HashMap<NodeId, NodeId>,
    /// New ids of the donor roots, in presentation order
    pub roots: Vec<NodeId>,
    /// Aliases newly registered in this document's usings
    pub added_usings: Vec<String>,
}

impl Document {
    /// Transplant `donor` (or only `donor_root` and its descendants) under `target`
    #[instrument(skip_all, fields(donor = %donor.identity(), target_node = target))]
    pub fn swallow(
        &mut self,
        target: NodeId,
        donor: &Document,
        donor_root: Option<NodeId>,
    ) -> ModelResult<SwallowReport> {
        if !self.is_valid_parent(target) {
            return Err(ModelError::InvalidParent { parent: target });
        }

        let (donor_roots, donor_order) = match donor_root {
            Some(root) => {
                donor.get(root)?;
                let mut order = vec![root];
                order.extend(donor.descendants(root));
                (vec![root], order)
            }
            None => (donor.root_nodes(), donor.depth_first()),
        };
        let donor_roots: HashSet<NodeId> = donor_roots.into_iter().collect();

        let mut report = SwallowReport::default();
        // Only the target's sibling group matters; the reorder pass at the end densifies it
        let mut next_order = self
            .children_of(target)
            .iter()
            .filter_map(|id| self.find(*id))
            .map(|n| n.order_in_document)
            .max()
            .unwrap_or(0);
        let mut referenced_aliases: Vec<String> = Vec::new();

        for donor_id in donor_order {
            let Some(source) = donor.find(donor_id) else {
                continue;
            };
            let is_donor_root = donor_roots.contains(&donor_id);

            let parent = if is_donor_root {
                target
            } else {
                match report.id_map.get(&source.parent_id) {
                    Some(mapped) => *mapped,
                    None => {
                        warn!(donor_id, "Donor node parent was not transplanted, skipping");
                        continue;
                    }
                }
            };

            let new_id = self.generate_id((parent != ROOT_ID).then_some(parent));
            report.id_map.insert(donor_id, new_id);

            let mut node = source.clone();
            node.id = new_id;
            node.parent_id = parent;
            next_order += ORDER_INCREMENT;
            node.order_in_document = next_order;

            node.rule_index = match source.rule_index {
                Some(index) => match donor.style_rules().get(index) {
                    Some(rule) => Some(self.style_rules_mut().push(rule.clone())),
                    None => {
                        warn!(donor_id, index, "Donor style rule missing, dropping inline style");
                        None
                    }
                },
                None => None,
            };

            if is_donor_root && target != ROOT_ID && !node.style_sheets.is_empty() {
                debug!(donor_id, "Stripping style sheets from transplanted root");
                node.style_sheets.clear();
            }

            if let Some(template) = node.template.as_ref() {
                if !referenced_aliases.contains(&template.alias) {
                    referenced_aliases.push(template.alias.clone());
                }
            }

            self.push_node(node);
            if is_donor_root {
                report.roots.push(new_id);
            }
        }

        self.translate_slot_usages(&report.id_map);

        for alias in referenced_aliases {
            if self.usings().contains_key(&alias) {
                continue;
            }
            match donor.resolve_alias(&alias) {
                Some(path) => {
                    let path = path.to_string();
                    self.add_using(alias.clone(), path);
                    report.added_usings.push(alias);
                }
                None => warn!(alias = %alias, "Donor references an unregistered template alias"),
            }
        }

        self.reorder_document();
        info!(
            nodes = report.id_map.len(),
            roots = report.roots.len(),
            "Swallowed donor document"
        );
        Ok(report)
    }

    /// Rewrite slot usage keys of freshly transplanted templates through `id_map`
    fn translate_slot_usages(&mut self, id_map: &HashMap<NodeId, NodeId>) {
        let new_ids: HashSet<NodeId> = id_map.values().copied().collect();
        for node in self.nodes_mut() {
            if !new_ids.contains(&node.id) {
                continue;
            }
            let Some(template) = node.template.as_mut() else {
                continue;
            };

            let mut translated = IndexMap::new();
            for (child, slot) in template.slot_usages.drain(..) {
                match id_map.get(&child) {
                    Some(mapped) => {
                        translated.insert(*mapped, slot);
                    }
                    None => {
                        warn!(child, slot = %slot, "Slot usage points outside the transplanted nodes, dropping");
                    }
                }
            }
            template.slot_usages = translated;
        }
    }
}
