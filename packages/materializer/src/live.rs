//! Live node tree produced by materialization
//!
//! Arena of [`LiveNode`]s owned by a [`LiveTree`], linked by index. Every node
//! created from a document keeps a [`SourceLink`] back to the node it mirrors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use trellis_model::{NodeId, NAME_ATTRIBUTE};

/// Index of a node inside its [`LiveTree`]
pub type LiveId = usize;

/// Document path + node id a live node was built from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLink {
    pub document: String,
    pub node: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveNode {
    pub type_name: String,
    pub classes: Vec<String>,
    pub attributes: IndexMap<String, String>,
    pub inline_style: IndexMap<String, String>,
    pub parent: Option<LiveId>,
    pub children: Vec<LiveId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLink>,
}

impl LiveNode {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            classes: Vec::new(),
            attributes: IndexMap::new(),
            inline_style: IndexMap::new(),
            parent: None,
            children: Vec::new(),
            source: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get(NAME_ATTRIBUTE).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveTree {
    nodes: Vec<LiveNode>,
}

impl LiveTree {
    /// Create a tree holding only a root container of `root_type`
    pub fn new(root_type: impl Into<String>) -> Self {
        Self {
            nodes: vec![LiveNode::new(root_type)],
        }
    }

    pub fn root(&self) -> LiveId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: LiveId) -> Option<&LiveNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: LiveId) -> Option<&mut LiveNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: LiveId) -> bool {
        id < self.nodes.len()
    }

    /// Append `node` as the last child of `parent`. Returns `None` for an unknown parent.
    pub fn append(&mut self, parent: LiveId, mut node: LiveNode) -> Option<LiveId> {
        if !self.contains(parent) {
            return None;
        }
        let id = self.nodes.len();
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        Some(id)
    }

    pub fn children(&self, id: LiveId) -> &[LiveId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Descendants of `id` in depth-first order (excluding `id`)
    pub fn descendants(&self, id: LiveId) -> Vec<LiveId> {
        let mut out = Vec::new();
        let mut stack: Vec<LiveId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Descendants of `scope` whose `name` attribute equals `name`
    pub fn find_by_name(&self, scope: LiveId, name: &str) -> Vec<LiveId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.nodes[*id].name() == Some(name))
            .collect()
    }

    /// Every live node built from the given source node
    pub fn find_by_source(&self, document: &str, node: NodeId) -> Vec<LiveId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| {
                n.source
                    .as_ref()
                    .is_some_and(|s| s.document == document && s.node == node)
            })
            .map(|(id, _)| id)
            .collect()
    }

    pub fn count_type(&self, type_name: &str) -> usize {
        self.nodes.iter().filter(|n| n.type_name == type_name).count()
    }

    /// Structural equality of two subtrees, ignoring arena positions and source links
    pub fn same_shape(&self, id: LiveId, other: &LiveTree, other_id: LiveId) -> bool {
        let (Some(a), Some(b)) = (self.get(id), other.get(other_id)) else {
            return false;
        };
        if a.type_name != b.type_name
            || a.classes != b.classes
            || a.attributes != b.attributes
            || a.inline_style != b.inline_style
            || a.children.len() != b.children.len()
        {
            return false;
        }
        a.children
            .iter()
            .zip(&b.children)
            .all(|(x, y)| self.same_shape(*x, other, *y))
    }

    /// Indented outline, one `type .class #name` line per node
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(self.root(), 0, &mut out);
        out
    }

    fn write_outline(&self, id: LiveId, depth: usize, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&node.type_name);
        for class in &node.classes {
            out.push_str(" .");
            out.push_str(class);
        }
        if let Some(name) = node.name() {
            out.push_str(" #");
            out.push_str(name);
        }
        out.push('\n');
        for child in &node.children {
            self.write_outline(*child, depth + 1, out);
        }
    }
}
