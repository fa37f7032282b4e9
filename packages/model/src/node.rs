use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Process-unique node identity within a document
pub type NodeId = u64;

/// Parent id of top-level nodes
pub const ROOT_ID: NodeId = 0;

/// Attribute declaring a named insertion point inside a template document
pub const SLOT_NAME_ATTRIBUTE: &str = "slot-name";

/// Attribute naming an element so overrides can target it
pub const NAME_ATTRIBUTE: &str = "name";

/// Style sheets that only exist in memory carry this prefix instead of a project path
pub const UNSAVED_SHEET_PREFIX: &str = "unsaved://";

/// Namespace of the core element library; its types are stored unqualified
pub const CORE_NAMESPACE: &str = "Trellis.UI";

/// Canonical spelling of a type name: `Trellis.UI.Button` is stored as `Button`
pub fn canonical_type_name(type_name: &str) -> String {
    type_name
        .strip_prefix(CORE_NAMESPACE)
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|local| !local.is_empty() && !local.contains('.'))
        .unwrap_or(type_name)
        .to_string()
}

/// One markup tag in the flattened tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub parent_id: NodeId,
    /// Sibling ordering key. Not contiguous and meaningless across parents.
    pub order_in_document: i64,
    pub type_name: String,
    pub classes: IndexSet<String>,
    /// Ordinary attributes; `class` and `style` are modeled separately
    pub attributes: IndexMap<String, String>,
    pub rule_index: Option<usize>,
    /// Attached style sheets. Only meaningful on top-level nodes.
    pub style_sheets: Vec<StyleSheetRef>,
    /// Present when this node instantiates another document
    pub template: Option<TemplateInstance>,
}

impl Node {
    /// Create a detached element. Identity, parent and order are assigned on insertion.
    pub fn element(type_name: impl Into<String>) -> Self {
        let type_name: String = type_name.into();
        Self {
            id: 0,
            parent_id: ROOT_ID,
            order_in_document: 0,
            type_name: canonical_type_name(&type_name),
            classes: IndexSet::new(),
            attributes: IndexMap::new(),
            rule_index: None,
            style_sheets: Vec::new(),
            template: None,
        }
    }

    /// Create a detached template reference to `alias`
    pub fn template_instance(alias: impl Into<String>) -> Self {
        let mut node = Self::element(TemplateInstance::TYPE_NAME);
        node.template = Some(TemplateInstance::new(alias));
        node
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_style_sheet(mut self, path: impl Into<String>) -> Self {
        self.style_sheets.push(StyleSheetRef::new(path));
        self
    }

    /// Slot this node declares when its document is used as a template
    pub fn declared_slot(&self) -> Option<&str> {
        self.attributes.get(SLOT_NAME_ATTRIBUTE).map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_ID
    }

    pub fn is_template(&self) -> bool {
        self.template.is_some()
    }

    /// The declared element name, used to target attribute overrides
    pub fn name(&self) -> Option<&str> {
        self.attributes.get(NAME_ATTRIBUTE).map(String::as_str)
    }
}

/// Data carried only by template-reference nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateInstance {
    /// Key into the document's usings table
    pub alias: String,
    /// Descendant node id -> slot name it is inserted into
    pub slot_usages: IndexMap<NodeId, String>,
    pub attribute_overrides: Vec<AttributeOverride>,
}

impl TemplateInstance {
    /// Live type produced for every template reference
    pub const TYPE_NAME: &'static str = "TemplateContainer";

    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            slot_usages: IndexMap::new(),
            attribute_overrides: Vec::new(),
        }
    }

    /// Set (or replace) the override of `attribute_name` on descendants named `element_name`
    pub fn set_override(
        &mut self,
        element_name: impl Into<String>,
        attribute_name: impl Into<String>,
        value: impl Into<String>,
    ) {
        let element_name = element_name.into();
        let attribute_name = attribute_name.into();
        let value = value.into();

        if let Some(existing) = self
            .attribute_overrides
            .iter_mut()
            .find(|o| o.element_name == element_name && o.attribute_name == attribute_name)
        {
            existing.value = value;
        } else {
            self.attribute_overrides.push(AttributeOverride {
                element_name,
                attribute_name,
                value,
            });
        }
    }

    pub fn remove_override(&mut self, element_name: &str, attribute_name: &str) -> bool {
        let before = self.attribute_overrides.len();
        self.attribute_overrides
            .retain(|o| !(o.element_name == element_name && o.attribute_name == attribute_name));
        before != self.attribute_overrides.len()
    }

    /// Overrides grouped by target element name, first-seen order
    pub fn grouped_overrides(&self) -> IndexMap<&str, Vec<&AttributeOverride>> {
        let mut groups: IndexMap<&str, Vec<&AttributeOverride>> = IndexMap::new();
        for o in &self.attribute_overrides {
            groups.entry(o.element_name.as_str()).or_default().push(o);
        }
        groups
    }
}

/// Attribute value applied to a named descendant after the template is materialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeOverride {
    pub element_name: String,
    pub attribute_name: String,
    pub value: String,
}

/// Reference to an external style sheet attached to a top-level node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSheetRef {
    pub path: String,
}

impl StyleSheetRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn unsaved(name: &str) -> Self {
        Self::new(format!("{}{}", UNSAVED_SHEET_PREFIX, name))
    }

    pub fn is_unsaved(&self) -> bool {
        self.path.starts_with(UNSAVED_SHEET_PREFIX)
    }
}
