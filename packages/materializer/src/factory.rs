use crate::live::LiveNode;
use std::collections::HashMap;
use trellis_model::{canonical_type_name, TemplateInstance};

/// Host-provided construction of live nodes, keyed by type name
pub trait NodeFactory {
    /// Build an empty live node for `type_name`, or `None` when the type is unknown
    fn create(&self, type_name: &str) -> Option<LiveNode>;
}

type Constructor = Box<dyn Fn(&str) -> LiveNode>;

/// Registry of constructors per type name
pub struct FactoryRegistry {
    constructors: HashMap<String, Constructor>,
    /// Build plain nodes for unregistered types instead of rejecting them
    permissive: bool,
}

/// Element types of the core library
pub const CORE_TYPES: &[&str] = &[
    "VisualElement",
    "Label",
    "Button",
    "Image",
    "Toggle",
    "TextField",
    "ScrollView",
    "ListView",
    "Foldout",
    "Slider",
    TemplateInstance::TYPE_NAME,
];

impl FactoryRegistry {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
            permissive: false,
        }
    }

    /// Registry pre-populated with [`CORE_TYPES`]
    pub fn with_core_types() -> Self {
        let mut registry = Self::new();
        for type_name in CORE_TYPES {
            registry.register_plain(*type_name);
        }
        registry
    }

    /// Accepts every type name
    pub fn permissive() -> Self {
        Self {
            constructors: HashMap::new(),
            permissive: true,
        }
    }

    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(&str) -> LiveNode + 'static,
    {
        let type_name: String = type_name.into();
        self.constructors
            .insert(canonical_type_name(&type_name), Box::new(constructor));
    }

    /// Register a type that needs no construction beyond its name
    pub fn register_plain(&mut self, type_name: impl Into<String>) {
        self.register(type_name, |name: &str| LiveNode::new(name));
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.constructors
            .contains_key(&canonical_type_name(type_name))
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::with_core_types()
    }
}

impl NodeFactory for FactoryRegistry {
    fn create(&self, type_name: &str) -> Option<LiveNode> {
        let type_name = canonical_type_name(type_name);
        let type_name = type_name.as_str();
        match self.constructors.get(type_name) {
            Some(constructor) => Some(constructor(type_name)),
            None if self.permissive => Some(LiveNode::new(type_name)),
            None => None,
        }
    }
}
