//! Inline style rules
//!
//! A [`StyleRule`] is owned by exactly one node through `Node::rule_index`.
//! Rules are never shared: copying content copies the rule into a new slot.

use serde::{Deserialize, Serialize};

/// Single `property: value` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleProperty {
    pub name: String,
    pub value: String,
}

impl StyleProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of declarations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRule {
    pub properties: Vec<StyleProperty>,
}

impl StyleRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a declaration, keeping its original position when it already exists
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.properties.push(StyleProperty { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.properties.len();
        self.properties.retain(|p| p.name != name);
        before != self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleProperty> {
        self.properties.iter()
    }
}

/// Arena of inline rules; the index is the stable handle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleRuleStore {
    rules: Vec<StyleRule>,
}

impl StyleRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule and return its index
    pub fn push(&mut self, rule: StyleRule) -> usize {
        self.rules.push(rule);
        self.rules.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&StyleRule> {
        self.rules.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut StyleRule> {
        self.rules.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules.iter()
    }
}
