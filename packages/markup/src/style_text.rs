//! Inline style text: `prop: value; prop: value;`

use crate::error::{MarkupError, MarkupResult};
use trellis_model::{StyleProperty, StyleRule};

/// Reads and writes the text form of a [`StyleRule`]
pub trait StyleRuleCodec {
    fn read(&self, text: &str) -> MarkupResult<StyleRule>;

    fn write(&self, rule: &StyleRule) -> MarkupResult<String>;
}

/// Single-line codec used for the `style` attribute
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineStyleCodec;

impl StyleRuleCodec for InlineStyleCodec {
    fn read(&self, text: &str) -> MarkupResult<StyleRule> {
        let mut rule = StyleRule::new();
        for declaration in text.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }

            let (name, value) =
                declaration
                    .split_once(':')
                    .ok_or_else(|| MarkupError::MalformedStyle {
                        declaration: declaration.to_string(),
                        reason: "missing ':'".to_string(),
                    })?;
            let property = StyleProperty::new(name.trim(), value.trim());
            validate(&property)?;
            rule.set(property.name, property.value);
        }
        Ok(rule)
    }

    fn write(&self, rule: &StyleRule) -> MarkupResult<String> {
        let mut parts = Vec::with_capacity(rule.properties.len());
        for property in rule.iter() {
            validate(property)?;
            parts.push(format!("{}: {};", property.name, property.value));
        }
        Ok(parts.join(" "))
    }
}

fn validate(property: &StyleProperty) -> MarkupResult<()> {
    let reason = if property.name.is_empty() {
        Some("empty property name")
    } else if property.value.is_empty() {
        Some("empty value")
    } else if property.name.contains([':', ';']) || property.value.contains(';') {
        Some("declaration separator inside declaration")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(MarkupError::MalformedStyle {
            declaration: format!("{}: {}", property.name, property.value),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
