//! Tag and namespace vocabulary of the markup format

use trellis_model::canonical_type_name;

/// Namespace of the core element library; its types are stored unqualified
pub const UI_NAMESPACE: &str = trellis_model::CORE_NAMESPACE;
pub const UI_PREFIX: &str = "ui";

/// Namespace of editor-only elements
pub const EDITOR_NAMESPACE: &str = "Trellis.Editor";
pub const EDITOR_PREFIX: &str = "uie";

pub const ROOT_TAG: &str = "UXML";
pub const TEMPLATE_TAG: &str = "Template";
pub const INSTANCE_TAG: &str = "Instance";
pub const STYLE_TAG: &str = "Style";
pub const OVERRIDES_TAG: &str = "AttributeOverrides";

pub const TEMPLATE_NAME_ATTRIBUTE: &str = "name";
pub const TEMPLATE_SRC_ATTRIBUTE: &str = "src";
/// Older files register templates with `path` instead of `src`
pub const TEMPLATE_LEGACY_PATH_ATTRIBUTE: &str = "path";
pub const INSTANCE_TEMPLATE_ATTRIBUTE: &str = "template";
pub const STYLE_SRC_ATTRIBUTE: &str = "src";
pub const OVERRIDE_ELEMENT_NAME_ATTRIBUTE: &str = "element-name";
pub const CLASS_ATTRIBUTE: &str = "class";
pub const STYLE_ATTRIBUTE: &str = "style";
pub const SLOT_ATTRIBUTE: &str = "slot";

/// Editor-only marker on the selected element; never persisted
pub const SELECTED_MARKER_ATTRIBUTE: &str = "editor-selected";

/// Map a type name to its tag: reserved namespaces get their prefix, others stay qualified
pub fn tag_for_type(type_name: &str) -> String {
    if let Some(local) = strip_namespace(type_name, UI_NAMESPACE) {
        return format!("{}:{}", UI_PREFIX, local);
    }
    if let Some(local) = strip_namespace(type_name, EDITOR_NAMESPACE) {
        return format!("{}:{}", EDITOR_PREFIX, local);
    }
    if !type_name.contains('.') {
        return format!("{}:{}", UI_PREFIX, type_name);
    }
    type_name.to_string()
}

/// Map a resolved tag (namespace URI + local name) back to a type name
pub fn type_for_tag(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(UI_NAMESPACE) => local.to_string(),
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, local),
        _ => canonical_type_name(local),
    }
}

fn strip_namespace<'a>(type_name: &'a str, namespace: &str) -> Option<&'a str> {
    type_name
        .strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|local| !local.is_empty() && !local.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_for_type() {
        assert_eq!(tag_for_type("Button"), "ui:Button");
        assert_eq!(tag_for_type("Trellis.UI.Button"), "ui:Button");
        assert_eq!(tag_for_type("Trellis.Editor.ColorField"), "uie:ColorField");
        assert_eq!(tag_for_type("Game.Hud.HealthBar"), "Game.Hud.HealthBar");
        // Nested namespaces under a reserved one keep their qualification
        assert_eq!(tag_for_type("Trellis.UI.Extra.Knob"), "Trellis.UI.Extra.Knob");
    }

    #[test]
    fn test_type_for_tag() {
        assert_eq!(type_for_tag(Some(UI_NAMESPACE), "Button"), "Button");
        assert_eq!(type_for_tag(Some(EDITOR_NAMESPACE), "ColorField"), "Trellis.Editor.ColorField");
        assert_eq!(type_for_tag(None, "Game.Hud.HealthBar"), "Game.Hud.HealthBar");
        assert_eq!(type_for_tag(None, "Trellis.UI.Button"), "Button");
    }

    #[test]
    fn test_editor_types_round_trip_through_tags() {
        for type_name in ["Label", "Trellis.Editor.ColorField", "Game.Hud.HealthBar"] {
            let tag = tag_for_type(type_name);
            let (namespace, local) = match tag.split_once(':') {
                Some((UI_PREFIX, local)) => (Some(UI_NAMESPACE), local),
                Some((EDITOR_PREFIX, local)) => (Some(EDITOR_NAMESPACE), local),
                _ => (None, tag.as_str()),
            };
            assert_eq!(type_for_tag(namespace, local), type_name);
        }
    }
}
