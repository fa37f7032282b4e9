use crate::error::{MarkupError, MarkupResult};
use crate::names::*;
use crate::style_text::{InlineStyleCodec, StyleRuleCodec};
use tracing::{debug, instrument, warn};
use trellis_common::resolve_reference;
use trellis_model::{Document, Node, NodeId, StyleSheetRef, ROOT_ID, UNSAVED_SHEET_PREFIX};

/// Parse markup text into a Document identified by the project path `identity`
pub fn parse(text: &str, identity: &str) -> MarkupResult<Document> {
    Reader::new().read(text, identity)
}

/// Reader builds the flattened model from markup text.
///
/// Template and style sheet references are resolved against the document's
/// own path. Content problems (malformed inline style, stray `slot`) are
/// logged and skipped; malformed XML and missing required attributes fail.
pub struct Reader<'c> {
    codec: &'c dyn StyleRuleCodec,
}

impl Reader<'static> {
    pub fn new() -> Self {
        Self {
            codec: &InlineStyleCodec,
        }
    }
}

impl Default for Reader<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c> Reader<'c> {
    pub fn with_codec(codec: &'c dyn StyleRuleCodec) -> Self {
        Self { codec }
    }

    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub fn read(&self, text: &str, identity: &str) -> MarkupResult<Document> {
        let xml = roxmltree::Document::parse(text)?;
        let root = xml.root_element();
        if root.tag_name().name() != ROOT_TAG {
            return Err(MarkupError::UnexpectedRoot {
                found: root.tag_name().name().to_string(),
            });
        }

        let mut document = Document::new(identity);
        for child in root.children().filter(|c| c.is_element()) {
            match child.tag_name().name() {
                TEMPLATE_TAG if is_core(&child) => {
                    self.read_template_registration(&child, &mut document)?
                }
                STYLE_TAG => {
                    warn!(
                        src = ?child.attribute(STYLE_SRC_ATTRIBUTE),
                        "Style sheet attached to the document root is not supported, skipping"
                    );
                }
                _ => {
                    self.read_element(&child, ROOT_ID, &mut document)?;
                }
            }
        }

        debug!(nodes = document.len(), usings = document.usings().len(), "Parsed document");
        Ok(document)
    }

    fn read_template_registration(
        &self,
        xml: &roxmltree::Node,
        document: &mut Document,
    ) -> MarkupResult<()> {
        let alias = required_attribute(xml, TEMPLATE_NAME_ATTRIBUTE)?;
        let src = xml
            .attribute(TEMPLATE_SRC_ATTRIBUTE)
            .or_else(|| xml.attribute(TEMPLATE_LEGACY_PATH_ATTRIBUTE))
            .ok_or_else(|| MarkupError::MissingAttribute {
                tag: xml.tag_name().name().to_string(),
                attribute: TEMPLATE_SRC_ATTRIBUTE.to_string(),
            })?;

        let path = resolve_reference(document.identity(), src)?;
        document.add_using(alias, path);
        Ok(())
    }

    fn read_element(
        &self,
        xml: &roxmltree::Node,
        parent: NodeId,
        document: &mut Document,
    ) -> MarkupResult<NodeId> {
        let tag = xml.tag_name();
        let mut node = if tag.name() == INSTANCE_TAG && is_core(xml) {
            Node::template_instance(required_attribute(xml, INSTANCE_TEMPLATE_ATTRIBUTE)?)
        } else {
            Node::element(type_for_tag(tag.namespace(), tag.name()))
        };

        let mut rule = None;
        let mut slot = None;
        for attribute in xml.attributes() {
            match attribute.name() {
                INSTANCE_TEMPLATE_ATTRIBUTE if node.is_template() => {}
                CLASS_ATTRIBUTE => {
                    node.classes
                        .extend(attribute.value().split_whitespace().map(str::to_string));
                }
                STYLE_ATTRIBUTE => match self.codec.read(attribute.value()) {
                    Ok(parsed) if !parsed.is_empty() => rule = Some(parsed),
                    Ok(_) => {}
                    Err(err) => warn!(type_name = %node.type_name, %err, "Skipping malformed inline style"),
                },
                SLOT_ATTRIBUTE => slot = Some(attribute.value()),
                name => {
                    node.attributes
                        .insert(name.to_string(), attribute.value().to_string());
                }
            }
        }

        let id = document.add_node(parent, None, node)?;

        if let Some(rule) = rule {
            document.assign_rule(id, rule)?;
        }

        if let Some(slot) = slot {
            if document.slot_owner(id).is_some() {
                document.assign_slot(id, slot)?;
            } else {
                warn!(id, slot, "slot attribute on a node that is not a template reference child, keeping it as a plain attribute");
                document
                    .get_mut(id)?
                    .attributes
                    .insert(SLOT_ATTRIBUTE.to_string(), slot.to_string());
            }
        }

        for child in xml.children().filter(|c| c.is_element()) {
            match child.tag_name().name() {
                STYLE_TAG => self.read_style_sheet(&child, id, document)?,
                OVERRIDES_TAG => self.read_overrides(&child, id, document)?,
                _ => {
                    self.read_element(&child, id, document)?;
                }
            }
        }

        Ok(id)
    }

    fn read_style_sheet(
        &self,
        xml: &roxmltree::Node,
        owner: NodeId,
        document: &mut Document,
    ) -> MarkupResult<()> {
        let src = required_attribute(xml, STYLE_SRC_ATTRIBUTE)?;
        let path = if src.starts_with(UNSAVED_SHEET_PREFIX) {
            src.to_string()
        } else {
            resolve_reference(document.identity(), src)?
        };

        document
            .get_mut(owner)?
            .style_sheets
            .push(StyleSheetRef::new(path));
        Ok(())
    }

    fn read_overrides(
        &self,
        xml: &roxmltree::Node,
        owner: NodeId,
        document: &mut Document,
    ) -> MarkupResult<()> {
        let element_name = required_attribute(xml, OVERRIDE_ELEMENT_NAME_ATTRIBUTE)?;
        let Some(template) = document.get_mut(owner)?.template.as_mut() else {
            warn!(owner, element_name, "AttributeOverrides outside a template reference, skipping");
            return Ok(());
        };

        for attribute in xml.attributes() {
            if attribute.name() == OVERRIDE_ELEMENT_NAME_ATTRIBUTE {
                continue;
            }
            template.set_override(element_name, attribute.name(), attribute.value());
        }
        Ok(())
    }
}

/// Structural tags may be written unprefixed or in the core namespace
fn is_core(xml: &roxmltree::Node) -> bool {
    matches!(xml.tag_name().namespace(), None | Some(UI_NAMESPACE))
}

fn required_attribute<'a>(xml: &roxmltree::Node<'a, '_>, name: &str) -> MarkupResult<&'a str> {
    xml.attribute(name).ok_or_else(|| MarkupError::MissingAttribute {
        tag: xml.tag_name().name().to_string(),
        attribute: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_model::TemplateInstance;

    const CARD_SCREEN: &str = r#"<ui:UXML xmlns:ui="Trellis.UI" xmlns:uie="Trellis.Editor">
    <ui:Template name="Card" src="../common/card.uxml" />
    <ui:Template name="Legacy" path="/kit/legacy.uxml" />
    <ui:VisualElement name="panel" class="panel  wide" style="width: 100px; color: red;">
        <Style src="../styles/main.uss" />
        <ui:Instance template="Card">
            <AttributeOverrides element-name="title" text="Hello" tooltip="Hi" />
            <ui:Label text="Body" slot="content" />
        </ui:Instance>
        <uie:ColorField />
        <Game.Hud.HealthBar max="10" />
    </ui:VisualElement>
</ui:UXML>
"#;

    fn child_types(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children_of(parent)
            .into_iter()
            .map(|id| doc.find(id).unwrap().type_name.clone())
            .collect()
    }

    #[test]
    fn test_parse_registrations_resolved_against_document_path() {
        let doc = parse(CARD_SCREEN, "/ui/screens/main.uxml").unwrap();
        assert_eq!(doc.resolve_alias("Card"), Some("/ui/common/card.uxml"));
        assert_eq!(doc.resolve_alias("Legacy"), Some("/kit/legacy.uxml"));
    }

    #[test]
    fn test_parse_elements_classes_and_inline_style() {
        let doc = parse(CARD_SCREEN, "/ui/screens/main.uxml").unwrap();
        let roots = doc.root_nodes();
        assert_eq!(roots.len(), 1);

        let panel = doc.find(roots[0]).unwrap();
        assert_eq!(panel.type_name, "VisualElement");
        assert_eq!(panel.name(), Some("panel"));
        let classes: Vec<&str> = panel.classes.iter().map(String::as_str).collect();
        assert_eq!(classes, vec!["panel", "wide"]);
        assert_eq!(panel.style_sheets, vec![StyleSheetRef::new("/ui/styles/main.uss")]);

        let rule = doc.rule_for(panel.id).unwrap();
        assert_eq!(rule.get("width"), Some("100px"));
        assert_eq!(rule.get("color"), Some("red"));

        assert_eq!(
            child_types(&doc, panel.id),
            vec![
                TemplateInstance::TYPE_NAME,
                "Trellis.Editor.ColorField",
                "Game.Hud.HealthBar"
            ]
        );
    }

    #[test]
    fn test_parse_template_reference_slots_and_overrides() {
        let doc = parse(CARD_SCREEN, "/ui/screens/main.uxml").unwrap();
        let (card, template) = doc.template_instances().next().unwrap();
        assert_eq!(template.alias, "Card");
        assert_eq!(template.attribute_overrides.len(), 2);
        assert_eq!(template.attribute_overrides[1].attribute_name, "tooltip");

        let label = doc.children_of(card.id)[0];
        assert_eq!(doc.slot_of(label), Some("content"));
        assert!(!doc.find(label).unwrap().attributes.contains_key(SLOT_ATTRIBUTE));
    }

    #[test]
    fn test_malformed_inline_style_is_skipped() {
        let text = r#"<ui:UXML xmlns:ui="Trellis.UI"><ui:Label style="width 100px" text="x" /></ui:UXML>"#;
        let doc = parse(text, "/ui/main.uxml").unwrap();
        let label = doc.find(doc.root_nodes()[0]).unwrap();
        assert_eq!(label.rule_index, None);
        assert!(doc.style_rules().is_empty());
        assert_eq!(label.attributes.get("text").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_root_level_style_is_ignored() {
        let text = r#"<ui:UXML xmlns:ui="Trellis.UI"><Style src="main.uss" /><ui:Label /></ui:UXML>"#;
        let doc = parse(text, "/ui/main.uxml").unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.find(doc.root_nodes()[0]).unwrap().style_sheets.is_empty());
    }

    #[test]
    fn test_stray_slot_kept_as_attribute() {
        let text = r#"<ui:UXML xmlns:ui="Trellis.UI"><ui:Label slot="content" /></ui:UXML>"#;
        let doc = parse(text, "/ui/main.uxml").unwrap();
        let label = doc.find(doc.root_nodes()[0]).unwrap();
        assert_eq!(label.attributes.get(SLOT_ATTRIBUTE).map(String::as_str), Some("content"));
    }

    #[test]
    fn test_slot_on_template_grandchild_kept_as_attribute() {
        let text = r#"<ui:UXML xmlns:ui="Trellis.UI">
    <ui:Template name="Card" src="card.uxml" />
    <ui:Instance template="Card">
        <ui:VisualElement>
            <ui:Label slot="content" />
        </ui:VisualElement>
    </ui:Instance>
</ui:UXML>"#;
        let doc = parse(text, "/ui/main.uxml").unwrap();
        let (_, template) = doc.template_instances().next().unwrap();
        assert!(template.slot_usages.is_empty());

        let label = doc.elements().find(|n| n.type_name == "Label").unwrap();
        assert_eq!(doc.slot_of(label.id), None);
        assert_eq!(label.attributes.get(SLOT_ATTRIBUTE).map(String::as_str), Some("content"));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            parse("<ui:Panel xmlns:ui=\"Trellis.UI\" />", "/ui/main.uxml"),
            Err(MarkupError::UnexpectedRoot { .. })
        ));
        assert!(matches!(
            parse("<ui:UXML xmlns:ui=\"Trellis.UI\"><ui:Label>", "/ui/main.uxml"),
            Err(MarkupError::Xml(_))
        ));
        assert!(matches!(
            parse(
                "<ui:UXML xmlns:ui=\"Trellis.UI\"><ui:Instance /></ui:UXML>",
                "/ui/main.uxml"
            ),
            Err(MarkupError::MissingAttribute { .. })
        ));
        assert!(matches!(
            parse(
                "<ui:UXML xmlns:ui=\"Trellis.UI\"><ui:Template name=\"A\" src=\"../../x.uxml\" /></ui:UXML>",
                "/ui/main.uxml"
            ),
            Err(MarkupError::Path(_))
        ));
    }
}
