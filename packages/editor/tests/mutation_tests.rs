//! Mutations applied through the editor handle

use anyhow::Result;
use trellis_editor::{
    Change, EditorDocument, EditorError, Mutation, MutationError, Node, NodeId, Notification,
    RecordingSink, ROOT_ID,
};

const SOURCE: &str = r#"<ui:UXML xmlns:ui="Trellis.UI" xmlns:uie="Trellis.Editor">
    <ui:Template name="Card" src="card.uxml" />
    <ui:VisualElement name="root">
        <Style src="main.uss" />
        <ui:Label name="first" text="One" />
        <ui:Label name="second" text="Two" />
        <ui:Instance template="Card">
            <ui:Label name="body" text="Body" slot="content" />
        </ui:Instance>
    </ui:VisualElement>
</ui:UXML>
"#;

fn open() -> Result<EditorDocument> {
    Ok(EditorDocument::from_source("/ui/main.uxml", SOURCE)?)
}

fn by_name(doc: &EditorDocument, name: &str) -> NodeId {
    doc.model()
        .elements()
        .find(|n| n.name() == Some(name))
        .map(|n| n.id)
        .unwrap()
}

fn names_under(doc: &EditorDocument, parent: NodeId) -> Vec<String> {
    doc.model()
        .children_of(parent)
        .into_iter()
        .map(|id| {
            let node = doc.model().find(id).unwrap();
            node.name().unwrap_or(&node.type_name).to_string()
        })
        .collect()
}

#[test]
fn test_add_element_at_index_and_notify() -> Result<()> {
    let sink = RecordingSink::new();
    let mut doc = open()?;
    let root = by_name(&doc, "root");

    let result = doc.apply(
        Mutation::AddElement {
            parent_id: root,
            index: Some(1),
            element: Node::element("Button").with_attribute("name", "go"),
        },
        &sink,
    )?;

    assert_eq!(names_under(&doc, root), vec!["first", "go", "second", "TemplateContainer"]);
    let created = result.created().unwrap();
    assert_eq!(doc.model().find(created).unwrap().type_name, "Button");

    match &sink.notifications()[0] {
        Notification::DocumentChanged {
            document,
            version,
            changes,
        } => {
            assert_eq!(document, "/ui/main.uxml");
            assert_eq!(*version, 1);
            assert!(changes.contains(&Change::NodeAdded { id: created }));
            assert!(changes.contains(&Change::HierarchyReordered));
        }
        other => panic!("unexpected notification {:?}", other),
    }
    Ok(())
}

#[test]
fn test_move_then_remove_cascades() -> Result<()> {
    let sink = RecordingSink::new();
    let mut doc = open()?;
    let first = by_name(&doc, "first");
    let second = by_name(&doc, "second");

    doc.apply(
        Mutation::MoveElement {
            node_id: second,
            new_parent_id: first,
            index: None,
        },
        &sink,
    )?;
    assert_eq!(names_under(&doc, first), vec!["second"]);

    let before = doc.model().len();
    let result = doc.apply(Mutation::RemoveNode { node_id: first }, &sink)?;
    assert_eq!(doc.model().len(), before - 2);
    assert!(result.changes.contains(&Change::NodeRemoved { id: second }));
    assert!(!doc.model().contains(second));
    Ok(())
}

#[test]
fn test_move_under_descendant_is_rejected() -> Result<()> {
    let sink = RecordingSink::new();
    let mut doc = open()?;
    let root = by_name(&doc, "root");
    let first = by_name(&doc, "first");

    let err = doc
        .apply(
            Mutation::MoveElement {
                node_id: root,
                new_parent_id: first,
                index: Some(0),
            },
            &sink,
        )
        .unwrap_err();
    assert!(matches!(err, EditorError::Mutation(MutationError::CycleDetected)));
    assert_eq!(doc.version, 0);
    Ok(())
}

#[test]
fn test_moving_root_under_parent_strips_style_sheets() -> Result<()> {
    let sink = RecordingSink::new();
    let mut doc = open()?;
    let root = by_name(&doc, "root");
    let holder = doc
        .apply(
            Mutation::AddElement {
                parent_id: ROOT_ID,
                index: Some(0),
                element: Node::element("VisualElement"),
            },
            &sink,
        )?
        .created()
        .unwrap();

    let result = doc.apply(
        Mutation::MoveElement {
            node_id: root,
            new_parent_id: holder,
            index: None,
        },
        &sink,
    )?;
    assert!(result.changes.contains(&Change::StyleSheetsChanged { id: root }));
    assert!(doc.model().find(root).unwrap().style_sheets.is_empty());
    Ok(())
}

#[test]
fn test_attribute_class_and_style_edits() -> Result<()> {
    let sink = RecordingSink::new();
    let mut doc = open()?;
    let first = by_name(&doc, "first");

    doc.apply(
        Mutation::SetAttribute {
            node_id: first,
            name: "text".to_string(),
            value: "Uno".to_string(),
        },
        &sink,
    )?;
    doc.apply(
        Mutation::AddClass {
            node_id: first,
            class: "title".to_string(),
        },
        &sink,
    )?;
    doc.apply(
        Mutation::SetInlineStyle {
            node_id: first,
            property: "color".to_string(),
            value: "red".to_string(),
        },
        &sink,
    )?;
    doc.apply(
        Mutation::RemoveAttribute {
            node_id: first,
            name: "name".to_string(),
        },
        &sink,
    )?;

    let text = doc.serialize_for_save(&sink)?;
    assert!(text.contains("<ui:Label text=\"Uno\" class=\"title\" style=\"color: red;\" />"));

    let cleared = doc.apply(
        Mutation::ClearInlineStyle {
            node_id: first,
            property: "color".to_string(),
        },
        &sink,
    )?;
    assert_eq!(cleared.changes, vec![Change::InlineStyleChanged { id: first }]);
    let text = doc.serialize_for_save(&sink)?;
    assert!(text.contains("<ui:Label text=\"Uno\" class=\"title\" />"));
    Ok(())
}

#[test]
fn test_slot_and_override_edits() -> Result<()> {
    let sink = RecordingSink::new();
    let mut doc = open()?;
    let body = by_name(&doc, "body");
    let card = doc.model().template_instances().next().unwrap().0.id;

    doc.apply(
        Mutation::AssignSlot {
            node_id: body,
            slot: Some("footer".to_string()),
        },
        &sink,
    )?;
    assert_eq!(doc.model().slot_of(body), Some("footer"));

    doc.apply(
        Mutation::SetAttributeOverride {
            node_id: card,
            element_name: "title".to_string(),
            attribute_name: "text".to_string(),
            value: Some("Hello".to_string()),
        },
        &sink,
    )?;
    let text = doc.serialize_for_save(&sink)?;
    assert!(text.contains("<AttributeOverrides element-name=\"title\" text=\"Hello\" />"));
    assert!(text.contains("slot=\"footer\""));

    doc.apply(
        Mutation::AssignSlot {
            node_id: body,
            slot: None,
        },
        &sink,
    )?;
    assert_eq!(doc.model().slot_of(body), None);

    // Overrides only live on template references
    let err = doc
        .apply(
            Mutation::SetAttributeOverride {
                node_id: body,
                element_name: "title".to_string(),
                attribute_name: "text".to_string(),
                value: None,
            },
            &sink,
        )
        .unwrap_err();
    assert!(matches!(err, EditorError::Mutation(MutationError::NotATemplate(_))));
    Ok(())
}

#[test]
fn test_rename_using_and_add_instance() -> Result<()> {
    let sink = RecordingSink::new();
    let mut doc = open()?;
    let root = by_name(&doc, "root");

    doc.apply(
        Mutation::RenameUsing {
            old_alias: "Card".to_string(),
            new_alias: "Tile".to_string(),
        },
        &sink,
    )?;
    doc.apply(
        Mutation::AddTemplateInstance {
            parent_id: root,
            index: Some(0),
            alias: "Badge".to_string(),
            path: Some("/ui/badge.uxml".to_string()),
        },
        &sink,
    )?;

    let text = doc.serialize_for_save(&sink)?;
    assert!(text.contains("<ui:Template name=\"Tile\" src=\"card.uxml\" />"));
    assert!(text.contains("<ui:Template name=\"Badge\" src=\"badge.uxml\" />"));
    assert!(text.contains("<ui:Instance template=\"Tile\">"));
    assert!(!text.contains("\"Card\""));

    let unknown = doc.apply(
        Mutation::AddTemplateInstance {
            parent_id: root,
            index: None,
            alias: "Missing".to_string(),
            path: None,
        },
        &sink,
    );
    assert!(matches!(
        unknown,
        Err(EditorError::Mutation(MutationError::UnknownAlias(_)))
    ));
    Ok(())
}
