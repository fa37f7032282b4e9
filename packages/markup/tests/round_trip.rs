//! Text stability across serialize -> parse -> serialize

use anyhow::Result;
use trellis_markup::{parse, serialize, SerializeOptions};
use trellis_model::{Document, Node, StyleSheetRef, ROOT_ID};

const SCREEN: &str = "/ui/screens/inventory.uxml";

fn inventory_screen() -> Result<Document> {
    let mut doc = Document::new(SCREEN);
    doc.add_using("Slot", "/ui/widgets/slot.uxml");
    doc.add_using("Header", "/ui/widgets/header.uxml");

    let root = doc.add_node(
        ROOT_ID,
        None,
        Node::element("VisualElement")
            .with_attribute("name", "inventory")
            .with_style_sheet("/ui/styles/inventory.uss"),
    )?;
    doc.set_inline_style(root, "flex-grow", "1")?;

    let header = doc.add_node(root, None, Node::template_instance("Header"))?;
    doc.template_mut(header)?.set_override("title", "text", "Bag & \"Stash\"");

    let grid = doc.add_node(root, None, Node::element("ScrollView").with_class("grid"))?;
    for i in 0..3 {
        let slot = doc.add_node(grid, Some(0), Node::template_instance("Slot"))?;
        let icon = doc.add_node(
            slot,
            None,
            Node::element("Image").with_attribute("name", format!("icon-{}", i)),
        )?;
        doc.assign_slot(icon, "icon")?;
    }
    doc.add_node(root, Some(1), Node::element("Trellis.Editor.ColorField"))?;
    doc.reorder_document();
    Ok(doc)
}

#[test]
fn test_serialize_parse_serialize_is_stable() -> Result<()> {
    let doc = inventory_screen()?;
    let options = SerializeOptions::to_file(SCREEN);

    let first = serialize(&doc, &options)?;
    let reparsed = parse(&first, SCREEN)?;
    let second = serialize(&reparsed, &options)?;

    assert_eq!(first, second);
    assert_eq!(reparsed.len(), doc.len());
    assert_eq!(reparsed.usings(), doc.usings());
    Ok(())
}

#[test]
fn test_reparsed_structure_matches() -> Result<()> {
    let doc = inventory_screen()?;
    let text = serialize(&doc, &SerializeOptions::to_file(SCREEN))?;
    let reparsed = parse(&text, SCREEN)?;

    let shape = |d: &Document| -> Vec<(usize, String, Option<String>)> {
        d.depth_first()
            .into_iter()
            .map(|id| {
                let node = d.find(id).unwrap();
                let depth = {
                    let mut depth = 0;
                    let mut parent = node.parent_id;
                    while parent != ROOT_ID {
                        depth += 1;
                        parent = d.find(parent).unwrap().parent_id;
                    }
                    depth
                };
                (depth, node.type_name.clone(), d.slot_of(id).map(str::to_string))
            })
            .collect()
    };
    assert_eq!(shape(&reparsed), shape(&doc));

    let root = reparsed.root_nodes()[0];
    assert_eq!(
        reparsed.find(root).unwrap().style_sheets,
        vec![StyleSheetRef::new("/ui/styles/inventory.uss")]
    );
    assert_eq!(reparsed.rule_for(root).unwrap().get("flex-grow"), Some("1"));
    Ok(())
}

#[test]
fn test_scenario_button() -> Result<()> {
    let mut doc = Document::new("/ui/main.uxml");
    doc.add_node(
        ROOT_ID,
        None,
        Node::element("Button")
            .with_attribute("text", "OK")
            .with_class("primary"),
    )?;

    let text = serialize(&doc, &SerializeOptions::default())?;
    assert_eq!(
        text,
        "<ui:UXML xmlns:ui=\"Trellis.UI\" xmlns:uie=\"Trellis.Editor\">\n    <ui:Button text=\"OK\" class=\"primary\" />\n</ui:UXML>\n"
    );
    Ok(())
}

#[test]
fn test_open_close_pairs_canonicalize_to_self_closing() -> Result<()> {
    let text = r#"<ui:UXML xmlns:ui="Trellis.UI">
  <ui:VisualElement class="a"></ui:VisualElement>
  <ui:Label text="x">
  </ui:Label>
</ui:UXML>"#;
    let doc = parse(text, "/ui/main.uxml")?;
    let output = serialize(&doc, &SerializeOptions::default())?;

    assert!(output.contains("    <ui:VisualElement class=\"a\" />\n"));
    assert!(output.contains("    <ui:Label text=\"x\" />\n"));
    assert!(!output.contains("</ui:VisualElement>"));
    Ok(())
}

#[test]
fn test_unsaved_sheets_do_not_reach_disk() -> Result<()> {
    let mut doc = Document::new("/ui/main.uxml");
    let mut panel = Node::element("VisualElement").with_style_sheet("/ui/main.uss");
    panel.style_sheets.push(StyleSheetRef::unsaved("draft"));
    doc.add_node(ROOT_ID, None, panel)?;

    let on_disk = serialize(&doc, &SerializeOptions::to_file("/ui/main.uxml"))?;
    assert!(on_disk.contains("<Style src=\"main.uss\" />"));
    assert!(!on_disk.contains("unsaved://"));

    // In-memory copies keep the sheet and read it back unresolved
    let options = SerializeOptions {
        writing_to_file: false,
        ..SerializeOptions::default()
    };
    let in_memory = serialize(&doc, &options)?;
    let reparsed = parse(&in_memory, "/ui/main.uxml")?;
    let sheets = &reparsed.find(reparsed.root_nodes()[0]).unwrap().style_sheets;
    assert_eq!(sheets.len(), 2);
    assert!(sheets[1].is_unsaved());
    Ok(())
}
