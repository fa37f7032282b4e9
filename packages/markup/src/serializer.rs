use crate::error::{MarkupError, MarkupResult};
use crate::names::*;
use crate::style_text::{InlineStyleCodec, StyleRuleCodec};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};
use trellis_common::relative_reference;
use trellis_model::{Document, Node, NodeId, ModelError};

/// Options for markup serialization
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Indentation string
    pub indent: String,
    /// Project path the text will be written to; only used to relativize references
    pub destination: Option<String>,
    /// Drop editor-only state (selection marker, in-memory style sheets)
    pub writing_to_file: bool,
    /// Serialize only this subtree (e.g. extract to template, copy)
    pub subtree: Option<NodeId>,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            destination: None,
            writing_to_file: true,
            subtree: None,
        }
    }
}

impl SerializeOptions {
    pub fn to_file(destination: impl Into<String>) -> Self {
        Self {
            destination: Some(destination.into()),
            ..Self::default()
        }
    }
}

/// Serialize a document with the default inline style codec
pub fn serialize(document: &Document, options: &SerializeOptions) -> MarkupResult<String> {
    Serializer::new(options.clone()).serialize(document)
}

/// Serializer converts the flattened model to markup text.
///
/// Output is depth-first from the root adjacency map with one tag per line.
pub struct Serializer<'c> {
    options: SerializeOptions,
    codec: &'c dyn StyleRuleCodec,
    indent_level: usize,
}

impl Serializer<'static> {
    pub fn new(options: SerializeOptions) -> Self {
        Self {
            options,
            codec: &InlineStyleCodec,
            indent_level: 0,
        }
    }
}

impl<'c> Serializer<'c> {
    pub fn with_codec(options: SerializeOptions, codec: &'c dyn StyleRuleCodec) -> Self {
        Self {
            options,
            codec,
            indent_level: 0,
        }
    }

    /// Serialize a Document to markup text
    #[instrument(skip_all, fields(document = %document.identity(), subtree = ?self.options.subtree))]
    pub fn serialize(&mut self, document: &Document) -> MarkupResult<String> {
        self.indent_level = 0;
        let children = document.children_map();

        let roots = match self.options.subtree {
            Some(id) => {
                document.get(id)?;
                vec![id]
            }
            None => document.root_nodes(),
        };

        let mut output = String::new();
        output.push_str(&format!(
            "<{ui}:{root} xmlns:{ui}=\"{ui_ns}\" xmlns:{uie}=\"{uie_ns}\">\n",
            ui = UI_PREFIX,
            root = ROOT_TAG,
            ui_ns = UI_NAMESPACE,
            uie = EDITOR_PREFIX,
            uie_ns = EDITOR_NAMESPACE,
        ));
        self.indent_level += 1;

        self.serialize_template_registrations(document, &roots, &children, &mut output);

        let slots = slot_assignments(document);
        for root in &roots {
            self.serialize_node(document, *root, &children, &slots, &mut output)?;
        }

        self.indent_level -= 1;
        output.push_str(&format!("</{}:{}>\n", UI_PREFIX, ROOT_TAG));

        debug!(bytes = output.len(), "Serialized document");
        Ok(output)
    }

    /// One `<ui:Template>` per alias referenced inside the serialized nodes
    fn serialize_template_registrations(
        &self,
        document: &Document,
        roots: &[NodeId],
        children: &HashMap<NodeId, Vec<NodeId>>,
        output: &mut String,
    ) {
        let mut referenced: HashSet<&str> = HashSet::new();
        let mut stack: Vec<NodeId> = roots.to_vec();
        while let Some(id) = stack.pop() {
            if let Some(template) = document.find(id).and_then(|n| n.template.as_ref()) {
                referenced.insert(template.alias.as_str());
            }
            if let Some(kids) = children.get(&id) {
                stack.extend(kids);
            }
        }

        for (alias, path) in document.usings() {
            if !referenced.remove(alias.as_str()) {
                continue;
            }
            let src = self.reference_path(path);
            self.write_indent(output);
            output.push_str(&format!(
                "<{}:{} {}=\"{}\" {}=\"{}\" />\n",
                UI_PREFIX,
                TEMPLATE_TAG,
                TEMPLATE_NAME_ATTRIBUTE,
                escape_attribute(alias),
                TEMPLATE_SRC_ATTRIBUTE,
                escape_attribute(&src),
            ));
        }

        for alias in referenced {
            warn!(alias, "Template alias is not registered in usings, skipping registration");
        }
    }

    fn serialize_node(
        &mut self,
        document: &Document,
        id: NodeId,
        children: &HashMap<NodeId, Vec<NodeId>>,
        slots: &HashMap<NodeId, &str>,
        output: &mut String,
    ) -> MarkupResult<()> {
        let node = document.find(id).ok_or(ModelError::NodeNotFound { id })?;

        let tag = match &node.template {
            Some(_) => format!("{}:{}", UI_PREFIX, INSTANCE_TAG),
            None => tag_for_type(&node.type_name),
        };

        self.write_indent(output);
        output.push('<');
        output.push_str(&tag);
        self.serialize_attributes(document, node, slots, output)?;

        let child_tags = self.child_tags(node);
        let node_children = children.get(&id).map(Vec::as_slice).unwrap_or(&[]);

        if node_children.is_empty() && child_tags.is_empty() {
            output.push_str(" />\n");
            return Ok(());
        }

        output.push_str(">\n");
        self.indent_level += 1;
        for child_tag in &child_tags {
            self.write_indent(output);
            output.push_str(child_tag);
            output.push('\n');
        }
        for child in node_children {
            self.serialize_node(document, *child, children, slots, output)?;
        }
        self.indent_level -= 1;

        self.write_indent(output);
        output.push_str("</");
        output.push_str(&tag);
        output.push_str(">\n");
        Ok(())
    }

    fn serialize_attributes(
        &self,
        document: &Document,
        node: &Node,
        slots: &HashMap<NodeId, &str>,
        output: &mut String,
    ) -> MarkupResult<()> {
        if let Some(template) = &node.template {
            write_attribute(output, INSTANCE_TEMPLATE_ATTRIBUTE, &template.alias);
        }

        for (name, value) in &node.attributes {
            if self.options.writing_to_file && name == SELECTED_MARKER_ATTRIBUTE {
                continue;
            }
            write_attribute(output, name, value);
        }

        if let Some(slot) = slots.get(&node.id) {
            write_attribute(output, SLOT_ATTRIBUTE, slot);
        }

        if !node.classes.is_empty() {
            let classes: Vec<&str> = node.classes.iter().map(String::as_str).collect();
            write_attribute(output, CLASS_ATTRIBUTE, &classes.join(" "));
        }

        if let Some(index) = node.rule_index {
            let rule = document
                .style_rules()
                .get(index)
                .ok_or(MarkupError::StyleRuleMissing {
                    node: node.id,
                    index,
                })?;
            let text = self.codec.write(rule)?;
            if !text.is_empty() {
                write_attribute(output, STYLE_ATTRIBUTE, &text);
            }
        }

        Ok(())
    }

    /// `<Style>` and `<AttributeOverrides>` children, already rendered
    fn child_tags(&self, node: &Node) -> Vec<String> {
        let mut tags = Vec::new();

        for sheet in &node.style_sheets {
            if sheet.is_unsaved() {
                if self.options.writing_to_file {
                    continue;
                }
                tags.push(format!(
                    "<{} {}=\"{}\" />",
                    STYLE_TAG,
                    STYLE_SRC_ATTRIBUTE,
                    escape_attribute(&sheet.path)
                ));
                continue;
            }
            tags.push(format!(
                "<{} {}=\"{}\" />",
                STYLE_TAG,
                STYLE_SRC_ATTRIBUTE,
                escape_attribute(&self.reference_path(&sheet.path))
            ));
        }

        if let Some(template) = &node.template {
            for (element_name, overrides) in template.grouped_overrides() {
                let mut tag = format!(
                    "<{} {}=\"{}\"",
                    OVERRIDES_TAG,
                    OVERRIDE_ELEMENT_NAME_ATTRIBUTE,
                    escape_attribute(element_name)
                );
                for o in overrides {
                    write_attribute(&mut tag, &o.attribute_name, &o.value);
                }
                tag.push_str(" />");
                tags.push(tag);
            }
        }

        tags
    }

    fn reference_path(&self, path: &str) -> String {
        match &self.options.destination {
            Some(destination) => relative_reference(destination, path),
            None => path.to_string(),
        }
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.options.indent);
        }
    }
}

/// Node id -> slot it is routed to, across every template reference
fn slot_assignments(document: &Document) -> HashMap<NodeId, &str> {
    document
        .template_instances()
        .flat_map(|(_, template)| {
            template
                .slot_usages
                .iter()
                .map(|(child, slot)| (*child, slot.as_str()))
        })
        .collect()
}

fn write_attribute(output: &mut String, name: &str, value: &str) {
    output.push(' ');
    output.push_str(name);
    output.push_str("=\"");
    output.push_str(&escape_attribute(value));
    output.push('"');
}

/// Escape an attribute value for a double-quoted XML attribute
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            other => escaped.push(other),
        }
    }
    escaped
}
