//! HTML Serialization (innerHTML/outerHTML)
//!
//! The class list is written as the first attribute when non-empty; the
//! remaining attributes keep their source order.

use cf_dom::{DomTree, NodeData, NodeId};

/// HTML serializer
#[derive(Debug, Default, Clone)]
pub struct HtmlSerializer {
    /// Drop comments from the output
    pub skip_comments: bool,
}

/// Void elements (no end tag)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Raw text elements (no escaping for content)
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl HtmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize innerHTML of a node (children only)
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_children(tree, node_id, &mut output);
        output
    }

    /// Serialize outerHTML of a node (including the node itself)
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(tree, node_id, &mut output);
        output
    }

    fn serialize_node(&self, tree: &DomTree, node_id: NodeId, output: &mut String) {
        let Some(node) = tree.get(node_id) else {
            return;
        };

        match &node.data {
            NodeData::Document => self.serialize_children(tree, node_id, output),
            NodeData::Element(elem) => {
                let tag = elem.name.as_str();

                output.push('<');
                output.push_str(tag);
                if !elem.classes.is_empty() {
                    output.push_str(" class=\"");
                    escape_attribute(&elem.classes.value(), output);
                    output.push('"');
                }
                for attr in &elem.attrs {
                    output.push(' ');
                    output.push_str(&attr.name);
                    output.push_str("=\"");
                    escape_attribute(&attr.value, output);
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&tag) {
                    return;
                }
                if RAW_TEXT_ELEMENTS.contains(&tag) {
                    for (_, child) in tree.children(node_id) {
                        if let Some(text) = child.as_text() {
                            output.push_str(text);
                        }
                    }
                } else {
                    self.serialize_children(tree, node_id, output);
                }
                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeData::Text(text) => escape_text(&text.content, output),
            NodeData::Comment(text) => {
                if !self.skip_comments {
                    output.push_str("<!--");
                    output.push_str(text);
                    output.push_str("-->");
                }
            }
            NodeData::Doctype { name } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                output.push('>');
            }
        }
    }

    fn serialize_children(&self, tree: &DomTree, parent_id: NodeId, output: &mut String) {
        for (child_id, _) in tree.children(parent_id) {
            self.serialize_node(tree, child_id, output);
        }
    }
}

/// Escape text content for HTML
fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

/// Escape attribute value
fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_element_with_classes() {
        let mut tree = DomTree::new();
        let span = tree.create_element("span");
        tree.add_class(span, "cf-tag");
        tree.set_attr(span, "title", "a \"quote\" & more");
        let text = tree.create_text("1 < 2");
        let br = tree.create_element("br");
        tree.append_child(NodeId::ROOT, span).unwrap();
        tree.append_child(span, text).unwrap();
        tree.append_child(span, br).unwrap();

        let html = HtmlSerializer::new().serialize_outer(&tree, span);
        assert_eq!(
            html,
            r#"<span class="cf-tag" title="a &quot;quote&quot; &amp; more">1 &lt; 2<br></span>"#
        );
    }

    #[test]
    fn test_skip_comments() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let c = tree.create_comment("x");
        tree.append_child(NodeId::ROOT, p).unwrap();
        tree.append_child(p, c).unwrap();

        let serializer = HtmlSerializer { skip_comments: true };
        assert_eq!(serializer.serialize_inner(&tree, p), "");
        assert_eq!(HtmlSerializer::new().serialize_inner(&tree, p), "<!--x-->");
    }
}
