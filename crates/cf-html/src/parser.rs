//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it into the arena DOM.

use cf_dom::{Document, DomTree, ElementData, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::ParseError;

/// HTML5 parser
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, ParseError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a document URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, ParseError> {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut document = Document::empty(url);
        self.convert_node(&dom.document, document.tree_mut(), NodeId::ROOT)?;
        document.refresh_structure();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(document)
    }

    /// Parse body content and append it under `parent` in an existing document
    ///
    /// Returns the top-level nodes that were inserted.
    pub fn append_fragment(
        &self,
        document: &mut Document,
        parent: NodeId,
        html: &str,
    ) -> Result<Vec<NodeId>, ParseError> {
        if !document.tree().is_element(parent) {
            return Err(ParseError::InvalidTarget(parent));
        }

        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        let Some(body) = find_element(&dom.document, "body") else {
            return Ok(Vec::new());
        };

        let tree = document.tree_mut();
        let before = tree.last_child(parent);
        for child in body.children.borrow().iter() {
            self.convert_node(child, tree, parent)?;
        }

        let first = match before {
            Some(b) => tree.next_sibling(b),
            None => tree.first_child(parent),
        };
        let mut inserted = Vec::new();
        let mut current = first;
        while let Some(n) = current {
            inserted.push(n);
            current = tree.next_sibling(n);
        }
        tracing::debug!("Inserted {} fragment nodes under {}", inserted.len(), parent);
        Ok(inserted)
    }

    /// Convert an RcDom node to our DOM format
    fn convert_node(
        &self,
        handle: &Handle,
        tree: &mut DomTree,
        parent: NodeId,
    ) -> Result<(), ParseError> {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent)?;
                }
            }
            RcNodeData::Doctype { name, .. } => {
                let id = tree.create_doctype(name);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Text { contents } => {
                // Whitespace-only text is kept; sibling walks must see it
                let id = tree.create_text(&contents.borrow());
                tree.append_child(parent, id)?;
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Element { name, attrs, .. } => {
                let mut elem = ElementData::new(&name.local);
                for attr in attrs.borrow().iter() {
                    elem.set_attr(&attr.name.local, &attr.value);
                }
                let id = tree.create_element_with(elem);
                tree.append_child(parent, id)?;

                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, id)?;
                }
            }
            RcNodeData::ProcessingInstruction { .. } => {}
        }
        Ok(())
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let RcNodeData::Element { name, .. } = &handle.data {
        if &*name.local == tag {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_whitespace_and_comments() {
        let doc = HtmlParser::new()
            .parse("<p><b>a</b> <!-- note --> <i>b</i></p>")
            .unwrap();
        let tree = doc.tree();
        let p = tree.elements_by_tag_name(NodeId::ROOT, "p")[0];

        let kinds: Vec<_> = tree
            .children(p)
            .map(|(_, n)| n.node_type())
            .collect();
        assert_eq!(kinds.len(), 5);
        assert!(tree.children(p).any(|(id, _)| tree.is_comment(id)));
        assert_eq!(tree.text_content(p), "a  b");
    }

    #[test]
    fn test_structure_cached() {
        let doc = HtmlParser::new()
            .parse("<!DOCTYPE html><title>T</title><div id=x class='a b'></div>")
            .unwrap();
        assert!(doc.body().is_some());
        assert_eq!(doc.title(), "T");
        let div = doc.get_element_by_id("x").unwrap();
        assert!(doc.tree().has_class(div, "b"));
    }
}
