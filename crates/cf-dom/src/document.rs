//! Document - High-level document API

use crate::{DomTree, NodeId};

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a document with an empty html/head/body skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        let mut doc = Self::empty(url);
        // Fresh nodes under the document root cannot violate hierarchy rules
        if tree.append_child(NodeId::ROOT, html).is_ok()
            && tree.append_child(html, head).is_ok()
            && tree.append_child(html, body).is_ok()
        {
            doc.tree = tree;
            doc.refresh_structure();
        }
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }

    /// Re-locate html/head/body after the tree was built externally
    pub fn refresh_structure(&mut self) {
        let tree = &self.tree;
        let html = tree
            .element_children(NodeId::ROOT)
            .find(|&c| tree.is_tag(c, "html"))
            .unwrap_or(NodeId::NONE);
        let find = |tag: &str| {
            tree.element_children(html)
                .find(|&c| tree.is_tag(c, tag))
                .unwrap_or(NodeId::NONE)
        };
        self.head_element = find("head");
        self.body_element = find("body");
        self.html_element = html;
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get document title
    pub fn title(&self) -> String {
        self.tree
            .element_children(self.head_element)
            .find(|&c| self.tree.is_tag(c, "title"))
            .map(|t| self.tree.text_content(t).trim().to_string())
            .unwrap_or_default()
    }

    /// Get <html> element
    pub fn document_element(&self) -> Option<NodeId> {
        Some(self.html_element).filter(|n| n.is_valid())
    }

    /// Get <head> element
    pub fn head(&self) -> Option<NodeId> {
        Some(self.head_element).filter(|n| n.is_valid())
    }

    /// Get <body> element
    pub fn body(&self) -> Option<NodeId> {
        Some(self.body_element).filter(|n| n.is_valid())
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.element_by_id(NodeId::ROOT, id)
    }

    /// Elements carrying `class` anywhere in the document
    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<NodeId> {
        self.tree.elements_with_class(NodeId::ROOT, class)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton() {
        let doc = Document::new("https://wiki.example/wiki/Main_Page");
        let body = doc.body().unwrap();
        assert!(doc.tree.is_tag(body, "body"));
        assert!(doc.head().is_some());
        assert_eq!(doc.url(), "https://wiki.example/wiki/Main_Page");
        assert_eq!(doc.title(), "");
    }

    #[test]
    fn test_lookup_by_id_and_class() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let div = doc.tree.create_element("div");
        doc.tree.set_attr(div, "id", "content");
        doc.tree.add_class(div, "mw-body-content");
        doc.tree.append_child(body, div).unwrap();

        assert_eq!(doc.get_element_by_id("content"), Some(div));
        assert_eq!(doc.get_elements_by_class_name("mw-body-content"), vec![div]);
        assert!(Document::empty("about:blank").body().is_none());
    }
}
