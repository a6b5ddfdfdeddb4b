//! DOM Node - Compact representation
//!
//! Links between nodes are [`NodeId`]s into the owning arena rather than
//! pointers, with [`NodeId::NONE`] marking an absent link.

use crate::classlist::DOMTokenList;
use crate::NodeId;

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn unlinked(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(data: ElementData) -> Self {
        Self::unlinked(NodeData::Element(data))
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self::unlinked(NodeData::Text(TextData {
            content: content.to_string(),
        }))
    }

    /// Create a new comment node
    pub fn comment(content: &str) -> Self {
        Self::unlinked(NodeData::Comment(content.to_string()))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::unlinked(NodeData::Document)
    }

    /// Create a doctype node
    pub fn doctype(name: &str) -> Self {
        Self::unlinked(NodeData::Doctype {
            name: name.to_string(),
        })
    }

    /// Node type of this node
    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::Document,
            NodeData::Doctype { .. } => NodeType::DocumentType,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Only documents and elements accept children
    #[inline]
    pub fn can_have_children(&self) -> bool {
        matches!(self.data, NodeData::Document | NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(&t.content),
            _ => None,
        }
    }
}

/// Node type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Element,
    Text,
    Comment,
    Document,
    DocumentType,
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// DOCTYPE
    Doctype { name: String },
    /// Element
    Element(ElementData),
    /// Text content
    Text(TextData),
    /// Comment
    Comment(String),
}

/// Element-specific data
///
/// The `class` attribute lives in [`ElementData::classes`] and is never
/// stored among the plain attributes.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercase local tag name
    pub name: String,
    /// Attributes other than `class`, in source order
    pub attrs: Vec<Attribute>,
    /// Class list
    pub classes: DOMTokenList,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            classes: DOMTokenList::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute; `class` replaces the class list
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if name == "class" {
            self.classes.set_value(value);
            return;
        }
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            attr.value = value.to_string();
            return;
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    /// Remove an attribute, returning whether it existed
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|a| a.name != name);
        before != self.attrs.len()
    }

    /// Value of the `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    /// Check for a class token
    #[inline]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// Text node data
#[derive(Debug, Clone)]
pub struct TextData {
    pub content: String,
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_attribute_feeds_class_list() {
        let mut elem = ElementData::new("DIV");
        elem.set_attr("class", "cf-tag cf-val-2");
        elem.set_attr("id", "main");

        assert_eq!(elem.name, "div");
        assert!(elem.has_class("cf-tag"));
        assert!(elem.get_attr("class").is_none());
        assert_eq!(elem.id(), Some("main"));
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut elem = ElementData::new("th");
        elem.set_attr("scope", "col");
        elem.set_attr("scope", "row");
        assert_eq!(elem.attrs.len(), 1);
        assert_eq!(elem.get_attr("scope"), Some("row"));
        assert!(elem.remove_attr("scope"));
        assert!(!elem.remove_attr("scope"));
    }

    #[test]
    fn test_node_kinds() {
        assert!(Node::text("x").is_text());
        assert!(!Node::comment("x").can_have_children());
        assert_eq!(Node::document().node_type(), NodeType::Document);
    }
}
