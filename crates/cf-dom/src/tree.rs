//! DOM Tree (arena-based allocation)

use crate::node::{ElementData, Node, NodeData};
use crate::operations::{DomError, DomResult};
use crate::traversal::{Ancestors, Children, Descendants, DocumentPosition};
use crate::NodeId;

/// Arena-based DOM tree
///
/// Node 0 is always the document node. Detached nodes stay in the arena
/// and can be re-inserted; nothing is ever freed.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if !id.is_valid() {
            return None;
        }
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !id.is_valid() {
            return None;
        }
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // --- Creation ---

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(ElementData::new(tag)))
    }

    /// Create a detached element from prepared data
    pub fn create_element_with(&mut self, data: ElementData) -> NodeId {
        self.push(Node::element(data))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content))
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push(Node::doctype(name))
    }

    // --- Links ---

    #[inline]
    fn link(&self, id: NodeId, pick: impl Fn(&Node) -> NodeId) -> Option<NodeId> {
        self.get(id).map(pick).filter(|n| n.is_valid())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.parent)
    }

    /// Parent if it is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.first_child)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.last_child)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.next_sibling)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.link(id, |n| n.prev_sibling)
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id);
        while let Some(n) = current {
            if self.is_element(n) {
                return Some(n);
            }
            current = self.next_sibling(n);
        }
        None
    }

    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.prev_sibling(id);
        while let Some(n) = current {
            if self.is_element(n) {
                return Some(n);
            }
            current = self.prev_sibling(n);
        }
        None
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).find(|(_, n)| n.is_element()).map(|(c, _)| c)
    }

    /// Iterate over children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            current: self.get(id).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Iterate over element children
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .filter(|(_, n)| n.is_element())
            .map(|(c, _)| c)
    }

    /// Ancestors nearest first, `id` excluded
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: id,
        }
    }

    /// Descendants of `root` in document order, `root` excluded
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root,
            next: self.get(root).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Position among the parent's children
    pub fn index_in_parent(&self, id: NodeId) -> usize {
        let mut index = 0;
        let mut current = self.prev_sibling(id);
        while let Some(n) = current {
            index += 1;
            current = self.prev_sibling(n);
        }
        index
    }

    /// Child at a position
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).nth(index).map(|(c, _)| c)
    }

    // --- Mutation ---

    /// Unlink a node from its parent; detached nodes are left alone
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let (parent, prev, next) = {
            let n = self.node(id)?;
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        if !parent.is_valid() {
            return Ok(());
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
        Ok(())
    }

    /// Insert `child` under `parent` before `reference` (append if `None`)
    ///
    /// The child is moved if it already has a parent.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        if !self.node(parent)?.can_have_children() {
            return Err(DomError::InvalidNodeType(parent));
        }
        self.node(child)?;
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, node: r });
            }
        }

        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };
        self.detach(child)?;

        match reference {
            Some(r) => {
                let prev = self.nodes[r.index()].prev_sibling;
                if prev.is_valid() {
                    self.nodes[prev.index()].next_sibling = child;
                } else {
                    self.nodes[parent.index()].first_child = child;
                }
                self.nodes[r.index()].prev_sibling = child;
                let node = &mut self.nodes[child.index()];
                node.prev_sibling = prev;
                node.next_sibling = r;
            }
            None => {
                let last = self.nodes[parent.index()].last_child;
                if last.is_valid() {
                    self.nodes[last.index()].next_sibling = child;
                } else {
                    self.nodes[parent.index()].first_child = child;
                }
                self.nodes[parent.index()].last_child = child;
                let node = &mut self.nodes[child.index()];
                node.prev_sibling = last;
                node.next_sibling = NodeId::NONE;
            }
        }
        self.nodes[child.index()].parent = parent;
        Ok(child)
    }

    /// Append a child node to a parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `new` right after `node` (`insertAdjacentElement('afterend')`)
    pub fn insert_after(&mut self, node: NodeId, new: NodeId) -> DomResult<NodeId> {
        let parent = self.parent(node).ok_or(DomError::NotAChild {
            parent: NodeId::NONE,
            node,
        })?;
        let next = self.next_sibling(node);
        self.insert_before(parent, new, next)
    }

    // --- Queries ---

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Comment(_)))
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id)?.as_element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id)?.as_element_mut()
    }

    /// Lowercase tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    /// Add a class; no-op on non-elements
    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        self.element_mut(id).is_some_and(|e| e.classes.add(class))
    }

    /// Remove a class; no-op on non-elements
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        self.element_mut(id).is_some_and(|e| e.classes.remove(class))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.get_attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(e) = self.element_mut(id) {
            e.set_attr(name, value);
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_text()
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id).filter_map(|d| self.text(d)).collect()
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is attached to the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == NodeId::ROOT || self.ancestors(id).last() == Some(NodeId::ROOT)
    }

    /// Inclusive ancestor-or-self element matching `pred`
    pub fn closest(&self, id: NodeId, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|&n| self.is_element(n))
            .find(|&n| pred(n))
    }

    /// Descendant elements carrying `class`, in document order
    pub fn elements_with_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&d| self.has_class(d, class))
            .collect()
    }

    /// First descendant element carrying `class`
    pub fn first_with_class(&self, root: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(root).find(|&d| self.has_class(d, class))
    }

    /// Descendant elements with a tag name, in document order
    pub fn elements_by_tag_name(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&d| self.is_tag(d, tag))
            .collect()
    }

    /// First descendant element whose `id` attribute equals `id`
    pub fn element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(root)
            .find(|&d| self.element(d).and_then(ElementData::id) == Some(id))
    }

    /// Position of `other` relative to `id`, with DOM semantics
    pub fn compare_document_position(&self, id: NodeId, other: NodeId) -> DocumentPosition {
        if id == other {
            return DocumentPosition::default();
        }

        let path_of = |n: NodeId| {
            let mut path: Vec<NodeId> = self.ancestors(n).collect();
            path.reverse();
            path.push(n);
            path
        };
        let ours = path_of(id);
        let theirs = path_of(other);

        if ours[0] != theirs[0] {
            let order = if other < id {
                DocumentPosition::PRECEDING
            } else {
                DocumentPosition::FOLLOWING
            };
            return DocumentPosition::DISCONNECTED.or(order);
        }

        let shared = ours
            .iter()
            .zip(&theirs)
            .take_while(|(a, b)| a == b)
            .count();
        if shared == theirs.len() {
            return DocumentPosition::CONTAINS.or(DocumentPosition::PRECEDING);
        }
        if shared == ours.len() {
            return DocumentPosition::CONTAINED_BY.or(DocumentPosition::FOLLOWING);
        }
        if self.index_in_parent(theirs[shared]) < self.index_in_parent(ours[shared]) {
            DocumentPosition::PRECEDING
        } else {
            DocumentPosition::FOLLOWING
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(tree: &mut DomTree) -> (NodeId, [NodeId; 3]) {
        let ul = tree.create_element("ul");
        tree.append_child(NodeId::ROOT, ul).unwrap();
        let items = [(); 3].map(|_| {
            let li = tree.create_element("li");
            tree.append_child(ul, li).unwrap();
            li
        });
        (ul, items)
    }

    #[test]
    fn test_append_and_links() {
        let mut tree = DomTree::new();
        let (ul, [a, b, c]) = list(&mut tree);

        assert_eq!(tree.first_child(ul), Some(a));
        assert_eq!(tree.last_child(ul), Some(c));
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.prev_sibling(c), Some(b));
        assert_eq!(tree.index_in_parent(c), 2);
        assert!(tree.is_connected(b));
    }

    #[test]
    fn test_insert_before_moves_node() {
        let mut tree = DomTree::new();
        let (ul, [a, b, c]) = list(&mut tree);

        tree.insert_before(ul, c, Some(a)).unwrap();
        let order: Vec<NodeId> = tree.children(ul).map(|(id, _)| id).collect();
        assert_eq!(order, vec![c, a, b]);

        // Inserting before itself keeps the order
        tree.insert_before(ul, a, Some(a)).unwrap();
        let order: Vec<NodeId> = tree.children(ul).map(|(id, _)| id).collect();
        assert_eq!(order, vec![c, a, b]);
    }

    #[test]
    fn test_detach() {
        let mut tree = DomTree::new();
        let (ul, [a, b, c]) = list(&mut tree);
        tree.detach(b).unwrap();

        assert_eq!(tree.next_sibling(a), Some(c));
        assert_eq!(tree.parent(b), None);
        assert!(!tree.is_connected(b));
        assert_eq!(tree.children(ul).count(), 2);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = DomTree::new();
        let (ul, [a, _, _]) = list(&mut tree);
        assert_eq!(
            tree.append_child(a, ul),
            Err(DomError::HierarchyRequest { parent: a, child: ul })
        );
        let text = tree.create_text("x");
        assert_eq!(tree.append_child(text, a), Err(DomError::InvalidNodeType(text)));
    }

    #[test]
    fn test_compare_document_position() {
        let mut tree = DomTree::new();
        let (ul, [a, b, _]) = list(&mut tree);
        let inner = tree.create_element("span");
        tree.append_child(b, inner).unwrap();

        let pos = tree.compare_document_position(a, inner);
        assert!(pos.includes(DocumentPosition::FOLLOWING));
        let pos = tree.compare_document_position(inner, ul);
        assert!(pos.includes(DocumentPosition::CONTAINS));
        assert!(pos.includes(DocumentPosition::PRECEDING));
        let pos = tree.compare_document_position(ul, inner);
        assert!(pos.includes(DocumentPosition::CONTAINED_BY));

        let loose = tree.create_element("div");
        let pos = tree.compare_document_position(a, loose);
        assert!(pos.includes(DocumentPosition::DISCONNECTED));
    }

    #[test]
    fn test_queries() {
        let mut tree = DomTree::new();
        let (ul, [a, b, _]) = list(&mut tree);
        tree.set_attr(b, "id", "second");
        tree.add_class(a, "x");
        tree.add_class(b, "x");

        assert_eq!(tree.element_by_id(NodeId::ROOT, "second"), Some(b));
        assert_eq!(tree.elements_with_class(NodeId::ROOT, "x"), vec![a, b]);
        assert_eq!(tree.closest(a, |n| tree.is_tag(n, "ul")), Some(ul));
        assert_eq!(tree.closest(a, |n| tree.is_tag(n, "li")), Some(a));
    }
}
