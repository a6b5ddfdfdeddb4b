//! Context resolver
//!
//! Decides which block of content a filter tag governs. Author-provided
//! scope markers win; otherwise the tag's position decides: a line after a
//! `<br>`, the list item, paragraph or definition it opens, the section of
//! the heading it sits in, or the row/column of a table header.
//!
//! Resolution mutates the tree when the governed content is not a single
//! element: the run is wrapped in a new `cf-wrapper` span or div so that it
//! can be toggled as one. Re-resolving finds and reuses such wrappers.

use std::collections::{HashMap, HashSet};

use cf_dom::{DomTree, NodeId, Range};

use crate::config::FilterConfig;
use crate::error::{InvariantViolation, Result};
use crate::table::{self, HeaderDirection, TableLayout};
use crate::walker::{Sibling, Walker};

/// Elements whose children must keep a fixed structure
const STRUCTURAL_PARENTS: &[&str] = &[
    "table", "thead", "tbody", "tfoot", "tr", "colgroup", "ul", "ol", "dl", "select",
];

/// Elements holding phrasing content, wrapped with a span rather than a div
const PHRASING_PARENTS: &[&str] = &[
    "a", "abbr", "b", "big", "cite", "code", "em", "font", "i", "label", "q", "s", "small",
    "span", "strong", "sub", "sup", "u",
];

/// Level of a heading element (`h1`..`h6`)
pub fn heading_level(tree: &DomTree, node: NodeId) -> Option<u8> {
    match tree.tag_name(node)? {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Context inference inside one container
///
/// Table layouts are cached for the resolver's lifetime, so a resolver must
/// not outlive a rearrangement of the container's tables.
#[derive(Debug)]
pub struct ContextResolver<'c> {
    config: &'c FilterConfig,
    root: NodeId,
    tables: HashMap<NodeId, TableLayout>,
}

impl<'c> ContextResolver<'c> {
    pub fn new(config: &'c FilterConfig, root: NodeId) -> Self {
        Self {
            config,
            root,
            tables: HashMap::new(),
        }
    }

    /// Container the resolver works in
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Infer the context of a tag; empty when the tag governs nothing
    pub fn infer(&mut self, tree: &mut DomTree, tag: NodeId) -> Result<Vec<NodeId>> {
        if let Some(context) = self.explicit_scope(tree, tag)? {
            return Ok(context);
        }

        let previous = Walker::new(tree, self.config).previous_significant(tag, Some(self.root));
        match previous {
            Sibling::Found(br) if tree.is_tag(br, "br") => self.infer_line(tree, br, tag),
            // Embedded mid-content, e.g. inside a sentence
            Sibling::Found(_) => Ok(Vec::new()),
            Sibling::NotFound { parent: None } => Ok(vec![tag]),
            Sibling::NotFound { parent: Some(scope) } => {
                if scope == self.root || tree.has_class(scope, &self.config.container_class) {
                    Ok(vec![tag])
                } else {
                    self.infer_structural(tree, scope)
                }
            }
        }
    }

    /// Scope markers on the tag or on the wrappers it is the sole child of
    ///
    /// On one element, page scope beats section scope beats wrapped scope.
    fn explicit_scope(&mut self, tree: &mut DomTree, tag: NodeId) -> Result<Option<Vec<NodeId>>> {
        let config = self.config;
        let mut current = Some(tag);
        while let Some(element) = current {
            let is_page_scope = tree
                .element(element)
                .and_then(|e| e.id())
                .is_some_and(|id| id == config.page_scope_id);
            if is_page_scope {
                let main = tree
                    .first_with_class(NodeId::ROOT, &config.body_content_class)
                    .unwrap_or(self.root);
                return Ok(Some(vec![main]));
            }
            if tree.has_class(element, &config.section_scope_class) {
                return self.section_scope(tree, element).map(Some);
            }
            if tree.has_class(element, &config.wrapped_scope_class) {
                let wrapper = tree
                    .ancestors(element)
                    .find(|&a| tree.has_class(a, &config.context_wrapper_class));
                if let Some(wrapper) = wrapper {
                    return Ok(Some(vec![wrapper]));
                }
            }
            if element == self.root {
                break;
            }
            current = Walker::new(tree, config).wrapper(element);
        }
        Ok(None)
    }

    /// Section owning a section-scope marker: the nearest heading before it
    fn section_scope(&mut self, tree: &mut DomTree, marker: NodeId) -> Result<Vec<NodeId>> {
        let mut current = marker;
        loop {
            let mut sibling = tree.prev_sibling(current);
            while let Some(s) = sibling {
                if heading_level(tree, s).is_some() {
                    return self.infer_section(tree, s);
                }
                sibling = tree.prev_sibling(s);
            }
            match tree.parent_element(current) {
                Some(parent) if parent != self.root => current = parent,
                _ => break,
            }
        }
        tracing::warn!(%marker, "Section scope marker outside of any section");
        Ok(Vec::new())
    }

    /// Tag first in `scope`: the structure of the scope decides
    fn infer_structural(&mut self, tree: &mut DomTree, scope: NodeId) -> Result<Vec<NodeId>> {
        let name = tree.tag_name(scope).unwrap_or_default().to_string();
        match name.as_str() {
            "p" => Ok(vec![self.gallery_item(tree, scope).unwrap_or(scope)]),
            "dd" | "li" => Ok(vec![scope]),
            "dt" => Ok(self.infer_definition(tree, scope)),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.infer_section(tree, scope),
            "td" | "th" => match table::header_direction(tree, scope) {
                Some(direction) => self.infer_table_header(tree, scope, direction),
                None => self.wrap_contents(tree, scope),
            },
            _ if STRUCTURAL_PARENTS.contains(&name.as_str()) => {
                tracing::debug!(%scope, tag = %name, "No context inside structural element");
                Ok(Vec::new())
            }
            _ => self.wrap_contents(tree, scope),
        }
    }

    /// A caption paragraph stands for its whole gallery item
    fn gallery_item(&self, tree: &DomTree, paragraph: NodeId) -> Option<NodeId> {
        let caption = tree.parent_element(paragraph)?;
        if !tree.has_class(caption, &self.config.gallery_text_class) {
            return None;
        }
        tree.closest(caption, |n| tree.has_class(n, &self.config.gallery_box_class))
    }

    /// `<br> [tag ...] <br>`: the line after the break, wrapped in a span
    fn infer_line(&mut self, tree: &mut DomTree, br: NodeId, tag: NodeId) -> Result<Vec<NodeId>> {
        let line_parent = tree
            .parent(br)
            .ok_or(InvariantViolation::MissingParent(br))?;
        let start = std::iter::once(tag)
            .chain(tree.ancestors(tag))
            .find(|&n| tree.parent(n) == Some(line_parent))
            .ok_or(InvariantViolation::DetachedLine { br, tag })?;

        let mut end = start;
        while let Some(next) = tree.next_sibling(end) {
            if tree.is_tag(next, "br") {
                break;
            }
            end = next;
        }

        if start == end && self.is_generated_wrapper(tree, start) {
            return Ok(vec![start]);
        }

        let wrapper = self.create_wrapper(tree, "span");
        let mut range = Range::new(line_parent, 0);
        range.set_start_after(tree, br)?;
        range.set_end_after(tree, end)?;
        range.surround_contents(tree, wrapper)?;
        Ok(vec![wrapper])
    }

    /// `[<hN>] ... <hM>` with M <= N: the heading and its section content
    ///
    /// A single element section is returned as is; longer runs are wrapped
    /// in a div placed right after the heading. Blank nodes at the edges of
    /// the section are left outside the wrapper.
    pub fn infer_section(&mut self, tree: &mut DomTree, heading: NodeId) -> Result<Vec<NodeId>> {
        if tree.parent(heading).is_none() {
            return Ok(Vec::new());
        }
        let level = heading_level(tree, heading).unwrap_or(6);

        let walker = Walker::new(tree, self.config);
        let mut significant = Vec::new();
        let mut sibling = tree.next_sibling(heading);
        while let Some(s) = sibling {
            let ends_section = heading_level(tree, s).is_some_and(|l| l <= level)
                || tree.has_class(s, &self.config.content_end_class);
            if ends_section {
                break;
            }
            if !walker.is_empty_node(s) {
                significant.push(s);
            }
            sibling = tree.next_sibling(s);
        }

        match significant.as_slice() {
            [] => Ok(vec![heading]),
            [only] if tree.is_element(*only) => Ok(vec![heading, *only]),
            [first, ..] => {
                let first = *first;
                let last = significant[significant.len() - 1];
                let wrapper = self.create_wrapper(tree, "div");
                let mut range = Range::new(heading, 0);
                range.set_start_before(tree, first)?;
                range.set_end_after(tree, last)?;
                range.surround_contents(tree, wrapper)?;
                Ok(vec![heading, wrapper])
            }
        }
    }

    /// `[<dt>] <dd> <dd> <dt>`: the term and its descriptions
    fn infer_definition(&self, tree: &DomTree, term: NodeId) -> Vec<NodeId> {
        let scope_parent = tree.parent_element(term);
        let mut descriptions = Vec::new();
        let mut next = tree.next_element_sibling(term);

        while let Some(element) = next {
            match tree.tag_name(element) {
                Some("dt") => break,
                Some("dd") => descriptions.push(element),
                _ => {}
            }
            if tree.is_tag(element, "div") {
                if let Some(child) = tree.first_element_child(element) {
                    next = Some(child);
                    continue;
                }
            }

            let mut current = element;
            while tree.next_element_sibling(current).is_none() {
                match tree.parent_element(current) {
                    Some(parent) if Some(parent) != scope_parent => current = parent,
                    _ => break,
                }
            }
            next = tree.next_element_sibling(current);
        }

        if descriptions.is_empty() {
            return Vec::new();
        }
        descriptions.insert(0, term);
        descriptions
    }

    /// Header cell: every other cell of the rows or columns it spans
    fn infer_table_header(
        &mut self,
        tree: &mut DomTree,
        cell: NodeId,
        direction: HeaderDirection,
    ) -> Result<Vec<NodeId>> {
        let Some(table) = table::table_of(tree, cell) else {
            return Ok(Vec::new());
        };
        let layout = self
            .tables
            .entry(table)
            .or_insert_with(|| TableLayout::build(tree, table));

        let cells: Vec<NodeId> = match direction {
            HeaderDirection::Col => {
                let j = layout.base_column(tree, cell)?;
                (j..j + table::colspan(tree, cell))
                    .flat_map(|column| layout.column_cells(column))
                    .collect()
            }
            HeaderDirection::Row => {
                let i = layout.base_row(tree, cell)?;
                (i..i + table::rowspan(tree, cell))
                    .flat_map(|row| layout.row_cells(row))
                    .collect()
            }
        };

        let mut seen = HashSet::new();
        Ok(cells
            .into_iter()
            .filter(|&c| c != cell && seen.insert(c))
            .collect())
    }

    /// `<X> [ ... ] </X>`: everything inside the scope, wrapped
    fn wrap_contents(&mut self, tree: &mut DomTree, scope: NodeId) -> Result<Vec<NodeId>> {
        let walker = Walker::new(tree, self.config);
        let mut contents = tree
            .children(scope)
            .map(|(id, _)| id)
            .filter(|&id| !walker.is_empty_node(id));
        if let (Some(only), None) = (contents.next(), contents.next()) {
            if self.is_generated_wrapper(tree, only) {
                return Ok(vec![only]);
            }
        }

        let inline = tree
            .tag_name(scope)
            .is_some_and(|name| PHRASING_PARENTS.contains(&name));
        let wrapper = self.create_wrapper(tree, if inline { "span" } else { "div" });
        let mut range = Range::select_node_contents(tree, scope);
        range.surround_contents(tree, wrapper)?;
        Ok(vec![wrapper])
    }

    fn is_generated_wrapper(&self, tree: &DomTree, node: NodeId) -> bool {
        tree.has_class(node, &self.config.generated_wrapper_class)
    }

    fn create_wrapper(&self, tree: &mut DomTree, tag: &str) -> NodeId {
        let wrapper = tree.create_element(tag);
        tree.add_class(wrapper, &self.config.generated_wrapper_class);
        wrapper
    }
}
