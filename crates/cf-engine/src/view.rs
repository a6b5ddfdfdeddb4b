//! View composer
//!
//! A view is the set of fragments to toggle when one filter is selected.
//! The selection (tags and their contexts) is sorted in post-order and
//! folded on a stack so that adjacent or nested selections collapse into the
//! largest elements that contain nothing else. Each top-level fragment is
//! then marked with `cf-view cf-view-<index>`.

use std::cmp::Ordering;
use std::collections::HashMap;

use cf_dom::{Document, DocumentPosition, DomTree, NodeId, Range};

use crate::config::FilterConfig;
use crate::context::heading_level;
use crate::error::{InvariantViolation, Result};
use crate::walker::{Sibling, Walker};

/// Elements marked by one view of one container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFragments {
    /// Top-level fragments, none inside another
    pub fragments: Vec<NodeId>,
    /// Table of contents entries of hidden headings
    pub toc_entries: Vec<NodeId>,
    /// Tabs left out of a merged tab list
    pub markers: Vec<NodeId>,
}

impl ViewFragments {
    /// Fragments and ToC entries, the elements carrying the view class
    pub fn marked(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.toc_entries.iter().chain(&self.fragments).copied()
    }
}

/// Post-order comparison: descendants before ancestors, then document order
pub fn post_order(tree: &DomTree, a: NodeId, b: NodeId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let position = tree.compare_document_position(a, b);
    if position.includes(DocumentPosition::CONTAINED_BY) {
        Ordering::Greater
    } else if position.includes(DocumentPosition::CONTAINS) {
        Ordering::Less
    } else if position.includes(DocumentPosition::PRECEDING) {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

/// Deduplicate and sort a selection in post-order
pub fn sort_post_order(tree: &DomTree, selection: &mut Vec<NodeId>) {
    selection.sort_unstable();
    selection.dedup();
    selection.sort_by(|&a, &b| post_order(tree, a, b));
}

/// Views already composed for a container
pub fn computed_views(tree: &DomTree, config: &FilterConfig, container: NodeId) -> Vec<usize> {
    tree.element(container)
        .map(|e| {
            e.classes
                .numeric_suffixes(&config.container_view_class_prefix)
                .map(|v| v as usize)
                .collect()
        })
        .unwrap_or_default()
}

pub fn is_view_computed(
    tree: &DomTree,
    config: &FilterConfig,
    container: NodeId,
    index: usize,
) -> bool {
    tree.has_class(container, &config.container_view_class_for(index))
}

/// Elements under `root` (inclusive) marked for view `index`
pub fn view_fragments(tree: &DomTree, config: &FilterConfig, root: NodeId, index: usize) -> Vec<NodeId> {
    let class = config.view_class_for(index);
    std::iter::once(root)
        .chain(tree.descendants(root))
        .filter(|&n| tree.has_class(n, &class))
        .collect()
}

/// Fold `selection` into fragments and mark them for view `index`
///
/// The selection does not need to be sorted. Section merges insert wrapper
/// elements into the tree. Marks the container as having computed the view.
pub fn compose(
    doc: &mut Document,
    config: &FilterConfig,
    container: NodeId,
    index: usize,
    mut selection: Vec<NodeId>,
) -> Result<ViewFragments> {
    let toc = doc.get_element_by_id(&config.toc_id);
    let tree = doc.tree_mut();
    sort_post_order(tree, &mut selection);

    let mut folder = Folder::new(tree, config, toc);
    for element in selection {
        folder.add(element)?;
    }
    let view = folder.finish();

    let view_class = config.view_class_for(index);
    for element in view.marked() {
        tree.add_class(element, &config.view_class);
        tree.add_class(element, &view_class);
    }
    let marker_class = config.view_marker_class_for(index);
    for &marker in &view.markers {
        tree.add_class(marker, &marker_class);
    }
    tree.add_class(container, &config.container_view_class_for(index));

    tracing::debug!(
        %container,
        index,
        fragments = view.fragments.len(),
        toc = view.toc_entries.len(),
        "Composed view"
    );
    Ok(view)
}

/// Strip every view mark left inside `container`, the container included
///
/// Returns how many classes were removed.
pub fn cleanup(tree: &mut DomTree, config: &FilterConfig, container: NodeId) -> usize {
    let nodes: Vec<NodeId> = std::iter::once(container)
        .chain(tree.descendants(container))
        .collect();
    let mut removed = 0;
    for node in nodes {
        if let Some(element) = tree.element_mut(node) {
            removed += element.classes.retain(|class| !config.is_view_mark(class));
        }
    }
    if removed > 0 {
        tracing::debug!(%container, removed, "Cleaned up view marks");
    }
    removed
}

/// Stack fold over a post-ordered selection
struct Folder<'a> {
    tree: &'a mut DomTree,
    config: &'a FilterConfig,
    toc: Option<NodeId>,
    stack: Vec<NodeId>,
    toc_entries: Vec<NodeId>,
    markers: Vec<NodeId>,
    /// Wrappers created around whole sections, by heading level
    sections: HashMap<NodeId, u8>,
}

impl<'a> Folder<'a> {
    fn new(tree: &'a mut DomTree, config: &'a FilterConfig, toc: Option<NodeId>) -> Self {
        Self {
            tree,
            config,
            toc,
            stack: Vec::new(),
            toc_entries: Vec::new(),
            markers: Vec::new(),
            sections: HashMap::new(),
        }
    }

    fn add(&mut self, element: NodeId) -> Result<()> {
        let cap = self.config.fold_iteration_cap;
        let mut element = element;
        let mut settled = false;
        for _ in 0..cap {
            match self.merge(element)? {
                Some(merged) => element = merged,
                None => {
                    settled = true;
                    break;
                }
            }
        }
        if !settled {
            tracing::error!(%element, cap, "Maximum iteration count reached.");
        }

        self.stack.push(element);
        for headline in self.tree.elements_with_class(element, &self.config.headline_class) {
            self.add_toc_entry(headline)?;
        }
        Ok(())
    }

    fn finish(self) -> ViewFragments {
        let tree = &*self.tree;
        let fragments: Vec<NodeId> = self
            .stack
            .iter()
            .enumerate()
            .filter(|&(i, &entry)| {
                !self
                    .stack
                    .iter()
                    .enumerate()
                    .any(|(j, &other)| j != i && tree.contains(other, entry) && (other != entry || j < i))
            })
            .map(|(_, &entry)| entry)
            .collect();
        ViewFragments {
            fragments,
            toc_entries: self.toc_entries,
            markers: self.markers,
        }
    }

    /// ToC list item linking to `headline`
    fn add_toc_entry(&mut self, headline: NodeId) -> Result<()> {
        let Some(toc) = self.toc else {
            return Ok(());
        };
        let Some(id) = self.tree.element(headline).and_then(|e| e.id()) else {
            return Ok(());
        };
        let fragment = format!("#{id}");
        let anchor = self
            .tree
            .elements_by_tag_name(toc, "a")
            .into_iter()
            .find(|&a| self.tree.attr(a, "href").is_some_and(|href| href.ends_with(&fragment)));
        let Some(anchor) = anchor else {
            return Ok(());
        };

        let entry = self
            .tree
            .closest(anchor, |n| self.tree.is_tag(n, "li"))
            .ok_or(InvariantViolation::TocEntryOutsideList(headline))?;
        if !self.toc_entries.contains(&entry) {
            self.toc_entries.push(entry);
        }
        Ok(())
    }

    fn merge(&mut self, element: NodeId) -> Result<Option<NodeId>> {
        if let Some(merged) = self.merge_parent_in_view(element) {
            return Ok(Some(merged));
        }
        if self.tree.has_class(element, &self.config.container_class) {
            return Ok(None);
        }
        if let Some(merged) = self.merge_ghost_parents(element) {
            return Ok(Some(merged));
        }
        if let Some(merged) = self.merge_all_children(element) {
            return Ok(Some(merged));
        }
        self.merge_section(element)
    }

    /// `[ <A> ... [ <X/> ] ... </A> ]` becomes `[ <A> ... <X/> ... </A> ]`
    fn merge_parent_in_view(&mut self, element: NodeId) -> Option<NodeId> {
        let top = *self.stack.last()?;
        if self.tree.contains(element, top) {
            self.stack.pop();
            Some(element)
        } else if self.tree.contains(top, element) {
            self.stack.pop();
            Some(top)
        } else {
            None
        }
    }

    /// Promote through ghost containers holding nothing else
    fn merge_ghost_parents(&self, element: NodeId) -> Option<NodeId> {
        let walker = Walker::new(self.tree, self.config);
        let mut ghost = None;
        let mut current = element;
        while let Some(parent) = self.tree.parent_element(current) {
            if !walker.is_ghost_container(parent)
                || walker.previous_significant(current, Some(parent)).found().is_some()
                || walker.next_significant(current, Some(parent)).found().is_some()
            {
                break;
            }
            ghost = Some(parent);
            current = parent;
        }
        ghost
    }

    /// `<A> [ <B1/> ] ... [ <Bn/> ] [ <X/> ] </A>` becomes
    /// `[ <A> <B1/> ... <Bn/> <X/> </A> ]`
    ///
    /// In a tab list one tab may be left out; it becomes a marker.
    fn merge_all_children(&mut self, element: NodeId) -> Option<NodeId> {
        if matches!(self.tree.tag_name(element), Some("td" | "th")) {
            return None;
        }
        let walker = Walker::new(self.tree, self.config);
        let parent = walker.significant_parent(element)?;
        if self.tree.has_class(parent, &self.config.container_class) {
            return None;
        }

        let mut allow_out_of_view = self.tree.attr(element, "role") == Some("tab")
            && self.tree.attr(parent, "role") == Some("tablist");
        let mut markers = Vec::new();

        let mut next = walker.next_significant(element, Some(parent));
        while let Sibling::Found(sibling) = next {
            if !allow_out_of_view {
                return None;
            }
            allow_out_of_view = false;
            if self.tree.is_element(sibling) {
                markers.push(sibling);
            }
            next = walker.next_significant(sibling, Some(parent));
        }

        let mut depth = self.stack.len();
        let mut previous = walker.previous_significant(element, Some(parent));
        while let Sibling::Found(sibling) = previous {
            let in_view = depth > 0 && {
                let entry = self.stack[depth - 1];
                self.tree.contains(entry, sibling)
            };
            if in_view {
                depth -= 1;
            } else if allow_out_of_view {
                allow_out_of_view = false;
                if self.tree.is_element(sibling) {
                    markers.push(sibling);
                }
            } else {
                return None;
            }
            previous = walker.previous_significant(sibling, Some(parent));
        }

        self.stack.truncate(depth);
        self.markers.extend(markers);
        Some(parent)
    }

    /// `<hN/> [ <B1/> ] ... [ <X/> ] <hM/>` with M <= N becomes
    /// `[ <div><hN/> <B1/> ... <X/></div> ] <hM/>`
    fn merge_section(&mut self, element: NodeId) -> Result<Option<NodeId>> {
        let parent = self
            .tree
            .parent_element(element)
            .ok_or(InvariantViolation::MissingParent(element))?;

        let walker = Walker::new(self.tree, self.config);
        let next_level = match walker.next_significant(element, Some(parent)) {
            Sibling::NotFound { .. } => 1,
            Sibling::Found(next) => match heading_level(self.tree, next) {
                Some(level) => level,
                None => return Ok(None),
            },
        };

        // Deepest level a heading may have and still own the run
        let mut run_level = self.section_level(element).unwrap_or(u8::MAX);
        let mut depth = self.stack.len();
        let mut previous = walker.previous_significant(element, Some(parent)).found();
        let heading = loop {
            let Some(sibling) = previous else {
                return Ok(None);
            };
            let in_view = depth > 0 && self.tree.contains(self.stack[depth - 1], sibling);
            if let Some(level) = heading_level(self.tree, sibling) {
                if level >= next_level && level < run_level {
                    if in_view {
                        depth -= 1;
                    }
                    break sibling;
                }
                return Ok(None);
            }
            if !in_view {
                return Ok(None);
            }
            depth -= 1;
            if let Some(level) = self.section_level(sibling) {
                run_level = run_level.min(level);
            }
            previous = walker.previous_significant(sibling, Some(parent)).found();
        };
        let level = heading_level(self.tree, heading).unwrap_or(6);
        self.stack.truncate(depth);

        // A wrapper generated by an earlier view already holds exactly this section
        let whole_parent = self.tree.has_class(parent, &self.config.generated_wrapper_class)
            && !self.tree.has_class(parent, &self.config.container_class)
            && walker.previous_significant(heading, Some(parent)).found().is_none()
            && walker.next_significant(element, Some(parent)).found().is_none();
        if whole_parent {
            self.sections.insert(parent, level);
            return Ok(Some(parent));
        }

        let wrapper = self.tree.create_element("div");
        self.tree.add_class(wrapper, &self.config.generated_wrapper_class);
        let mut range = Range::new(parent, 0);
        range.set_start_before(self.tree, heading)?;
        range.set_end_after(self.tree, element)?;
        range.surround_contents(self.tree, wrapper)?;

        self.sections.insert(wrapper, level);
        tracing::trace!(%heading, %wrapper, "Merged section");
        Ok(Some(wrapper))
    }

    fn section_level(&self, node: NodeId) -> Option<u8> {
        heading_level(self.tree, node).or_else(|| self.sections.get(&node).copied())
    }
}
