//! Filter state
//!
//! Tags carry a bitmask class (`cf-val-<mask>`): bit `i` set means the
//! tagged content is visible while filter `i` is selected. Anything that is
//! not a tag is visible under every filter.

use cf_dom::{Document, DomTree, NodeId};

use crate::config::FilterConfig;

/// Bitmask of a tag, cached on the element's dataset
///
/// The first `cf-val-` class with an all-digit suffix wins; values above the
/// configured maximum are masked down to the known filter bits.
pub fn filter_of(tree: &mut DomTree, config: &FilterConfig, element: NodeId) -> u32 {
    let max = config.filter_max();
    let Some(data) = tree.element_mut(element) else {
        return max;
    };

    if let Some(cached) = data.data(&config.value_data_key).and_then(|v| v.parse::<u32>().ok()) {
        return cached & max;
    }
    if !data.has_class(&config.tag_class) {
        return max;
    }

    let parsed = data.classes.numeric_suffixes(&config.value_class_prefix).next();
    match parsed {
        Some(value) => {
            let mask = (value & u64::from(max)) as u32;
            data.set_data(&config.value_data_key, &mask.to_string());
            mask
        }
        None => max,
    }
}

/// Whether `element` is a filter tag
pub fn is_tag(tree: &DomTree, config: &FilterConfig, element: NodeId) -> bool {
    tree.has_class(element, &config.tag_class)
}

/// Every filter tag under `root`, in document order
pub fn tags(tree: &DomTree, config: &FilterConfig, root: NodeId) -> Vec<NodeId> {
    tree.elements_with_class(root, &config.tag_class)
}

/// Page-wide bitmask from the page-scope marker
///
/// The marker itself may be the tag, otherwise its first descendant tag is
/// used. A marker without any tag logs an error and leaves the page
/// unrestricted.
pub fn page_filter(doc: &mut Document, config: &FilterConfig) -> u32 {
    let Some(scope) = doc.get_element_by_id(&config.page_scope_id) else {
        return config.filter_max();
    };
    let tree = doc.tree_mut();
    if is_tag(tree, config, scope) {
        return filter_of(tree, config, scope);
    }
    match tree.first_with_class(scope, &config.tag_class) {
        Some(tag) => filter_of(tree, config, tag),
        None => {
            tracing::error!(
                "Neither the page context and any of its children have a filter value property."
            );
            config.filter_max()
        }
    }
}

/// Whether the content asks for filtering regardless of the page
pub fn is_filtering_forced(doc: &Document, config: &FilterConfig) -> bool {
    doc.tree()
        .first_with_class(NodeId::ROOT, &config.filter_enable_class)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(tree: &mut DomTree, classes: &[&str]) -> NodeId {
        let span = tree.create_element("span");
        for class in classes {
            tree.add_class(span, class);
        }
        tree.append_child(NodeId::ROOT, span).unwrap();
        span
    }

    #[test]
    fn test_filter_of_parses_and_caches() {
        let config = FilterConfig::default();
        let mut tree = DomTree::new();
        let t = tag(&mut tree, &["cf-tag", "cf-val-x", "cf-val-6", "cf-val-1"]);

        assert_eq!(filter_of(&mut tree, &config, t), 6);
        assert_eq!(tree.attr(t, "data-cf-val"), Some("6"));

        // Cached value wins over later class edits
        tree.remove_class(t, "cf-val-6");
        assert_eq!(filter_of(&mut tree, &config, t), 6);
    }

    #[test]
    fn test_filter_of_defaults() {
        let config = FilterConfig::default();
        let mut tree = DomTree::new();
        let plain = tag(&mut tree, &["cf-val-2"]);
        let bare = tag(&mut tree, &["cf-tag"]);
        let huge = tag(&mut tree, &["cf-tag", "cf-val-99"]);
        let text = tree.create_text("x");

        assert_eq!(filter_of(&mut tree, &config, plain), 31);
        assert_eq!(filter_of(&mut tree, &config, bare), 31);
        assert_eq!(filter_of(&mut tree, &config, huge), 99 & 31);
        assert_eq!(filter_of(&mut tree, &config, text), 31);
    }

    #[test]
    fn test_page_filter() {
        let config = FilterConfig::default();
        let mut doc = Document::new("about:blank");
        assert_eq!(page_filter(&mut doc, &config), 31);

        let body = doc.body().unwrap();
        let scope = doc.tree.create_element("div");
        doc.tree.set_attr(scope, "id", "cf-scope-page");
        doc.tree.append_child(body, scope).unwrap();
        assert_eq!(page_filter(&mut doc, &config), 31);

        let t = doc.tree.create_element("span");
        doc.tree.add_class(t, "cf-tag");
        doc.tree.add_class(t, "cf-val-12");
        doc.tree.append_child(scope, t).unwrap();
        assert_eq!(page_filter(&mut doc, &config), 12);
    }

    #[test]
    fn test_forced() {
        let config = FilterConfig::default();
        let mut doc = Document::new("about:blank");
        assert!(!is_filtering_forced(&doc, &config));
        let body = doc.body().unwrap();
        let marker = doc.tree.create_element("span");
        doc.tree.add_class(marker, "cf-enable");
        doc.tree.append_child(body, marker).unwrap();
        assert!(is_filtering_forced(&doc, &config));
    }
}
