//! Engine configuration
//!
//! Every marker the engine reads from or writes to the rendered markup is
//! named here, together with the page-gating rules. Defaults match the
//! classes wiki templates emit; a TOML document may override any subset.

use serde::Deserialize;

use crate::error::EngineError;

/// Marker names and limits used by the filter engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Number of filter bits (buttons)
    pub filter_count: u32,
    /// Upper bound on merge steps for one selected element
    pub fold_iteration_cap: usize,

    /// Filter tag marker
    pub tag_class: String,
    /// Prefix of the bitmask class (`cf-val-<mask>`)
    pub value_class_prefix: String,
    /// Marker added to managed containers
    pub container_class: String,
    /// Main page content region
    pub body_content_class: String,
    /// Id of the element scoping a tag to the whole page
    pub page_scope_id: String,
    /// Scopes a tag to its surrounding section
    pub section_scope_class: String,
    /// Scopes a tag to the nearest context wrapper
    pub wrapped_scope_class: String,
    pub context_wrapper_class: String,
    /// Elements invisible to sibling walks
    pub skip_class: String,
    /// Known non-content classes treated like `skip_class`
    pub ghost_classes: Vec<String>,
    /// Start of trailing out-of-content blocks
    pub content_end_class: String,
    /// Forces filtering on pages that would not get it
    pub filter_enable_class: String,
    /// Wrappers created while resolving contexts
    pub generated_wrapper_class: String,
    /// Gallery caption and item classes
    pub gallery_text_class: String,
    pub gallery_box_class: String,

    /// Every element of a context carries this class
    pub context_class: String,
    /// Prefix of the per-context id class (`cf-context-<id>`)
    pub context_id_class_prefix: String,
    /// Dataset key caching a tag's context id
    pub context_data_key: String,
    /// Dataset key caching a tag's parsed bitmask
    pub value_data_key: String,

    /// Every view fragment carries this class
    pub view_class: String,
    /// Prefix of the per-view fragment class (`cf-view-<index>`)
    pub view_class_prefix: String,
    /// Prefix of the per-view marker class (`cf-view-marker-<index>`)
    pub view_marker_class_prefix: String,
    /// Prefix of the container's computed-view marker
    pub container_view_class_prefix: String,
    pub view_active_class: String,
    pub view_hover_class: String,
    pub context_hover_class: String,

    /// Heading anchor spans and the table of contents
    pub headline_class: String,
    pub toc_id: String,

    /// Namespaces where filtering is available
    pub namespaces: Vec<i32>,
    /// Special pages where filtering is available
    pub special_pages: Vec<String>,
    /// Display modes (actions) where filtering is available
    pub display_modes: Vec<String>,
    /// Query parameter carrying the selected filter
    pub url_parameter: String,
    /// Article path with `$1` standing for the title
    pub article_path: String,
    /// Links inside elements with this class are never rewritten
    pub button_class: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filter_count: 5,
            fold_iteration_cap: 100,
            tag_class: "cf-tag".into(),
            value_class_prefix: "cf-val-".into(),
            container_class: "cf-container".into(),
            body_content_class: "mw-body-content".into(),
            page_scope_id: "cf-scope-page".into(),
            section_scope_class: "cf-scope-section".into(),
            wrapped_scope_class: "cf-scope-wrapped".into(),
            context_wrapper_class: "cf-context-wrapper".into(),
            skip_class: "cf-skip".into(),
            ghost_classes: vec![
                "mw-collapsible-toggle".into(),
                "thumb".into(),
                "gpt-ad".into(),
            ],
            content_end_class: "cf-end".into(),
            filter_enable_class: "cf-enable".into(),
            generated_wrapper_class: "cf-wrapper".into(),
            gallery_text_class: "gallerytext".into(),
            gallery_box_class: "gallerybox".into(),
            context_class: "cf-context".into(),
            context_id_class_prefix: "cf-context-".into(),
            context_data_key: "cfContext".into(),
            value_data_key: "cfVal".into(),
            view_class: "cf-view".into(),
            view_class_prefix: "cf-view-".into(),
            view_marker_class_prefix: "cf-view-marker-".into(),
            container_view_class_prefix: "cf-container-view-".into(),
            view_active_class: "cf-view-active".into(),
            view_hover_class: "cf-view-hover".into(),
            context_hover_class: "cf-context-hover".into(),
            headline_class: "mw-headline".into(),
            toc_id: "toc".into(),
            namespaces: vec![0, 2],
            special_pages: vec!["Special:Random".into()],
            display_modes: vec!["view".into(), "edit".into()],
            url_parameter: "cfval".into(),
            article_path: "/wiki/$1".into(),
            button_class: "cf-button".into(),
        }
    }
}

impl FilterConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(source)?;
        tracing::debug!(
            filter_count = config.filter_count,
            cap = config.fold_iteration_cap,
            "Loaded filter configuration"
        );
        Ok(config)
    }

    /// Bitmask with every filter bit set
    pub fn filter_max(&self) -> u32 {
        match self.filter_count {
            0 => 0,
            n if n >= 32 => u32::MAX,
            n => (1u32 << n) - 1,
        }
    }

    /// Bit of the filter at `index`
    pub fn filter_bit(&self, index: usize) -> Result<u32, EngineError> {
        if index >= self.filter_count as usize {
            return Err(EngineError::InvalidFilterIndex {
                index,
                count: self.filter_count,
            });
        }
        Ok(1u32 << index)
    }

    pub fn context_id_class(&self, id: u64) -> String {
        format!("{}{}", self.context_id_class_prefix, id)
    }

    pub fn view_class_for(&self, index: usize) -> String {
        format!("{}{}", self.view_class_prefix, index)
    }

    pub fn view_marker_class_for(&self, index: usize) -> String {
        format!("{}{}", self.view_marker_class_prefix, index)
    }

    pub fn container_view_class_for(&self, index: usize) -> String {
        format!("{}{}", self.container_view_class_prefix, index)
    }

    /// Whether a class belongs to the marks a view computation leaves
    pub fn is_view_mark(&self, class: &str) -> bool {
        if class == self.view_class || class == self.view_active_class || class == self.view_hover_class {
            return true;
        }
        [
            &self.view_marker_class_prefix,
            &self.view_class_prefix,
            &self.container_view_class_prefix,
        ]
        .iter()
        .any(|prefix| {
            class
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.filter_max(), 31);
        assert_eq!(config.filter_bit(1).unwrap(), 2);
        assert!(matches!(
            config.filter_bit(5),
            Err(EngineError::InvalidFilterIndex { index: 5, count: 5 })
        ));
        assert_eq!(config.view_class_for(3), "cf-view-3");
    }

    #[test]
    fn test_partial_toml_override() {
        let config = FilterConfig::from_toml_str(
            r#"
            filter_count = 3
            namespaces = [0, 4]
            tag_class = "vf-tag"
            "#,
        )
        .unwrap();
        assert_eq!(config.filter_max(), 7);
        assert_eq!(config.namespaces, vec![0, 4]);
        assert_eq!(config.tag_class, "vf-tag");
        assert_eq!(config.container_class, "cf-container");
    }

    #[test]
    fn test_invalid_toml() {
        let err = FilterConfig::from_toml_str("filter_count = \"five\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_view_marks() {
        let config = FilterConfig::default();
        for mark in ["cf-view", "cf-view-2", "cf-view-marker-0", "cf-container-view-4", "cf-view-active"] {
            assert!(config.is_view_mark(mark), "{mark}");
        }
        for other in ["cf-viewer", "cf-view-x", "cf-container", "cf-context-2"] {
            assert!(!config.is_view_mark(other), "{other}");
        }
    }
}
