//! Page identity
//!
//! Which page the engine runs on, and whether filtering applies to it.

use crate::config::FilterConfig;

/// Canonical namespace names by id
const NAMESPACES: &[(i32, &str)] = &[
    (-2, "Media"),
    (-1, "Special"),
    (1, "Talk"),
    (2, "User"),
    (3, "User talk"),
    (4, "Project"),
    (5, "Project talk"),
    (6, "File"),
    (7, "File talk"),
    (8, "MediaWiki"),
    (9, "MediaWiki talk"),
    (10, "Template"),
    (11, "Template talk"),
    (12, "Help"),
    (13, "Help talk"),
    (14, "Category"),
    (15, "Category talk"),
];

/// Legacy names still accepted in links
const NAMESPACE_ALIASES: &[(i32, &str)] = &[(6, "Image"), (7, "Image talk")];

/// A page title split into namespace and text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTitle {
    namespace: i32,
    text: String,
}

impl PageTitle {
    /// Parse a prefixed title such as `User:Some_name`
    ///
    /// Underscores count as spaces and the first letter of the text is
    /// upper-cased. Unknown prefixes stay part of a main-namespace title.
    pub fn parse(raw: &str) -> Self {
        let normalized = normalize(raw);
        if let Some((prefix, rest)) = normalized.split_once(':') {
            if let Some(namespace) = namespace_id(prefix.trim()) {
                return Self {
                    namespace,
                    text: capitalize(rest.trim()),
                };
            }
        }
        Self {
            namespace: 0,
            text: capitalize(&normalized),
        }
    }

    pub fn namespace(&self) -> i32 {
        self.namespace
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Title with its canonical namespace prefix
    pub fn prefixed_text(&self) -> String {
        match NAMESPACES.iter().find(|(id, _)| *id == self.namespace) {
            Some((_, name)) => format!("{}:{}", name, self.text),
            None => self.text.clone(),
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn namespace_id(prefix: &str) -> Option<i32> {
    let wanted = normalize(prefix).to_lowercase();
    NAMESPACES
        .iter()
        .chain(NAMESPACE_ALIASES)
        .find(|(_, name)| name.to_lowercase() == wanted)
        .map(|(id, _)| *id)
}

/// The page the engine was loaded on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIdentity {
    pub title: PageTitle,
    /// Display mode (action) such as `view` or `edit`
    pub display_mode: String,
    pub is_redirect: bool,
}

impl PageIdentity {
    pub fn new(title: &str, display_mode: &str) -> Self {
        Self {
            title: PageTitle::parse(title),
            display_mode: display_mode.to_string(),
            is_redirect: false,
        }
    }

    pub fn redirect(mut self, is_redirect: bool) -> Self {
        self.is_redirect = is_redirect;
        self
    }
}

/// Whether filtering applies to a page
///
/// Redirects and display modes other than the configured ones never get
/// filtering; otherwise the namespace or the exact special page decides.
pub fn is_filtering_available(config: &FilterConfig, page: &PageIdentity) -> bool {
    if page.is_redirect || !config.display_modes.iter().any(|m| *m == page.display_mode) {
        return false;
    }
    if config.namespaces.contains(&page.title.namespace()) {
        return true;
    }
    let name = page.title.prefixed_text();
    config.special_pages.iter().any(|p| *p == name)
}
