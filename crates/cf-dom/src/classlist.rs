//! DOMTokenList (classList)
//!
//! Space-separated class tokens. Besides the plain DOM operations it knows
//! about prefixed families such as `cf-view-0`, `cf-view-1`, which the
//! filter engine adds and strips in bulk.

/// DOMTokenList for managing space-separated tokens (e.g., classList)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DOMTokenList {
    tokens: Vec<String>,
}

impl DOMTokenList {
    /// Create empty token list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from space-separated string
    pub fn from_string(s: &str) -> Self {
        let mut list = Self::new();
        for token in s.split_whitespace() {
            list.add(token);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check if token exists
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Add a token, returns whether it was new
    pub fn add(&mut self, token: &str) -> bool {
        if token.is_empty() || self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }

    /// Remove a token, returns whether it was present
    pub fn remove(&mut self, token: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != token);
        before != self.tokens.len()
    }

    /// Toggle token, returns new state
    pub fn toggle(&mut self, token: &str, force: Option<bool>) -> bool {
        let on = force.unwrap_or(!self.contains(token));
        if on {
            self.add(token);
        } else {
            self.remove(token);
        }
        on
    }

    /// Keep only the tokens matching `keep`, returns how many were dropped
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|t| keep(t));
        before - self.tokens.len()
    }

    /// Suffixes of every token starting with `prefix`
    ///
    /// `cf-val-3` yields `3` for the prefix `cf-val-`.
    pub fn suffixes<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tokens.iter().filter_map(move |t| t.strip_prefix(prefix))
    }

    /// Numeric suffixes of every token starting with `prefix`
    pub fn numeric_suffixes<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = u64> + 'a {
        self.suffixes(prefix).filter_map(parse_digits)
    }

    /// Get value as string
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }

    /// Set from string
    pub fn set_value(&mut self, value: &str) {
        *self = Self::from_string(value);
    }

    /// Iterate over tokens
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }
}

/// Parse an all-digit suffix; signs and blanks are rejected
fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl std::fmt::Display for DOMTokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string_dedupes() {
        let list = DOMTokenList::from_string("cf-tag  cf-val-1 cf-tag");
        assert_eq!(list.len(), 2);
        assert_eq!(list.value(), "cf-tag cf-val-1");
    }

    #[test]
    fn test_add_remove() {
        let mut list = DOMTokenList::new();
        assert!(list.add("foo"));
        assert!(!list.add("foo"));
        assert!(!list.add(""));
        assert!(list.remove("foo"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut list = DOMTokenList::new();
        assert!(list.toggle("active", None));
        assert!(!list.toggle("active", None));
        assert!(list.toggle("active", Some(true)));
        assert!(list.toggle("active", Some(true)));
        assert!(list.contains("active"));
    }

    #[test]
    fn test_numeric_suffixes() {
        let list = DOMTokenList::from_string("cf-val-x cf-val-3 cf-val--1 cf-val-");
        let values: Vec<u64> = list.numeric_suffixes("cf-val-").collect();
        assert_eq!(values, vec![3]);
    }

    #[test]
    fn test_retain_prefix_family() {
        let mut list = DOMTokenList::from_string("cf-view cf-view-0 cf-view-marker-1 keep");
        let dropped = list.retain(|t| !t.starts_with("cf-view"));
        assert_eq!(dropped, 3);
        assert_eq!(list.value(), "keep");
    }
}
