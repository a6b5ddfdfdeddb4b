//! DOMStringMap (dataset)
//!
//! `data-*` attribute access by camelCase key. The engine caches per-tag
//! state here (`cfVal`, `cfContext`) so that a serialized page keeps it.

use std::collections::BTreeMap;

use crate::node::ElementData;

/// Snapshot of an element's data-* attributes keyed by camelCase name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DOMStringMap {
    data: BTreeMap<String, String>,
}

impl DOMStringMap {
    /// Collect the data-* attributes of an element
    pub fn of(element: &ElementData) -> Self {
        let data = element
            .attrs
            .iter()
            .filter_map(|attr| {
                let key = attr.name.strip_prefix("data-")?;
                Some((to_camel_case(key), attr.value.clone()))
            })
            .collect();
        Self { data }
    }

    /// Get value by camelCase key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get all keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(|s| s.as_str())
    }

    /// Convert key to attribute name
    pub fn attribute_name(key: &str) -> String {
        format!("data-{}", to_kebab_case(key))
    }
}

impl ElementData {
    /// Read a data-* attribute by camelCase key
    pub fn data(&self, key: &str) -> Option<&str> {
        self.get_attr(&DOMStringMap::attribute_name(key))
    }

    /// Write a data-* attribute by camelCase key
    pub fn set_data(&mut self, key: &str, value: &str) {
        self.set_attr(&DOMStringMap::attribute_name(key), value);
    }

    /// Delete a data-* attribute by camelCase key
    pub fn remove_data(&mut self, key: &str) -> bool {
        self.remove_attr(&DOMStringMap::attribute_name(key))
    }

    pub fn dataset(&self) -> DOMStringMap {
        DOMStringMap::of(self)
    }
}

/// Convert kebab-case to camelCase
fn to_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = false;

    for c in s.chars() {
        if c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Convert camelCase to kebab-case
fn to_kebab_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            result.push('-');
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_attributes() {
        let mut elem = ElementData::new("span");
        elem.set_data("cfContext", "4");
        elem.set_attr("title", "ignored");

        assert_eq!(elem.get_attr("data-cf-context"), Some("4"));
        assert_eq!(elem.data("cfContext"), Some("4"));

        let map = elem.dataset();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("cfContext"), Some("4"));

        assert!(elem.remove_data("cfContext"));
        assert!(elem.data("cfContext").is_none());
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_camel_case("cf-val"), "cfVal");
        assert_eq!(to_kebab_case("cfVal"), "cf-val");
        assert_eq!(DOMStringMap::attribute_name("simple"), "data-simple");
    }
}
