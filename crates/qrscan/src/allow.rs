// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! URL prefix acceptance filter.
//!
//! An empty [`AllowList`] accepts every value. A non-empty list accepts a
//! value iff at least one configured prefix is a literal, case-sensitive
//! match at the start of the value. Scheme and host casing, trailing slashes
//! and percent-encoding are not normalized.

use serde::{Deserialize, Serialize};

/// Ordered set of permitted URL prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AllowList {
    prefixes: Vec<String>,
}

impl AllowList {
    /// Create an allow-list that accepts every value.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Create an allow-list from prefixes, keeping the first occurrence of
    /// each duplicate.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for prefix in prefixes {
            list.push(prefix);
        }
        list
    }

    /// Append a prefix unless it is already present.
    pub fn push<S: Into<String>>(&mut self, prefix: S) {
        let prefix = prefix.into();
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Returns true if `value` may be surfaced as a successful scan result.
    pub fn is_allowed(&self, value: &str) -> bool {
        self.prefixes.is_empty() || self.matching_prefix(value).is_some()
    }

    /// The first configured prefix that matches `value`, if any.
    pub fn matching_prefix(&self, value: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|prefix| value.starts_with(prefix.as_str()))
            .map(String::as_str)
    }
}

impl From<Vec<String>> for AllowList {
    fn from(prefixes: Vec<String>) -> Self {
        AllowList::new(prefixes)
    }
}

impl From<AllowList> for Vec<String> {
    fn from(list: AllowList) -> Self {
        list.prefixes
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        AllowList::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_allows_everything() {
        let list = AllowList::allow_all();
        assert!(list.is_allowed("anything"));
        assert!(list.is_allowed(""));
        assert!(list.is_allowed("javascript:alert(1)"));
    }

    #[test]
    fn test_prefix_match() {
        let list = AllowList::new(["https://good.example/"]);
        assert!(list.is_allowed("https://good.example/x"));
        assert!(list.is_allowed("https://good.example/"));
        assert!(!list.is_allowed("https://evil.example/"));
        assert!(!list.is_allowed("https://good.example"));
    }

    #[test]
    fn test_case_sensitive_no_normalization() {
        let list = AllowList::new(["https://good.example/"]);
        assert!(!list.is_allowed("HTTPS://good.example/x"));
        assert!(!list.is_allowed("https://GOOD.example/x"));
        assert!(!list.is_allowed(" https://good.example/x"));
    }

    #[test]
    fn test_any_prefix_matches() {
        let list = AllowList::new(["https://a.example/", "myapp://"]);
        assert!(list.is_allowed("myapp://open?id=3"));
        assert!(list.is_allowed("https://a.example/page"));
        assert!(!list.is_allowed("https://b.example/page"));
        assert_eq!(list.matching_prefix("myapp://x"), Some("myapp://"));
        assert_eq!(list.matching_prefix("other"), None);
    }

    #[test]
    fn test_duplicates_dropped_order_kept() {
        let list = AllowList::new(["b://", "a://", "b://"]);
        assert_eq!(list.prefixes(), &["b://".to_string(), "a://".to_string()]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_deserialize_from_array() {
        let list: AllowList = serde_json::from_str(r#"["https://x.example/", "https://x.example/"]"#)
            .expect("valid allow-list");
        assert_eq!(list.len(), 1);
        assert!(list.is_allowed("https://x.example/a"));
    }
}
