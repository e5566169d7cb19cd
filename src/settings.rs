//! ---
//! quorum_section: "testing-security"
//! quorum_subsection: "module"
//! quorum_type: "source"
//! quorum_scope: "code"
//! quorum_description: "Flat settings map consumed by node and client bootstrap."
//! quorum_version: "v0.1.0"
//! quorum_owner: "tbd"
//! ---
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Flat, insertion-ordered key/value settings map.
///
/// Node-bootstrap and client-bootstrap code consume these maps verbatim; the
/// fixture never interprets the keys itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    entries: IndexMap<String, String>,
}

impl Settings {
    /// Create an empty settings map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a chainable builder.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Chainable builder for [`Settings`].
///
/// Later puts overwrite earlier ones; merged maps keep the insertion order of
/// first appearance.
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    entries: IndexMap<String, String>,
}

impl SettingsBuilder {
    /// Set a single key. Values are rendered with `ToString`, so booleans and
    /// numbers can be passed directly.
    pub fn put(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.entries.insert(key.into(), value.to_string());
        self
    }

    /// Merge every entry of another settings map.
    pub fn put_all(mut self, other: &Settings) -> Self {
        for (key, value) in other.iter() {
            self.entries.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Finalize into an immutable [`Settings`] map.
    pub fn build(self) -> Settings {
        Settings {
            entries: self.entries,
        }
    }
}
