#![forbid(unsafe_code)]

//! Inline formatting snapshots.

use std::collections::BTreeMap;
use std::fmt;

/// A set of inline style properties in effect at a position.
///
/// Compared by value: two positions share a styling context when their
/// computed `EditingStyle`s are equal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditingStyle {
    properties: BTreeMap<String, String>,
}

impl EditingStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property (builder).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Properties from `inner` override ours.
    pub fn merge(&mut self, inner: &EditingStyle) {
        for (k, v) in &inner.properties {
            self.properties.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for EditingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.properties {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}
