//! Namespace URI to alias table

use indexmap::map::Iter;
use indexmap::IndexMap;

/// Flat mapping from a declared namespace URI to the alias that replaces it
/// in qualified names.
///
/// Entries are kept in declaration order. A later declaration of the same URI
/// overwrites the alias in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    aliases: IndexMap<String, String>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `uri` under `alias`. An empty alias marks a default namespace.
    pub fn register(&mut self, uri: impl Into<String>, alias: impl Into<String>) {
        self.aliases.insert(uri.into(), alias.into());
    }

    /// Alias registered for `uri`
    pub fn alias(&self, uri: &str) -> Option<&str> {
        self.aliases.get(uri).map(String::as_str)
    }

    /// Replace `space` with its alias when the table knows it
    pub fn resolve(&self, space: &mut String) {
        if let Some(alias) = self.aliases.get(space.as_str()) {
            space.clone_from(alias);
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Iterate `(uri, alias)` pairs in declaration order
    pub fn iter(&self) -> Iter<'_, String, String> {
        self.aliases.iter()
    }
}

impl<'a> IntoIterator for &'a NamespaceTable {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NamespaceTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (uri, alias) in iter {
            table.register(uri, alias);
        }
        table
    }
}
