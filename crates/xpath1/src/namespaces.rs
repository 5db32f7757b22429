//! Prefix bindings used to resolve qualified names inside an expression.

use std::collections::HashMap;

/// The namespace permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A prefix → namespace URI table. Prefixes are case-sensitive and the most
/// recent registration for a prefix wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    bindings: HashMap<String, String>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `prefix` to `uri`, returning the URI it replaced, if any.
    pub fn register(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Option<String> {
        self.bindings.insert(prefix.into(), uri.into())
    }

    /// Looks up the URI bound to `prefix`. The `xml` prefix is always bound.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        match self.bindings.get(prefix) {
            Some(uri) => Some(uri.as_str()),
            None if prefix == "xml" => Some(XML_NAMESPACE),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }
}

impl<P: Into<String>, U: Into<String>> FromIterator<(P, U)> for NamespaceTable {
    fn from_iter<I: IntoIterator<Item = (P, U)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (prefix, uri) in iter {
            table.register(prefix, uri);
        }
        table
    }
}
