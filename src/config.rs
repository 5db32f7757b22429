//! Step configuration: the flat property map an extraction is built from, and
//! `{name}` interpolation of property values against pipeline variables.

use crate::context::MessageContext;
use indexmap::IndexMap;
use log::warn;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Names the pipeline variable holding the XML text to parse.
pub const SOURCE_PROPERTY: &str = "source";
/// Set to `true` to log the stacktrace of unexpected failures.
pub const DEBUG_PROPERTY: &str = "debug";
/// `xmlns:<prefix>` binds a namespace prefix.
pub const NAMESPACE_MARKER: &str = "xmlns:";
/// `xpath:<variable>` asks for one extracted value.
pub const DIRECTIVE_MARKER: &str = "xpath:";

static VARIABLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{} ]+)\}").expect("BUG: invalid VARIABLE_REFERENCE regex literal")
});

/// Insertion-ordered string properties. Namespaces and directives are visited
/// in the order their keys were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a flat JSON object of string values.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Entries whose key starts with `marker`, as `(token, raw value)` where the
    /// token is the rest of the key. Keys with nothing after the marker are skipped.
    pub fn with_marker<'s>(
        &'s self,
        marker: &'s str,
    ) -> impl Iterator<Item = (&'s str, &'s str)> + 's {
        self.iter().filter_map(move |(key, value)| {
            let token = key.strip_prefix(marker)?;
            if token.is_empty() {
                warn!("Ignoring property '{}': nothing follows the '{}' marker", key, marker);
                return None;
            }
            Some((token, value))
        })
    }

    /// Whether `debug` is set to `true`, ignoring case and surrounding blanks.
    /// The value is not interpolated.
    pub fn debug(&self) -> bool {
        self.get(DEBUG_PROPERTY)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Reads an optional property: blank counts as absent, and so does a value
    /// that interpolates to the empty string.
    pub fn optional(&self, name: &str, ctx: &dyn MessageContext) -> Option<String> {
        let raw = self.get(name)?.trim();
        if raw.is_empty() {
            return None;
        }
        let resolved = resolve_value(raw, ctx);
        (!resolved.is_empty()).then_some(resolved)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}

/// Replaces every `{name}` span in `spec` with the current value of the pipeline
/// variable `name`, or with nothing if it is unset.
pub fn resolve_value(spec: &str, ctx: &dyn MessageContext) -> String {
    VARIABLE_REFERENCE
        .replace_all(spec, |caps: &Captures| {
            ctx.variable(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}
