//! The two configuration passes run before any expression is evaluated: one
//! collects namespace bindings, the other collects extraction directives.

use crate::config::{DIRECTIVE_MARKER, NAMESPACE_MARKER, Properties, resolve_value};
use crate::context::MessageContext;
use log::debug;
use xtract_xpath1::NamespaceTable;

/// One requested extraction: write the single node selected by `expression`
/// into the pipeline variable `variable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub variable: String,
    pub expression: String,
}

/// Builds the prefix table from every `xmlns:<prefix>` property. URIs are
/// interpolated; a later key for the same prefix replaces an earlier one.
pub fn namespace_table(properties: &Properties, ctx: &dyn MessageContext) -> NamespaceTable {
    let mut table = NamespaceTable::new();
    for (prefix, raw_uri) in properties.with_marker(NAMESPACE_MARKER) {
        let uri = resolve_value(raw_uri, ctx);
        debug!("Registering namespace prefix '{}' => '{}'", prefix, uri);
        table.register(prefix, uri);
    }
    table
}

/// Collects every `xpath:<variable>` property, in configuration order, with
/// the expression text interpolated.
pub fn extraction_request(properties: &Properties, ctx: &dyn MessageContext) -> Vec<Directive> {
    properties
        .with_marker(DIRECTIVE_MARKER)
        .map(|(variable, raw_expression)| Directive {
            variable: variable.to_string(),
            expression: resolve_value(raw_expression, ctx),
        })
        .collect()
}
