//! Runs one expression against a parsed document and turns the single
//! selected node into the extracted string.

use crate::error::ExtractError;
use xtract_xpath1::{DataSourceNode, NamespaceTable, NodeType, XPath, XPathError};

/// Compiles `expression` against `namespaces` and selects from `root`.
///
/// Syntax errors, unbound prefixes, and expressions that do not yield a
/// node-set all fail here.
pub fn evaluate<'a, N>(
    namespaces: &NamespaceTable,
    expression: &str,
    root: N,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    XPath::compile(expression, namespaces)?.select_nodes(root)
}

/// Requires exactly one node.
pub fn validate<N: Clone>(nodes: &[N]) -> Result<N, ExtractError> {
    match nodes {
        [node] => Ok(node.clone()),
        _ => Err(ExtractError::Cardinality {
            length: nodes.len(),
        }),
    }
}

/// The extracted value of a node. Only attributes, elements, and text nodes
/// have one; every other kind yields the empty string.
pub fn extract<'a, N: DataSourceNode<'a>>(node: &N) -> String {
    match node.node_type() {
        NodeType::Attribute | NodeType::Element | NodeType::Text => node.string_value(),
        NodeType::Root | NodeType::Comment | NodeType::ProcessingInstruction => String::new(),
    }
}
