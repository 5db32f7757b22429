//! An XPath 1.0 engine over any tree that implements [`DataSourceNode`].
//!
//! Expressions are compiled once against a [`NamespaceTable`] into an [`XPath`],
//! then evaluated against a document root.

pub mod ast;
pub mod axes;
pub mod compile;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod namespaces;
pub mod operators;
pub mod parser;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NameTest, NodeTest, PathStart, Step};
pub use compile::XPath;
pub use datasource::{DataSourceNode, NodeType, QName};
pub use engine::{EvaluationContext, XPathValue, evaluate};
pub use error::XPathError;
pub use namespaces::{NamespaceTable, XML_NAMESPACE};
pub use parser::parse_expression;
