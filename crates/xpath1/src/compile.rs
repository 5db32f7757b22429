//! Compiles expression text into a reusable, namespace-bound `XPath`.

use crate::ast::{Expression, LocationPath, NodeTest, PathStart};
use crate::datasource::DataSourceNode;
use crate::engine::{self, EvaluationContext, XPathValue};
use crate::error::XPathError;
use crate::functions;
use crate::namespaces::NamespaceTable;
use crate::parser::parse_expression;

/// A parsed expression whose prefixes have been resolved. Compiling does all the
/// static checks, so evaluation only fails on dynamic type errors.
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    source: String,
    expression: Expression,
}

impl XPath {
    /// Parses `source` and binds every prefixed name test to its namespace URI.
    ///
    /// Fails if the text is not a valid expression, names a prefix missing from
    /// `namespaces`, calls a function outside the core library, or references a
    /// variable (none are ever in scope).
    pub fn compile(source: &str, namespaces: &NamespaceTable) -> Result<Self, XPathError> {
        let mut expression = parse_expression(source)?;
        bind_expression(&mut expression, namespaces)?;
        Ok(Self {
            source: source.to_string(),
            expression,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Evaluates the expression with the document root as the context node.
    pub fn evaluate<'a, N>(&self, root: N) -> Result<XPathValue<N>, XPathError>
    where
        N: DataSourceNode<'a> + 'a,
    {
        engine::evaluate(&self.expression, &EvaluationContext::for_root(root))
    }

    /// Evaluates the expression and requires a node-set, returned in document order.
    pub fn select_nodes<'a, N>(&self, root: N) -> Result<Vec<N>, XPathError>
    where
        N: DataSourceNode<'a> + 'a,
    {
        match self.evaluate(root)? {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            _ => Err(XPathError::NotANodeSet(self.source.clone())),
        }
    }
}

fn bind_expression(expr: &mut Expression, namespaces: &NamespaceTable) -> Result<(), XPathError> {
    match expr {
        Expression::Literal(_) | Expression::Number(_) => Ok(()),
        Expression::Variable(name) => Err(XPathError::UnknownVariable(name.clone())),
        Expression::FunctionCall { name, args } => {
            if !functions::is_builtin(name) {
                return Err(XPathError::UnknownFunction(name.clone()));
            }
            args.iter_mut()
                .try_for_each(|arg| bind_expression(arg, namespaces))
        }
        Expression::Filter {
            primary,
            predicates,
        } => {
            bind_expression(primary, namespaces)?;
            predicates
                .iter_mut()
                .try_for_each(|p| bind_expression(p, namespaces))
        }
        Expression::Path(path) => bind_path(path, namespaces),
        Expression::Binary { left, right, .. } => {
            bind_expression(left, namespaces)?;
            bind_expression(right, namespaces)
        }
        Expression::Negate(operand) => bind_expression(operand, namespaces),
    }
}

fn bind_path(path: &mut LocationPath, namespaces: &NamespaceTable) -> Result<(), XPathError> {
    if let PathStart::Expression(start) = &mut path.start {
        bind_expression(start, namespaces)?;
    }
    for step in &mut path.steps {
        if let NodeTest::Name(test) = &mut step.node_test {
            if let Some(prefix) = &test.prefix {
                let uri = namespaces
                    .resolve(prefix)
                    .ok_or_else(|| XPathError::UnresolvedPrefix(prefix.clone()))?;
                // A prefix bound to the empty URI selects names in no namespace.
                test.namespace = (!uri.is_empty()).then(|| uri.to_string());
            }
        }
        for predicate in &mut step.predicates {
            bind_expression(predicate, namespaces)?;
        }
    }
    Ok(())
}
