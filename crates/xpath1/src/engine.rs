//! Expression evaluation over any [`DataSourceNode`] tree.

use super::ast::{Axis, Expression, LocationPath, NodeTest, PathStart, Step};
use super::{axes, functions, operators};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use std::fmt;
use std::marker::PhantomData;

/// The four XPath 1.0 value types.
#[derive(Debug, Clone)]
pub enum XPathValue<N> {
    /// Nodes in document order, without duplicates.
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    /// `boolean()` conversion.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::Boolean(b) => *b,
            XPathValue::Number(n) => !(n.is_nan() || *n == 0.0),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
        }
    }

    /// `number()` conversion. A node-set converts through the string value of
    /// its first node.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Boolean(b) => f64::from(u8::from(*b)),
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => string_to_number(s),
            XPathValue::NodeSet(_) => string_to_number(&self.to_string()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            XPathValue::Boolean(_) => "boolean",
            XPathValue::Number(_) => "number",
            XPathValue::String(_) => "string",
            XPathValue::NodeSet(_) => "node-set",
        }
    }
}

/// `string()` conversion.
impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::Boolean(b) => write!(f, "{}", b),
            XPathValue::Number(n) => f.write_str(&number_to_string(*n)),
            XPathValue::String(s) => f.write_str(s),
            XPathValue::NodeSet(nodes) => match nodes.first() {
                Some(first) => f.write_str(&first.string_value()),
                None => Ok(()),
            },
        }
    }
}

/// Converts a string to a number. Only an optional minus sign followed by
/// digits with an optional fraction is accepted; anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let well_formed = !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if well_formed {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// The context node plus its 1-based position in, and the size of, the node
/// list being filtered. `'a` is the lifetime of the underlying document.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a, N: DataSourceNode<'a>> {
    pub context_node: N,
    pub root_node: N,
    pub context_position: usize,
    pub context_size: usize,
    _marker: PhantomData<&'a ()>,
}

impl<'a, N: DataSourceNode<'a>> EvaluationContext<'a, N> {
    pub fn new(context_node: N, root_node: N, context_position: usize, context_size: usize) -> Self {
        Self {
            context_node,
            root_node,
            context_position,
            context_size,
            _marker: PhantomData,
        }
    }

    /// A context whose only node is the document root.
    pub fn for_root(root_node: N) -> Self {
        Self::new(root_node, root_node, 1, 1)
    }

    fn with_focus(&self, context_node: N, context_position: usize, context_size: usize) -> Self {
        Self::new(context_node, self.root_node, context_position, context_size)
    }
}

/// Evaluates `expr` against the focus in `e_ctx`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let value = match expr {
        Expression::Literal(s) => XPathValue::String(s.clone()),
        Expression::Number(n) => XPathValue::Number(*n),
        Expression::Variable(name) => return Err(XPathError::UnknownVariable(name.clone())),
        Expression::Path(path) => XPathValue::NodeSet(select_path(path, e_ctx)?),
        Expression::FunctionCall { name, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, e_ctx))
                .collect::<Result<Vec<_>, _>>()?;
            return functions::evaluate_function(name, args, e_ctx);
        }
        Expression::Filter {
            primary,
            predicates,
        } => {
            let nodes = node_set(evaluate(primary, e_ctx)?, "A filtered expression")?;
            XPathValue::NodeSet(apply_predicates(nodes, predicates, e_ctx)?)
        }
        Expression::Binary { op, left, right } => {
            return operators::evaluate(*op, evaluate(left, e_ctx)?, evaluate(right, e_ctx)?);
        }
        Expression::Negate(operand) => XPathValue::Number(-evaluate(operand, e_ctx)?.to_number()),
    };
    Ok(value)
}

fn node_set<'a, N: DataSourceNode<'a>>(
    value: XPathValue<N>,
    what: &str,
) -> Result<Vec<N>, XPathError> {
    if let XPathValue::NodeSet(nodes) = value {
        return Ok(nodes);
    }
    Err(XPathError::TypeError(format!(
        "{} must evaluate to a node-set, got a {}",
        what,
        value.type_name()
    )))
}

fn select_path<'a, N>(path: &LocationPath, e_ctx: &EvaluationContext<'a, N>) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let start = match &path.start {
        PathStart::Root => vec![e_ctx.root_node],
        PathStart::ContextNode => vec![e_ctx.context_node],
        PathStart::Expression(expr) => node_set(evaluate(expr, e_ctx)?, "The start of a path")?,
    };
    path.steps
        .iter()
        .try_fold(start, |nodes, step| select_step(step, &nodes, e_ctx))
}

/// Each context node is expanded along the axis and filtered on its own, so
/// positional predicates count within that node's axis. The merged result is
/// in document order.
fn select_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut selected = Vec::new();
    let mut candidates = Vec::new();
    for &node in context_nodes {
        candidates.clear();
        axes::collect(step.axis, node, &mut candidates);
        candidates.retain(|candidate| matches_node_test(candidate, &step.node_test, step.axis));
        selected.extend(apply_predicates(candidates.clone(), &step.predicates, e_ctx)?);
    }
    selected.sort();
    selected.dedup();
    Ok(selected)
}

fn matches_node_test<'a, N: DataSourceNode<'a>>(node: &N, test: &NodeTest, axis: Axis) -> bool {
    let kind = node.node_type();
    match test {
        NodeTest::Node => true,
        NodeTest::Text => kind == NodeType::Text,
        NodeTest::Comment => kind == NodeType::Comment,
        NodeTest::ProcessingInstruction(target) => {
            kind == NodeType::ProcessingInstruction
                && target.as_deref().is_none_or(|wanted| {
                    node.name().is_some_and(|name| name.local_part == wanted)
                })
        }
        NodeTest::AnyName => kind == axis.principal_node_type(),
        NodeTest::Name(wanted) => {
            kind == axis.principal_node_type()
                && node.name().is_some_and(|name| {
                    name.namespace == wanted.namespace.as_deref()
                        && wanted
                            .local_part
                            .as_deref()
                            .is_none_or(|local| local == name.local_part)
                })
        }
    }
}

/// Keeps the nodes every predicate accepts, applying predicates one after the
/// other. Positions follow the order of `nodes`, and a numeric predicate is
/// true only at the matching position.
fn apply_predicates<'a, N>(
    mut nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    for predicate in predicates {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (index, node) in nodes.into_iter().enumerate() {
            let position = index + 1;
            let accepted = match evaluate(predicate, &e_ctx.with_focus(node, position, size))? {
                XPathValue::Number(n) => n == position as f64,
                other => other.to_bool(),
            };
            if accepted {
                kept.push(node);
            }
        }
        nodes = kept;
    }
    Ok(nodes)
}
