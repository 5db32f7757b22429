//! Contains pure functions for evaluating XPath binary operators.

use super::ast::BinaryOperator;
use super::engine::{XPathValue, string_to_number};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;

pub fn evaluate<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    use BinaryOperator::*;
    match op {
        Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            Ok(XPathValue::Boolean(compare(op, &left, &right)))
        }
        Plus => Ok(XPathValue::Number(left.to_number() + right.to_number())),
        Minus => Ok(XPathValue::Number(left.to_number() - right.to_number())),
        Multiply => Ok(XPathValue::Number(left.to_number() * right.to_number())),
        Divide => Ok(XPathValue::Number(left.to_number() / right.to_number())),
        Modulo => Ok(XPathValue::Number(left.to_number() % right.to_number())),
        Union => evaluate_union(left, right),
    }
}

/// Comparisons involving a node-set hold if they hold for at least one node.
fn compare<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let right_strings: Vec<String> = r.iter().map(|n| n.string_value()).collect();
            l.iter().any(|node| {
                let left_string: XPathValue<N> = XPathValue::String(node.string_value());
                right_strings.iter().any(|s| {
                    compare_atomic::<N>(op, &left_string, &XPathValue::String(s.clone()))
                })
            })
        }
        (XPathValue::NodeSet(nodes), other) => compare_node_set(op, nodes, other, true),
        (other, XPathValue::NodeSet(nodes)) => compare_node_set(op, nodes, other, false),
        _ => compare_atomic(op, left, right),
    }
}

fn compare_node_set<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    nodes: &[N],
    other: &XPathValue<N>,
    nodes_on_left: bool,
) -> bool {
    let ordered = |from_nodes: XPathValue<N>| {
        if nodes_on_left {
            compare_atomic(op, &from_nodes, other)
        } else {
            compare_atomic(op, other, &from_nodes)
        }
    };
    match other {
        XPathValue::Boolean(_) => ordered(XPathValue::Boolean(!nodes.is_empty())),
        XPathValue::Number(_) => nodes
            .iter()
            .any(|n| ordered(XPathValue::Number(string_to_number(&n.string_value())))),
        XPathValue::String(_) => nodes
            .iter()
            .any(|n| ordered(XPathValue::String(n.string_value()))),
        XPathValue::NodeSet(_) => false,
    }
}

fn compare_atomic<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    use BinaryOperator::*;
    match op {
        Equals | NotEquals => {
            let equal = match (left, right) {
                (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => {
                    left.to_bool() == right.to_bool()
                }
                (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
                    left.to_number() == right.to_number()
                }
                _ => left.to_string() == right.to_string(),
            };
            if op == Equals { equal } else { !equal }
        }
        LessThan => left.to_number() < right.to_number(),
        LessThanOrEqual => left.to_number() <= right.to_number(),
        GreaterThan => left.to_number() > right.to_number(),
        GreaterThanOrEqual => left.to_number() >= right.to_number(),
        _ => false,
    }
}

fn evaluate_union<'a, N: DataSourceNode<'a> + 'a>(
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    match (left, right) {
        (XPathValue::NodeSet(mut merged), XPathValue::NodeSet(more)) => {
            merged.extend(more);
            merged.sort();
            merged.dedup();
            Ok(XPathValue::NodeSet(merged))
        }
        (left, right) => Err(XPathError::TypeError(format!(
            "both operands of '{}' must be node-sets, got a {} and a {}",
            BinaryOperator::Union.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}
