//! Built-in implementations of the XPath 1.0 core function library.

use super::engine::{EvaluationContext, XPathValue, string_to_number};
use crate::axes;
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use crate::namespaces::XML_NAMESPACE;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Every function name an expression may call.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    // Node-set
    "last",
    "position",
    "count",
    "id",
    "local-name",
    "namespace-uri",
    "name",
    // String
    "string",
    "concat",
    "starts-with",
    "contains",
    "substring-before",
    "substring-after",
    "substring",
    "string-length",
    "normalize-space",
    "translate",
    // Boolean
    "boolean",
    "not",
    "true",
    "false",
    "lang",
    // Number
    "number",
    "sum",
    "floor",
    "ceiling",
    "round",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name)
}

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, N>,
) -> Result<XPathValue<N>, XPathError> {
    match name {
        // Node-set
        "last" => {
            check_arity(name, &args, 0..=0)?;
            Ok(XPathValue::Number(e_ctx.context_size as f64))
        }
        "position" => {
            check_arity(name, &args, 0..=0)?;
            Ok(XPathValue::Number(e_ctx.context_position as f64))
        }
        "count" => func_count(args),
        "id" => func_id(args, e_ctx),
        "local-name" => func_name_part(name, args, e_ctx, |q| q.local_part.to_string()),
        "namespace-uri" => func_name_part(name, args, e_ctx, |q| {
            q.namespace.unwrap_or_default().to_string()
        }),
        "name" => func_name_part(name, args, e_ctx, |q| match q.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, q.local_part),
            _ => q.local_part.to_string(),
        }),

        // String
        "string" => {
            let s = string_or_context(name, args, e_ctx)?;
            Ok(XPathValue::String(s))
        }
        "concat" => func_concat(args),
        "starts-with" => {
            let (s1, s2) = two_strings(name, args)?;
            Ok(XPathValue::Boolean(s1.starts_with(&s2)))
        }
        "contains" => {
            let (s1, s2) = two_strings(name, args)?;
            Ok(XPathValue::Boolean(s1.contains(&s2)))
        }
        "substring-before" => {
            let (s1, s2) = two_strings(name, args)?;
            let before = s1.find(&s2).map(|i| &s1[..i]).unwrap_or_default();
            Ok(XPathValue::String(before.to_string()))
        }
        "substring-after" => {
            let (s1, s2) = two_strings(name, args)?;
            let after = s1
                .find(&s2)
                .map(|i| &s1[i + s2.len()..])
                .unwrap_or_default();
            Ok(XPathValue::String(after.to_string()))
        }
        "substring" => func_substring(args),
        "string-length" => {
            let s = string_or_context(name, args, e_ctx)?;
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            let s = string_or_context(name, args, e_ctx)?;
            let normalized = s
                .split([' ', '\t', '\n', '\r'])
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Ok(XPathValue::String(normalized))
        }
        "translate" => func_translate(args),

        // Boolean
        "boolean" => {
            check_arity(name, &args, 1..=1)?;
            Ok(XPathValue::Boolean(args[0].to_bool()))
        }
        "not" => {
            check_arity(name, &args, 1..=1)?;
            Ok(XPathValue::Boolean(!args[0].to_bool()))
        }
        "true" => {
            check_arity(name, &args, 0..=0)?;
            Ok(XPathValue::Boolean(true))
        }
        "false" => {
            check_arity(name, &args, 0..=0)?;
            Ok(XPathValue::Boolean(false))
        }
        "lang" => func_lang(args, e_ctx),

        // Number
        "number" => {
            check_arity(name, &args, 0..=1)?;
            let n = match args.first() {
                Some(arg) => arg.to_number(),
                None => string_to_number(&e_ctx.context_node.string_value()),
            };
            Ok(XPathValue::Number(n))
        }
        "sum" => func_sum(args),
        "floor" => {
            check_arity(name, &args, 1..=1)?;
            Ok(XPathValue::Number(args[0].to_number().floor()))
        }
        "ceiling" => {
            check_arity(name, &args, 1..=1)?;
            Ok(XPathValue::Number(args[0].to_number().ceil()))
        }
        "round" => func_round(args),

        _ => Err(XPathError::UnknownFunction(name.to_string())),
    }
}

fn check_arity<N>(
    name: &str,
    args: &[XPathValue<N>],
    expected: RangeInclusive<usize>,
) -> Result<(), XPathError> {
    if expected.contains(&args.len()) {
        return Ok(());
    }
    let message = match (*expected.start(), *expected.end()) {
        (min, max) if min == max => format!("Expected {} argument(s), got {}", min, args.len()),
        (min, usize::MAX) => format!("Expected at least {} arguments, got {}", min, args.len()),
        (min, max) => format!("Expected {} to {} arguments, got {}", min, max, args.len()),
    };
    Err(XPathError::FunctionError {
        function: format!("{}()", name),
        message,
    })
}

fn string_or_context<'a, N: DataSourceNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, N>,
) -> Result<String, XPathError> {
    check_arity(name, &args, 0..=1)?;
    Ok(match args.pop() {
        Some(arg) => arg.to_string(),
        None => e_ctx.context_node.string_value(),
    })
}

fn two_strings<'a, N: DataSourceNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
) -> Result<(String, String), XPathError> {
    check_arity(name, &args, 2..=2)?;
    let s2 = args.remove(1).to_string();
    let s1 = args.remove(0).to_string();
    Ok((s1, s2))
}

fn node_set_arg<'a, N: DataSourceNode<'a>>(
    name: &str,
    value: XPathValue<N>,
) -> Result<Vec<N>, XPathError> {
    match value {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        v => Err(XPathError::TypeError(format!(
            "{}() argument must be a node-set, got a {}",
            name,
            v.type_name()
        ))),
    }
}

// --- Node-Set Functions ---

fn func_count<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("count", &args, 1..=1)?;
    let nodes = node_set_arg("count", args.remove(0))?;
    Ok(XPathValue::Number(nodes.len() as f64))
}

fn func_id<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("id", &args, 1..=1)?;

    let id_string = match args.remove(0) {
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .map(|n| n.string_value())
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    };
    let ids_to_find: HashSet<_> = id_string.split_whitespace().collect();
    if ids_to_find.is_empty() {
        return Ok(XPathValue::NodeSet(vec![]));
    }

    let mut descendants = Vec::new();
    axes::collect_descendant_nodes(e_ctx.root_node, &mut descendants);

    // Preorder traversal, so the result is already in document order.
    let results = descendants
        .into_iter()
        .filter(|node| node.node_type() == NodeType::Element)
        .filter(|node| {
            node.attributes().any(|attr| {
                attr.name().is_some_and(|q_name| {
                    let is_id_attr = q_name.local_part == "id"
                        && (q_name.namespace.is_none() || q_name.namespace == Some(XML_NAMESPACE));
                    is_id_attr && ids_to_find.contains(attr.string_value().as_str())
                })
            })
        })
        .collect();
    Ok(XPathValue::NodeSet(results))
}

/// Shared body of `local-name()`, `namespace-uri()`, and `name()`: applies
/// `part` to the first node of the argument, or to the context node.
fn func_name_part<'a, N: DataSourceNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, N>,
    part: impl Fn(crate::datasource::QName<'a>) -> String,
) -> Result<XPathValue<N>, XPathError> {
    check_arity(name, &args, 0..=1)?;
    let node = match args.pop() {
        None => Some(e_ctx.context_node),
        Some(arg) => node_set_arg(name, arg)?.first().copied(),
    };
    let value = node.and_then(|n| n.name()).map(part).unwrap_or_default();
    Ok(XPathValue::String(value))
}

// --- String Functions ---

fn func_concat<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("concat", &args, 2..=usize::MAX)?;
    let result = args.iter().map(|v| v.to_string()).collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_substring<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("substring", &args, 2..=3)?;
    let length_val = if args.len() == 3 {
        Some(args.remove(2).to_number())
    } else {
        None
    };
    let start_val = args.remove(1).to_number();
    let s = args.remove(0).to_string();

    // XPath rounding rules for start/length
    let first = round_half_up(start_val);
    let last = match length_val {
        Some(l) => first + round_half_up(l),
        None => f64::INFINITY,
    };

    let result = s
        .chars()
        .enumerate()
        .filter_map(|(i, c)| {
            let pos = (i + 1) as f64; // XPath positions are 1-based
            (pos >= first && pos < last).then_some(c)
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_translate<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("translate", &args, 3..=3)?;
    let to_str: Vec<char> = args.remove(2).to_string().chars().collect();
    let from_str: Vec<char> = args.remove(1).to_string().chars().collect();
    let source_str = args.remove(0).to_string();
    let result = source_str
        .chars()
        .filter_map(|c| match from_str.iter().position(|&fc| fc == c) {
            Some(pos) => to_str.get(pos).copied(),
            None => Some(c),
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

// --- Boolean Functions ---

fn func_lang<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("lang", &args, 1..=1)?;
    let test_lang = args.remove(0).to_string().to_lowercase();

    let mut current = Some(e_ctx.context_node);
    while let Some(node) = current {
        let declared = node.attributes().find(|attr| {
            attr.name().is_some_and(|q| {
                q.namespace == Some(XML_NAMESPACE) && q.local_part == "lang"
            })
        });
        if let Some(attr) = declared {
            // The nearest xml:lang decides; subcodes match their primary tag.
            let node_lang = attr.string_value().to_lowercase();
            let matches =
                node_lang == test_lang || node_lang.starts_with(&format!("{}-", test_lang));
            return Ok(XPathValue::Boolean(matches));
        }
        current = node.parent();
    }
    Ok(XPathValue::Boolean(false))
}

// --- Number Functions ---

fn func_sum<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("sum", &args, 1..=1)?;
    let sum = node_set_arg("sum", args.remove(0))?
        .iter()
        .map(|node| string_to_number(&node.string_value()))
        .sum();
    Ok(XPathValue::Number(sum))
}

fn func_round<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("round", &args, 1..=1)?;
    Ok(XPathValue::Number(round_half_up(args[0].to_number())))
}

/// XPath 1.0 rounds halves towards positive infinity.
fn round_half_up(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        return n;
    }
    (n + 0.5).floor()
}
