//! XPath 1.0 expression parser built with `nom`.
//!
//! Binary operators are handled by precedence climbing over
//! [`BinaryOperator::precedence`]; everything below unary minus follows the
//! grammar productions directly.

use crate::ast::{Axis, BinaryOperator, Expression, LocationPath, NameTest, NodeTest, PathStart, Step};
use crate::error::XPathError;
use std::cell::Cell;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, satisfy},
    combinator::{map, map_res, not, opt, recognize, value},
    error::ErrorKind,
    multi::{fold_many0, many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

type NomError<'a> = nom::error::Error<&'a str>;

/// Deepest nesting of sub-expressions, predicates, and unary minus accepted.
/// Every level costs parser and evaluator stack.
pub const MAX_NESTING: usize = 64;

thread_local! {
    static NESTING: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of nesting for as long as it lives.
struct NestingGuard;

impl NestingGuard {
    fn enter(input: &str) -> Result<Self, nom::Err<NomError<'_>>> {
        NESTING.with(|depth| {
            if depth.get() >= MAX_NESTING {
                return Err(nom::Err::Failure(NomError::new(input, ErrorKind::TooLarge)));
            }
            depth.set(depth.get() + 1);
            Ok(NestingGuard)
        })
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        NESTING.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Node kind tests. These names are never function calls.
const KIND_TESTS: [&str; 4] = ["text", "comment", "node", "processing-instruction"];

/// Parses a complete expression. Leading and trailing whitespace is ignored;
/// anything else left over is an error.
pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    let source = input.trim();
    let failure = |rest: &str| XPathError::Syntax {
        expression: input.to_string(),
        message: if rest.is_empty() {
            "unexpected end of expression".to_string()
        } else {
            format!("unexpected '{}' at offset {}", rest, source.len() - rest.len())
        },
    };
    match expression(source) {
        Ok(("", expr)) => Ok(expr),
        Ok((rest, _)) => Err(failure(rest)),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(XPathError::Syntax {
            expression: input.to_string(),
            message: format!("nested deeper than {} levels", MAX_NESTING),
        }),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(failure(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(failure("")),
    }
}

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn reject<'a, O>(input: &'a str, kind: ErrorKind) -> IResult<&'a str, O> {
    Err(nom::Err::Error(NomError::new(input, kind)))
}

fn expression(input: &str) -> IResult<&str, Expression> {
    let _level = NestingGuard::enter(input)?;
    binary_expr(input, 1)
}

/// Parses operands joined by operators binding at least as tightly as
/// `min_precedence`. Operators of equal precedence associate to the left.
fn binary_expr(input: &str, min_precedence: u8) -> IResult<&str, Expression> {
    let (mut rest, mut left) = unary_expr(input)?;
    while let Ok((after_op, op)) = ws(binary_operator).parse(rest) {
        if op.precedence() < min_precedence {
            break;
        }
        let (after_right, right) = binary_expr(after_op, op.precedence() + 1)?;
        left = Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        rest = after_right;
    }
    Ok((rest, left))
}

fn binary_operator(input: &str) -> IResult<&str, BinaryOperator> {
    use BinaryOperator::*;
    alt((
        value(LessThanOrEqual, tag("<=")),
        value(GreaterThanOrEqual, tag(">=")),
        value(NotEquals, tag("!=")),
        value(Equals, char('=')),
        value(LessThan, char('<')),
        value(GreaterThan, char('>')),
        value(Plus, char('+')),
        value(Minus, char('-')),
        value(Multiply, char('*')),
        value(Or, keyword("or")),
        value(And, keyword("and")),
        value(Divide, keyword("div")),
        value(Modulo, keyword("mod")),
    ))
    .parse(input)
}

/// An operator name that is not the start of a longer name.
fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = NomError<'a>> {
    terminated(tag(word), not(satisfy(is_name_char)))
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    alt((negation, union_expr)).parse(input)
}

fn negation(input: &str) -> IResult<&str, Expression> {
    let (rest, _) = ws(char::<&str, NomError<'_>>('-')).parse(input)?;
    let _level = NestingGuard::enter(input)?;
    let (rest, operand) = unary_expr(rest)?;
    Ok((rest, Expression::Negate(Box::new(operand))))
}

fn union_expr(input: &str) -> IResult<&str, Expression> {
    let (mut rest, mut left) = path_expr(input)?;
    loop {
        let (after, right) = match preceded(ws(char('|')), path_expr).parse(rest) {
            Ok(parsed) => parsed,
            Err(nom::Err::Error(_)) => return Ok((rest, left)),
            Err(e) => return Err(e),
        };
        left = Expression::Binary {
            op: BinaryOperator::Union,
            left: Box::new(left),
            right: Box::new(right),
        };
        rest = after;
    }
}

/// A filter expression optionally continued by steps, or a plain location path.
/// Filter expressions go first so `count(x)` is not read as a step named `count`.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    let (rest, primary) = match filter_expr(input) {
        Ok(parsed) => parsed,
        Err(nom::Err::Error(_)) => return map(location_path, Expression::Path).parse(input),
        Err(e) => return Err(e),
    };
    let (rest, steps) = following_steps(rest)?;
    if steps.is_empty() {
        return Ok((rest, primary));
    }
    let path = LocationPath {
        start: PathStart::Expression(Box::new(primary)),
        steps,
    };
    Ok((rest, Expression::Path(path)))
}

fn filter_expr(input: &str) -> IResult<&str, Expression> {
    let (rest, primary) = primary_expr(input)?;
    let (rest, predicates) = many0(predicate).parse(rest)?;
    if predicates.is_empty() {
        Ok((rest, primary))
    } else {
        let filter = Expression::Filter {
            primary: Box::new(primary),
            predicates,
        };
        Ok((rest, filter))
    }
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(preceded(char('$'), q_name), |name| {
            Expression::Variable(name.to_string())
        }),
        map(number_literal, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(char('('), ws(expression), char(')')),
    )))
    .parse(input)
}

fn function_call(input: &str) -> IResult<&str, Expression> {
    let (rest, name) = q_name(input)?;
    if KIND_TESTS.contains(&name) {
        return reject(input, ErrorKind::Verify);
    }
    let (rest, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )
    .parse(rest)?;
    let call = Expression::FunctionCall {
        name: name.to_string(),
        args,
    };
    Ok((rest, call))
}

/// `Digits ('.' Digits?)? | '.' Digits`. Exponents and signs are not part of
/// the XPath 1.0 number syntax.
fn number_literal(input: &str) -> IResult<&str, f64> {
    map_res(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        str::parse::<f64>,
    )
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(alt((quoted('\''), quoted('"'))), str::to_string).parse(input)
}

fn quoted<'a>(quote: char) -> impl Parser<&'a str, Output = &'a str, Error = NomError<'a>> {
    delimited(char(quote), take_while(move |c: char| c != quote), char(quote))
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (rest, (start, mut steps)) = alt((
        map(preceded(tag("//"), step), |first| {
            (PathStart::Root, vec![Step::descendant_or_self(), first])
        }),
        // A lone `/` is the root itself.
        map(preceded(terminated(char('/'), not(char('/'))), opt(step)), |first| {
            (PathStart::Root, first.into_iter().collect::<Vec<_>>())
        }),
        map(step, |first| (PathStart::ContextNode, vec![first])),
    ))
    .parse(input)?;
    let (rest, more) = following_steps(rest)?;
    steps.extend(more);
    Ok((rest, LocationPath { start, steps }))
}

/// Zero or more `/step` or `//step` continuations.
fn following_steps(input: &str) -> IResult<&str, Vec<Step>> {
    fold_many0(
        pair(ws(alt((tag("//"), tag("/")))), step),
        Vec::new,
        |mut steps, (separator, next)| {
            if separator == "//" {
                steps.push(Step::descendant_or_self());
            }
            steps.push(next);
            steps
        },
    )
    .parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    let (rest, (axis, node_test)) = alt((
        value((Axis::Parent, NodeTest::Node), tag("..")),
        value((Axis::SelfAxis, NodeTest::Node), char('.')),
        map(preceded(ws(char('@')), node_test), |test| (Axis::Attribute, test)),
        pair(axis_specifier, node_test),
        map(node_test, |test| (Axis::Child, test)),
    ))
    .parse(input)?;
    let (rest, predicates) = many0(predicate).parse(rest)?;
    Ok((
        rest,
        Step {
            axis,
            node_test,
            predicates,
        },
    ))
}

fn axis_specifier(input: &str) -> IResult<&str, Axis> {
    let (rest, name) = terminated(
        take_while1::<_, &str, NomError<'_>>(|c: char| c.is_ascii_lowercase() || c == '-'),
        ws(tag("::")),
    )
    .parse(input)?;
    match Axis::from_name(name) {
        Some(axis) => Ok((rest, axis)),
        None => reject(input, ErrorKind::Tag),
    }
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((kind_test, value(NodeTest::AnyName, char('*')), name_test)).parse(input)
}

fn kind_test(input: &str) -> IResult<&str, NodeTest> {
    let (rest, kind) = terminated(nc_name, ws(char('('))).parse(input)?;
    let (rest, test) = match kind {
        "text" => (rest, NodeTest::Text),
        "comment" => (rest, NodeTest::Comment),
        "node" => (rest, NodeTest::Node),
        "processing-instruction" => {
            let (rest, target) = opt(ws(string_literal)).parse(rest)?;
            (rest, NodeTest::ProcessingInstruction(target))
        }
        _ => return reject(input, ErrorKind::Tag),
    };
    let (rest, _) = char::<&str, NomError<'_>>(')').parse(rest)?;
    Ok((rest, test))
}

/// `local`, `prefix:local`, or `prefix:*`.
fn name_test(input: &str) -> IResult<&str, NodeTest> {
    let (rest, first) = nc_name(input)?;
    let (rest, second) = opt(preceded(
        char(':'),
        alt((value(None, char('*')), map(nc_name, Some))),
    ))
    .parse(rest)?;
    let test = match second {
        None => NameTest::local(first),
        Some(local) => NameTest::prefixed(first, local.map(str::to_string)),
    };
    Ok((rest, NodeTest::Name(test)))
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_name_char),
    ))
    .parse(input)
}

fn q_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(nc_name, opt(pair(char(':'), nc_name)))).parse(input)
}
