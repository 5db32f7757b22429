//! Syntax tree produced by the parser and walked by the compiler and engine.

use crate::datasource::NodeType;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    /// `$name`. Parsed so the compiler can report it; never bound.
    Variable(String),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    /// A primary expression with predicates, e.g. `(//item)[1]`.
    Filter {
        primary: Box<Expression>,
        predicates: Vec<Expression>,
    },
    Path(LocationPath),
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Unary minus.
    Negate(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Union,
}

impl BinaryOperator {
    /// Binding strength; higher binds tighter. `|` is the tightest and is
    /// parsed separately because it only joins path expressions.
    pub fn precedence(self) -> u8 {
        use BinaryOperator::*;
        match self {
            Or => 1,
            And => 2,
            Equals | NotEquals => 3,
            LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => 4,
            Plus | Minus => 5,
            Multiply | Divide | Modulo => 6,
            Union => 7,
        }
    }

    pub fn symbol(self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Or => "or",
            And => "and",
            Equals => "=",
            NotEquals => "!=",
            LessThan => "<",
            LessThanOrEqual => "<=",
            GreaterThan => ">",
            GreaterThanOrEqual => ">=",
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "div",
            Modulo => "mod",
            Union => "|",
        }
    }
}

/// Where a location path begins.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStart {
    /// `/...`
    Root,
    /// A relative path such as `a/b`.
    ContextNode,
    /// The node-set produced by a filter expression, e.g. `id('x')/b`.
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub start: PathStart,
    pub steps: Vec<Step>,
}

/// `axis::node-test[predicate]*`
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expression>,
}

impl Step {
    pub fn new(axis: Axis, node_test: NodeTest) -> Self {
        Self {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }

    /// The step `//` stands for.
    pub fn descendant_or_self() -> Self {
        Self::new(Axis::DescendantOrSelf, NodeTest::Node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Attribute,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfAxis,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    /// Looks up an axis by its name in `name::test`. `namespace` is not supported.
    pub fn from_name(name: &str) -> Option<Self> {
        let axis = match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "attribute" => Axis::Attribute,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "self" => Axis::SelfAxis,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            _ => return None,
        };
        Some(axis)
    }

    /// The node kind that `*` and name tests select on this axis.
    pub fn principal_node_type(self) -> NodeType {
        match self {
            Axis::Attribute => NodeType::Attribute,
            _ => NodeType::Element,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`
    AnyName,
    /// `name`, `prefix:name`, or `prefix:*`.
    Name(NameTest),
    /// `text()`
    Text,
    /// `comment()`
    Comment,
    /// `processing-instruction()`, optionally limited to one target.
    ProcessingInstruction(Option<String>),
    /// `node()`
    Node,
}

/// The parser fills in `prefix` and `local_part`; the compiler binds
/// `namespace` from the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTest {
    pub prefix: Option<String>,
    /// `None` for `prefix:*`.
    pub local_part: Option<String>,
    pub namespace: Option<String>,
}

impl NameTest {
    pub fn local(local_part: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_part: Some(local_part.into()),
            namespace: None,
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local_part: Option<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local_part,
            namespace: None,
        }
    }
}
