use regex::Regex;
use std::any::type_name;
use std::backtrace::Backtrace;
use std::io;
use std::sync::LazyLock;
use thiserror::Error;
use xtract_xpath1::XPathError;

/// Everything that can go wrong while running an extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("source variable resolves to null")]
    MissingSource,

    #[error("no xpaths provided")]
    NoDirectives,

    #[error("xpath does not resolve to one node. (length={length})")]
    Cardinality { length: usize },

    #[error(transparent)]
    Expression(#[from] XPathError),

    #[error(transparent)]
    XmlParse(#[from] roxmltree::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// How far a failure reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Affects one directive; the remaining directives still run.
    Local,
    /// Expected failure that ends the operation.
    Systemic,
    /// Failure nobody planned for. Ends the operation and carries a stacktrace.
    Unexpected,
}

impl ExtractError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ExtractError::Cardinality { .. } => ErrorClass::Local,
            ExtractError::MissingSource
            | ExtractError::NoDirectives
            | ExtractError::Expression(_) => ErrorClass::Systemic,
            ExtractError::XmlParse(_) | ExtractError::Io(_) => ErrorClass::Unexpected,
        }
    }

    /// `<qualified type of the underlying error>: <message>`.
    pub fn diagnostic(&self) -> String {
        let source_type = match self {
            ExtractError::Expression(_) => type_name::<XPathError>(),
            ExtractError::XmlParse(_) => type_name::<roxmltree::Error>(),
            ExtractError::Io(_) => type_name::<io::Error>(),
            _ => type_name::<ExtractError>(),
        };
        format!("{}: {}", source_type, self)
    }
}

static QUALIFIED_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(?:[a-zA-Z_$][a-zA-Z0-9_$]*(?:\.|::))+[a-zA-Z_$][a-zA-Z0-9_$]*: (.+)$")
        .expect("BUG: invalid QUALIFIED_PREFIX regex literal")
});

/// Drops a leading `some::qualified::Type: ` (or `dotted.Name: `) from a
/// diagnostic. Returns the input unchanged when there is no such prefix.
pub fn shorten(diagnostic: &str) -> &str {
    QUALIFIED_PREFIX
        .captures(diagnostic)
        .and_then(|caps| caps.get(1))
        .map_or(diagnostic, |m| m.as_str())
}

/// The values written to the pipeline when a failure is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub exception: String,
    pub error: String,
    pub stacktrace: Option<String>,
}

impl From<&ExtractError> for ErrorReport {
    fn from(err: &ExtractError) -> Self {
        let exception = err.diagnostic();
        let error = shorten(&exception).to_string();
        let stacktrace = (err.class() == ErrorClass::Unexpected)
            .then(|| format!("{}\n{}", exception, Backtrace::force_capture()));
        Self {
            exception,
            error,
            stacktrace,
        }
    }
}
