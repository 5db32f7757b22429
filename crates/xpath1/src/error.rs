use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("XPath parse error in '{expression}': {message}")]
    Syntax { expression: String, message: String },

    #[error("Prefix must resolve to a namespace: {0}")]
    UnresolvedPrefix(String),

    #[error("Unknown XPath function: {0}()")]
    UnknownFunction(String),

    #[error("Function '{function}' error: {message}")]
    FunctionError { function: String, message: String },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Variable '{0}' not found")]
    UnknownVariable(String),

    #[error("Expression does not evaluate to a node-set: {0}")]
    NotANodeSet(String),
}
