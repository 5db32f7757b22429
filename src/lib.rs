//! Pull named values out of XML documents with namespace-aware XPath 1.0.
//!
//! A step is configured with a flat property map: `xmlns:<prefix>` entries bind
//! namespace prefixes, `xpath:<variable>` entries name the values to extract,
//! and `source` optionally points at the pipeline variable holding the XML.
//! Each operation reads and writes pipeline variables through a
//! [`MessageContext`].

pub mod config;
pub mod context;
pub mod directives;
pub mod error;
pub mod evaluate;
pub mod extract;

pub use config::{Properties, resolve_value};
pub use context::{MemoryContext, MessageContext};
pub use directives::{Directive, extraction_request, namespace_table};
pub use error::{ErrorClass, ErrorReport, ExtractError};
pub use extract::{ExecutionResult, ExtractXpath, VARIABLE_PREFIX};
