//! The extraction operation: load the document, build the namespace table and
//! the directive list, then evaluate each directive in order.

use crate::config::{Properties, SOURCE_PROPERTY};
use crate::context::MessageContext;
use crate::directives::{extraction_request, namespace_table};
use crate::error::{ErrorReport, ExtractError};
use crate::evaluate::{evaluate, extract, validate};
use log::{debug, error, info, warn};
use std::fmt;
use xtract_xml::XmlDocument;

/// Prefix of the failure variables written back to the pipeline.
pub const VARIABLE_PREFIX: &str = "xpath_";

/// What the pipeline should do after the step ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    Success,
    Abort,
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionResult::Success => f.write_str("SUCCESS"),
            ExecutionResult::Abort => f.write_str("ABORT"),
        }
    }
}

/// A configured extraction step.
///
/// Holds only its configuration, so one instance can serve any number of
/// operations, including concurrent ones on separate contexts.
#[derive(Debug, Clone)]
pub struct ExtractXpath {
    properties: Properties,
}

impl ExtractXpath {
    pub fn new(properties: Properties) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Runs one operation against `ctx`.
    ///
    /// Each directive whose expression selects exactly one node writes the
    /// node's value to the directive's variable. A directive selecting zero or
    /// several nodes is recorded in the failure variables and skipped. Any
    /// other failure stops the operation and returns `Abort`.
    pub fn execute(&self, ctx: &mut dyn MessageContext) -> ExecutionResult {
        match self.run(ctx) {
            Ok(()) => {
                info!("Extraction completed");
                ExecutionResult::Success
            }
            Err(e) => {
                error!("Extraction aborted: {}", e);
                self.record_failure(ctx, &e);
                ExecutionResult::Abort
            }
        }
    }

    fn run(&self, ctx: &mut dyn MessageContext) -> Result<(), ExtractError> {
        let text = self.source_text(ctx)?;
        let document = XmlDocument::parse(&text)?;
        let root = document.root_node();

        let namespaces = namespace_table(&self.properties, ctx);
        let request = extraction_request(&self.properties, ctx);
        if request.is_empty() {
            return Err(ExtractError::NoDirectives);
        }

        for directive in &request {
            debug!(
                "Evaluating '{}' for variable '{}'",
                directive.expression, directive.variable
            );
            let nodes = evaluate(&namespaces, &directive.expression, root)?;
            match validate(&nodes) {
                Ok(node) => {
                    let value = extract(&node);
                    debug!("Setting '{}' = '{}'", directive.variable, value);
                    ctx.set_variable(&directive.variable, value);
                }
                Err(e) => {
                    warn!("Skipping variable '{}': {}", directive.variable, e);
                    self.record_failure(ctx, &e);
                }
            }
        }
        Ok(())
    }

    /// The XML text named by `source`, or the message content when `source`
    /// is not configured.
    fn source_text(&self, ctx: &dyn MessageContext) -> Result<String, ExtractError> {
        match self.properties.optional(SOURCE_PROPERTY, ctx) {
            Some(name) => ctx.variable(&name).ok_or(ExtractError::MissingSource),
            None => Ok(ctx.message_content()?),
        }
    }

    fn record_failure(&self, ctx: &mut dyn MessageContext, err: &ExtractError) {
        let report = ErrorReport::from(err);
        ctx.set_variable(&output_variable("exception"), report.exception);
        ctx.set_variable(&output_variable("error"), report.error);
        if let Some(trace) = report.stacktrace {
            if self.properties.debug() {
                error!("{}", trace);
            }
            ctx.set_variable(&output_variable("stacktrace"), trace);
        }
    }
}

/// `xpath_<suffix>`.
pub fn output_variable(suffix: &str) -> String {
    format!("{}{}", VARIABLE_PREFIX, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryContext;

    const DOC: &str = "<r><a>1</a><b>2</b><b>3</b></r>";

    #[test]
    fn test_success_sets_variables() {
        let step = ExtractXpath::new(
            Properties::new()
                .with("xpath:first", "/r/a")
                .with("xpath:second", "/r/b[2]/text()"),
        );
        let mut ctx = MemoryContext::new().with_content(DOC);
        assert_eq!(step.execute(&mut ctx), ExecutionResult::Success);
        assert_eq!(ctx.variable("first").as_deref(), Some("1"));
        assert_eq!(ctx.variable("second").as_deref(), Some("3"));
        assert_eq!(ctx.variable("xpath_error"), None);
    }

    #[test]
    fn test_cardinality_failure_continues() {
        let step = ExtractXpath::new(
            Properties::new()
                .with("xpath:many", "/r/b")
                .with("xpath:one", "/r/a"),
        );
        let mut ctx = MemoryContext::new().with_content(DOC);
        assert_eq!(step.execute(&mut ctx), ExecutionResult::Success);
        assert_eq!(ctx.variable("many"), None);
        assert_eq!(ctx.variable("one").as_deref(), Some("1"));
        assert_eq!(
            ctx.variable("xpath_error").as_deref(),
            Some("xpath does not resolve to one node. (length=2)")
        );
        assert_eq!(ctx.variable("xpath_stacktrace"), None);
    }

    #[test]
    fn test_source_names_a_variable() {
        let step = ExtractXpath::new(
            Properties::new()
                .with("source", "{which}")
                .with("xpath:v", "/r/a"),
        );
        let mut ctx = MemoryContext::new()
            .with_variable("which", "payload")
            .with_variable("payload", DOC);
        assert_eq!(step.execute(&mut ctx), ExecutionResult::Success);
        assert_eq!(ctx.variable("v").as_deref(), Some("1"));
    }

    #[test]
    fn test_directives_checked_after_document_loads() {
        let step = ExtractXpath::new(Properties::new());
        let mut ctx = MemoryContext::new().with_content("<unclosed>");
        assert_eq!(step.execute(&mut ctx), ExecutionResult::Abort);
        assert!(ctx.variable("xpath_stacktrace").is_some());
        assert_ne!(ctx.variable("xpath_error").as_deref(), Some("no xpaths provided"));
    }

    #[test]
    fn test_execution_result_display() {
        assert_eq!(ExecutionResult::Success.to_string(), "SUCCESS");
        assert_eq!(ExecutionResult::Abort.to_string(), "ABORT");
    }
}
