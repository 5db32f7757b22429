//! The seam to the hosting pipeline: its variable store and inbound payload.

use std::collections::HashMap;
use std::io;

/// Per-operation access to the pipeline that invoked the extraction.
///
/// Implementations are owned by a single operation; nothing here is shared
/// between concurrent operations.
pub trait MessageContext {
    /// The current string value of a pipeline variable.
    fn variable(&self, name: &str) -> Option<String>;

    fn set_variable(&mut self, name: &str, value: String);

    /// The default inbound payload, used when no `source` variable is configured.
    fn message_content(&self) -> io::Result<String>;
}

/// A `MessageContext` backed by a `HashMap`, for tests and the command line.
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    variables: HashMap<String, String>,
    content: Option<String>,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}

impl MessageContext for MemoryContext {
    fn variable(&self, name: &str) -> Option<String> {
        self.variables.get(name).cloned()
    }

    fn set_variable(&mut self, name: &str, value: String) {
        self.variables.insert(name.to_string(), value);
    }

    fn message_content(&self) -> io::Result<String> {
        self.content
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "message has no content"))
    }
}
