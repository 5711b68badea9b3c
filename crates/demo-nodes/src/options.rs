//! Per-node command line arguments.
//!
//! Nodes receive the raw argument list and look flags up themselves, the same
//! way for every node: a flag is present when an argument equals it exactly,
//! and its value is the argument right after the first occurrence.

/// Arguments handed to a node at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeOptions {
    arguments: Vec<String>,
}

impl NodeOptions {
    pub fn new<I, A>(arguments: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// `true` when `option` appears as a whole argument.
    pub fn has_flag(&self, option: &str) -> bool {
        self.arguments.iter().any(|arg| arg == option)
    }

    /// The argument following the first `option`, if there is one and it is
    /// not empty.
    pub fn flag_value(&self, option: &str) -> Option<&str> {
        let position = self.arguments.iter().position(|arg| arg == option)?;
        self.arguments
            .get(position + 1)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}
