//! Compiler diagnostics.

use crate::script::token::Span;
use std::fmt;

/// A semantic error found while checking a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What is wrong
    pub message: String,
    /// Where in the source
    pub span: Span,
}

impl Diagnostic {
    /// A diagnostic at `span`.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Format the diagnostic with the offending source line.
    pub fn format_with_source(&self, source: &str) -> String {
        let mut result = format!("{}\n", self);
        if let Some(line) = source.lines().nth(self.span.line.saturating_sub(1) as usize) {
            result.push_str("  |\n");
            result.push_str(&format!("{:3} | {}\n", self.span.line, line));
            result.push_str(&format!(
                "  | {}^\n",
                " ".repeat(self.span.column.saturating_sub(1) as usize)
            ));
        }
        result
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error at {}:{}: {}",
            self.span.line, self.span.column, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}
