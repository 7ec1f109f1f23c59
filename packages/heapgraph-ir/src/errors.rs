//! Error types for heapgraph-ir
//!
//! Unified error handling across the crate. Lowering errors are fatal for
//! the offending method only; analysis-time problems never surface here,
//! they are absorbed into conservative summaries. Invariant violations
//! indicate a lowering or engine bug and halt the current work unit.

use crate::shared::models::Span;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeapgraphError {
    /// Structural lowering failure: unresolved symbol, unsupported syntax,
    /// scope misuse. No partial IR is emitted for the method.
    #[error("lowering error in {method}{}: {message}", .span.map(|s| format!(" at {}", s)).unwrap_or_default())]
    Lowering {
        method: String,
        message: String,
        span: Option<Span>,
    },

    /// Analysis failure outside a work unit (driver-level)
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Internal invariant violation, e.g. an empty label stack on `break`
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl HeapgraphError {
    pub fn lowering(method: impl Into<String>, message: impl Into<String>, span: Option<Span>) -> Self {
        HeapgraphError::Lowering {
            method: method.into(),
            message: message.into(),
            span,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        HeapgraphError::Invariant(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        HeapgraphError::Config(message.into())
    }
}

/// Result type alias for heapgraph operations
pub type Result<T> = std::result::Result<T, HeapgraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowering_error_display() {
        let err = HeapgraphError::lowering(
            "com.example.A.run():void",
            "unresolved name `x`",
            Some(Span::point(12, 4)),
        );
        let msg = err.to_string();
        assert!(msg.contains("com.example.A.run():void"));
        assert!(msg.contains("12:4"));
        assert!(msg.contains("unresolved name"));
    }
}
