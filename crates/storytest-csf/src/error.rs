//! Error types for story-module analysis
//!
//! Provides error handling for:
//! - Module extraction (source → story metadata)
//! - Per-export failures that exclude a single story
//! - Story location rules (glob compilation)

use std::fmt;

/// Errors that abort extraction of a whole module
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// Grammar could not be loaded into the parser
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// Parser produced no tree
    #[error("parse failed")]
    ParseFailed,

    /// Source contains a syntax error
    #[error("syntax error at {line}:{column}")]
    Syntax { line: usize, column: usize },

    /// Module structure cannot be read statically
    #[error("malformed story module: {reason}")]
    MalformedModule { reason: String },
}

impl ExtractError {
    /// Create malformed module error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedModule {
            reason: reason.into(),
        }
    }
}

/// A single export excluded from the transform
///
/// Scoped to one export: the rest of the module still transforms.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MalformedExport {
    /// Exported name
    pub export_name: String,
    /// Why the export could not be analyzed
    pub reason: String,
}

impl MalformedExport {
    /// Create a new export warning
    pub fn new(export_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            export_name: export_name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for MalformedExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "export '{}' skipped: {}", self.export_name, self.reason)
    }
}

/// Errors building story location rules
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// Glob pattern failed to compile
    #[error("invalid story glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Story id component sanitized to nothing
    #[error("invalid {component} '{value}', must include alphanumeric characters")]
    InvalidIdComponent {
        component: &'static str,
        value: String,
    },
}

/// Result type alias for extraction
pub type ExtractResult<T> = Result<T, ExtractError>;
