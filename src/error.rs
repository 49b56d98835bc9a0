//! Error types for fiberconf

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fiberconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause of a decode failure
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for fiberconf
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Tree Errors
    // -------------------------------------------------------------------------
    #[error("A child named '{name}' already exists in this tree")]
    DuplicateChild { name: String },

    #[error("Node '{name}' is already attached to a parent")]
    AlreadyAttached { name: String },

    #[error("Adding tree '{name}' would make it its own descendant")]
    Cycle { name: String },

    #[error("Invalid node name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Failed to register node '{name}' to its parent: {source}")]
    Registration {
        name: String,
        #[source]
        source: Box<Error>,
    },

    // -------------------------------------------------------------------------
    // Build-time Errors
    // -------------------------------------------------------------------------
    #[error("Default value {value} of '{name}' does not satisfy constraints on type {ty}")]
    InvalidDefault {
        name: String,
        value: String,
        ty: String,
    },

    #[error("Attribute '{id}' is declared more than once on '{node}'")]
    DuplicateAttribute { node: String, id: String },

    #[error("Invalid attribute '{id}': {reason}")]
    InvalidAttribute { id: String, reason: String },

    #[error("Builder misuse: {0}")]
    BuilderMisuse(String),

    #[error("Invalid type definition: {0}")]
    InvalidType(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // -------------------------------------------------------------------------
    // Value Errors
    // -------------------------------------------------------------------------
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {format} output: {reason}")]
    Format {
        format: &'static str,
        reason: String,
    },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Check if this error comes from decoding a value or a stream
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::Decode(_))
    }

    /// Check if this error signals a schema-authoring mistake caught at build time
    #[must_use]
    pub fn is_build_error(&self) -> bool {
        match self {
            Error::InvalidDefault { .. }
            | Error::InvalidName { .. }
            | Error::DuplicateAttribute { .. }
            | Error::InvalidAttribute { .. }
            | Error::BuilderMisuse(_)
            | Error::InvalidType(_)
            | Error::InvalidPattern { .. } => true,
            Error::Registration { source, .. } => source.is_build_error(),
            _ => false,
        }
    }

    /// Check if this error is (or wraps) a sibling name collision
    #[must_use]
    pub fn is_duplicate_child(&self) -> bool {
        match self {
            Error::DuplicateChild { .. } => true,
            Error::Registration { source, .. } => source.is_duplicate_child(),
            _ => false,
        }
    }
}

// =============================================================================
// Decode Error
// =============================================================================

/// Failure to turn a serialized element back into a configuration value.
///
/// Carries a rendering of the offending raw value, the expected platform type,
/// a reason and an optional underlying cause. Composite decoders prepend path
/// segments with [`DecodeError::within`] as the error travels outward, so the
/// final message points at the exact field or index.
#[derive(Error, Debug)]
pub struct DecodeError {
    value: Option<String>,
    expected: String,
    reason: String,
    /// Innermost segment first
    path: Vec<String>,
    #[source]
    source: Option<BoxedCause>,
}

impl DecodeError {
    /// Create a decode error for a raw value that could not be decoded
    pub fn new(
        value: impl fmt::Display,
        expected: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            value: Some(value.to_string()),
            expected: expected.into(),
            reason: reason.into(),
            path: Vec::new(),
            source: None,
        }
    }

    /// Create a decode error that has no raw value to show (missing field, stream failure)
    pub fn absent(expected: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            value: None,
            expected: expected.into(),
            reason: reason.into(),
            path: Vec::new(),
            source: None,
        }
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxedCause>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Prefix the error path with a field or node name
    #[must_use]
    pub fn within(mut self, segment: impl Into<String>) -> Self {
        self.path.push(segment.into());
        self
    }

    /// Prefix the error path with a list index
    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.path.push(format!("[{index}]"));
        self
    }

    /// Rendering of the raw value that failed to decode, if any
    pub fn raw_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Name of the platform type the decoder expected
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Human readable reason
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Dotted path from the outermost container to the failing element
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in self.path.iter().rev() {
            if !out.is_empty() && !segment.starts_with('[') {
                out.push('.');
            }
            out.push_str(segment);
        }
        out
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot decode {}", self.expected)?;
        if !self.path.is_empty() {
            write!(f, " at '{}'", self.path())?;
        }
        write!(f, ": {}", self.reason)?;
        if let Some(value) = &self.value {
            write!(f, " (found {value})")?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_path_is_built_outward() {
        let err = DecodeError::new("\"x\"", "number", "not a number")
            .within("port")
            .at_index(2)
            .within("servers");

        assert_eq!(err.path(), "servers[2].port");
        assert_eq!(
            err.to_string(),
            "Cannot decode number at 'servers[2].port': not a number (found \"x\")"
        );
    }

    #[test]
    fn test_decode_error_without_value() {
        let err = DecodeError::absent("boolean", "Record field is absent: enabled");
        assert!(err.raw_value().is_none());
        assert_eq!(
            err.to_string(),
            "Cannot decode boolean: Record field is absent: enabled"
        );
    }

    #[test]
    fn test_registration_classification() {
        let err = Error::Registration {
            name: "fov".into(),
            source: Box::new(Error::DuplicateChild { name: "fov".into() }),
        };
        assert!(err.is_duplicate_child());
        assert!(!err.is_build_error());
        assert!(err.to_string().contains("fov"));
    }
}
