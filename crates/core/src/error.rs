//! Error types for the schemafill domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] is the single
//! failure value handed back to callers of a top-level pass.

use thiserror::Error;

/// The top-level error type for a default-application pass.
///
/// Callers branch on the variant: an invalid schema, an instance that
/// does not conform, or a failure while applying keyword handlers.
#[derive(Debug, Error)]
pub enum Error {
    // --- Compiler errors ---
    #[error("Schema compilation failed: {0}")]
    SchemaCompilation(#[from] CompileError),

    // --- Output validation ---
    #[error("Instance does not conform to schema '{schema}'")]
    InstanceValidation { schema: String },

    // --- Evaluator errors ---
    #[error("Failed to apply defaults: {0}")]
    Application(#[from] EvalError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("Schema document has no $id and no retrieval URI was given")]
    MissingId,

    #[error("Schema '{0}' is not registered")]
    NotRegistered(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Unknown keyword '{keyword}' at {location}")]
    UnknownKeyword { keyword: String, location: String },

    #[error("Invalid value for '{keyword}' at {location}: {reason}")]
    InvalidKeywordValue {
        keyword: String,
        location: String,
        reason: String,
    },

    #[error("Invalid schema at {location}: {reason}")]
    InvalidSchema { location: String, reason: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Unresolved reference '{reference}' (base: {base})")]
    UnresolvedReference { reference: String, base: String },
}

#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("Dynamic anchor '{anchor}' is not bound in scope and has no static target ({location})")]
    UnresolvedDynamicAnchor { anchor: String, location: String },

    #[error("Recursion limit of {limit} exceeded at {location}")]
    DepthExceeded { limit: usize, location: String },

    #[error("Validation oracle failed: {0}")]
    Oracle(#[from] ValidationError),
}

#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Dynamic anchor '{anchor}' is not bound in scope and has no static target ({location})")]
    UnresolvedDynamicAnchor { anchor: String, location: String },

    #[error("Recursion limit of {limit} exceeded at {location}")]
    DepthExceeded { limit: usize, location: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_displays_correctly() {
        let err = Error::SchemaCompilation(CompileError::UnknownKeyword {
            keyword: "frobnicate".into(),
            location: "https://example.com/s#".into(),
        });
        assert!(err.to_string().contains("frobnicate"));
        assert!(err.to_string().contains("https://example.com/s#"));
    }

    #[test]
    fn oracle_errors_convert_into_application_errors() {
        let err: EvalError = ValidationError::DepthExceeded {
            limit: 8,
            location: "#/items".into(),
        }
        .into();
        let err = Error::from(err);
        assert!(matches!(err, Error::Application(EvalError::Oracle(_))));
        assert!(err.to_string().contains("Recursion limit of 8"));
    }
}
