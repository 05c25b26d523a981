//! Error types for the dialogwire domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all dialogwire operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Turn-level failures ---
    #[error("Malformed webhook request: {0}")]
    MalformedRequest(#[source] SchemaError),

    #[error("No conversation handler matched for intent `{intent}`")]
    UnhandledIntent { intent: String },

    // --- Schema mapping ---
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    // --- Contexts ---
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    // --- Registries ---
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    // --- Integrations ---
    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),

    // --- Templates ---
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // --- Handler code ---
    #[error("Handler failed: {0}")]
    Handler(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Short machine-readable category, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedRequest(_) => "malformed_request",
            Error::UnhandledIntent { .. } => "unhandled_intent",
            Error::Schema(_) => "schema",
            Error::Context(_) => "context",
            Error::Registry(_) => "registry",
            Error::Integration(_) => "integration",
            Error::Template(_) => "template",
            Error::Handler(_) => "handler",
            Error::Config { .. } => "config",
        }
    }

    /// Shorthand for handler code that wants to abort a turn.
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler(message.into())
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the typed JSON mapping.
///
/// A failed deserialize never yields a partial object: the whole operation
/// is rejected with one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unknown variant `{value}`")]
    UnknownVariant { value: String },

    #[error("invalid JSON: {0}")]
    Syntax(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Io | Category::Syntax | Category::Eof => SchemaError::Syntax(err.to_string()),
            Category::Data => {
                let message = err.to_string();
                if let Some(field) = backticked_after(&message, "missing field `") {
                    SchemaError::MissingField { field }
                } else if let Some(value) = backticked_after(&message, "unknown variant `") {
                    SchemaError::UnknownVariant { value }
                } else {
                    SchemaError::TypeMismatch(message)
                }
            }
        }
    }
}

/// Extract the text between `prefix` and the next backtick.
fn backticked_after(message: &str, prefix: &str) -> Option<String> {
    let rest = message.strip_prefix(prefix)?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Context not found: {0}")]
    NotFound(String),

    #[error("Context not registered: {0}")]
    NotRegistered(String),

    #[error("Invalid context name `{0}`, must match [a-zA-Z0-9_\\-%]+")]
    InvalidName(String),

    #[error("Invalid parameters for context `{name}`: {source}")]
    Parameters {
        name: String,
        #[source]
        source: SchemaError,
    },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Intent `{intent}` already has a registered handler")]
    AmbiguousHandler { intent: String },

    #[error("Integration `{source_id}` (version {version:?}) is already registered")]
    AmbiguousIntegration {
        source_id: String,
        version: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("No simple response to attach a display text to, call ask() or tell() first")]
    NoSimpleResponse,

    #[error("Integration `{source_id}` is not a {expected} conversation")]
    VariantMismatch {
        source_id: String,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid template `{key}`: {reason}")]
    InvalidFormat { key: String, reason: String },

    #[error("Failed to read templates at {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Failed to parse templates: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Probe {
        count: i32,
        mode: Mode,
    }

    #[derive(Debug, Deserialize)]
    enum Mode {
        On,
    }

    fn classify(json: &str) -> SchemaError {
        serde_json::from_str::<Probe>(json).unwrap_err().into()
    }

    #[test]
    fn missing_field_is_classified() {
        assert_eq!(
            classify(r#"{"mode": "On"}"#),
            SchemaError::MissingField { field: "count".into() }
        );
    }

    #[test]
    fn unknown_variant_is_classified() {
        assert_eq!(
            classify(r#"{"count": 1, "mode": "Sideways"}"#),
            SchemaError::UnknownVariant { value: "Sideways".into() }
        );
    }

    #[test]
    fn float_in_integer_field_is_type_mismatch() {
        assert!(matches!(
            classify(r#"{"count": 1.5, "mode": "On"}"#),
            SchemaError::TypeMismatch(_)
        ));
    }

    #[test]
    fn broken_json_is_syntax_error() {
        assert!(matches!(classify(r#"{"count": "#), SchemaError::Syntax(_)));
    }

    #[test]
    fn unhandled_intent_displays_intent() {
        let err = Error::UnhandledIntent { intent: "Welcome".into() };
        assert!(err.to_string().contains("`Welcome`"));
        assert_eq!(err.kind(), "unhandled_intent");
    }

    #[test]
    fn malformed_request_keeps_schema_detail() {
        let err = Error::MalformedRequest(SchemaError::MissingField { field: "session".into() });
        assert!(err.to_string().contains("session"));
        assert_eq!(err.kind(), "malformed_request");
    }
}
