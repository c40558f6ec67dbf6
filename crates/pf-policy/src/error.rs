// error.rs — Error types for policy synthesis.
//
// Every variant is fatal to the compilation it came from. Nothing here is
// retried: the engine is deterministic, so the same input fails the same way
// until an operator changes the configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while compiling a policy set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Malformed input: scope identifier, email, classification, parameter range.
    #[error("validation failed for scope '{scope}', field '{field}': {message}")]
    Validation {
        scope: String,
        field: String,
        message: String,
    },

    /// Structurally valid input that cannot be enforced safely (fail closed).
    #[error("configuration error for scope '{scope}', field '{field}': {message}")]
    Configuration {
        scope: String,
        field: String,
        message: String,
    },

    /// Two rules resolved to the same name with different content.
    #[error("rule name conflict in scope '{scope}': '{rule_name}' emitted twice with different content")]
    Conflict { scope: String, rule_name: String },

    /// Emergency override requested without an acceptable reason.
    #[error("emergency override rejected for scope '{scope}': {message}")]
    EmergencyOverride { scope: String, message: String },

    /// A configuration file could not be read or parsed.
    #[error("failed to load configuration from {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// The manifest could not be rendered to JSON.
    #[error("failed to serialize manifest for scope '{scope}': {message}")]
    Serialization { scope: String, message: String },
}

/// Discriminator for [`PolicyError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyErrorKind {
    Validation,
    Configuration,
    Conflict,
    EmergencyOverride,
    Load,
    Serialization,
}

impl PolicyError {
    pub(crate) fn validation(
        scope: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            scope: scope.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn configuration(
        scope: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            scope: scope.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Which taxonomy bucket this error belongs to.
    pub fn kind(&self) -> PolicyErrorKind {
        match self {
            PolicyError::Validation { .. } => PolicyErrorKind::Validation,
            PolicyError::Configuration { .. } => PolicyErrorKind::Configuration,
            PolicyError::Conflict { .. } => PolicyErrorKind::Conflict,
            PolicyError::EmergencyOverride { .. } => PolicyErrorKind::EmergencyOverride,
            PolicyError::Load { .. } => PolicyErrorKind::Load,
            PolicyError::Serialization { .. } => PolicyErrorKind::Serialization,
        }
    }
}
