//! Error types for geo-verity-core.

use thiserror::Error;

/// Result type alias using geo-verity-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during verification.
///
/// Only [`Error::InputInvalid`] is meant to escape the orchestrator's public
/// entry point. Every other variant is caught at its component boundary and
/// folded into a flag or a diagnostic field on the verdict.
#[derive(Error, Debug)]
pub enum Error {
    /// A malformed request envelope (missing or inconsistent signal fields).
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// An IP-reputation or embedding provider call failed.
    #[error("provider '{provider}' transient failure: {message}")]
    ProviderTransient { provider: String, message: String },

    /// The vector store's create/upsert/search call failed.
    #[error("vector store unavailable: {0}")]
    VectorStoreUnavailable(String),

    /// The generative model path failed or returned non-JSON.
    #[error("generative model unavailable: {0}")]
    GenerativeModelUnavailable(String),

    /// A computed score or confidence fell outside its documented range, or
    /// an adapter produced a shape it should have rejected itself.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration document could not be parsed or applied.
    #[error("configuration error: {0}")]
    Config(String),

    /// Catch-all for conditions that don't fit a more specific variant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an [`Error::InputInvalid`] from any displayable message.
    pub fn input_invalid(message: impl Into<String>) -> Self {
        Self::InputInvalid(message.into())
    }

    /// Build an [`Error::ProviderTransient`] tagged with the provider name.
    pub fn provider_transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderTransient {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for the single error kind allowed to surface from `verify`.
    pub fn is_input_invalid(&self) -> bool {
        matches!(self, Self::InputInvalid(_))
    }
}
