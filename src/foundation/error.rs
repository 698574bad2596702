/// Convenience result type used across montage.
pub type MontageResult<T> = Result<T, MontageError>;

/// Top-level error taxonomy.
///
/// Edit commands never return errors: an invalid edit is an [`crate::EditOutcome::NoOp`]. Errors
/// are produced by validation, manifest handling and graph compilation.
#[derive(thiserror::Error, Debug)]
pub enum MontageError {
    /// Invalid user-provided timeline, config or argument data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A capability manifest is malformed (bad pass wiring, cycles, duplicate names).
    #[error("manifest error: {0}")]
    Manifest(String),

    /// A clip references an effect id the registry does not know.
    #[error("unknown effect '{0}'")]
    UnknownEffect(String),

    /// Graph compilation failed for a reason other than an unknown effect.
    #[error("compile error: {0}")]
    Compile(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MontageError {
    /// Build a [`MontageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MontageError::Manifest`] value.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Build a [`MontageError::UnknownEffect`] value.
    pub fn unknown_effect(id: impl Into<String>) -> Self {
        Self::UnknownEffect(id.into())
    }

    /// Build a [`MontageError::Compile`] value.
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile(msg.into())
    }

    /// Build a [`MontageError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
