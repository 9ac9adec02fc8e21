/// Convenience result type used across lumen.
pub type LumenResult<T> = Result<T, LumenError>;

/// Top-level error taxonomy for fallible engine operations.
///
/// Absence of a pass or AOV is not an error: extraction calls report it with a `false`
/// return. Violated caller contracts (wrong component counts, multi-mapped single lookups)
/// panic instead of producing a value of this type.
#[derive(thiserror::Error, Debug)]
pub enum LumenError {
    /// Invalid user-provided layout, geometry or mapping data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Device memory allocation or transfer failure.
    #[error("device error: {0}")]
    Device(String),

    /// Image export failure.
    #[error("image error: {0}")]
    Image(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LumenError {
    /// Build a [`LumenError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LumenError::Device`] value.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Build a [`LumenError::Image`] value.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    /// Build a [`LumenError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
