/// Convenience result type used across Fresco.
pub type FrescoResult<T> = Result<T, FrescoError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum FrescoError {
    /// Invalid user-provided data (surface dimensions, filter parameters).
    #[error("validation error: {0}")]
    Validation(String),

    /// A serialized filter names a type tag that is not registered.
    #[error("unknown filter type: {0}")]
    UnknownFilterType(String),

    /// Errors when serializing or deserializing filter descriptions.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Errors from the accelerated context (absent device, failed readback).
    #[error("acceleration error: {0}")]
    Acceleration(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrescoError {
    /// Build a [`FrescoError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FrescoError::UnknownFilterType`] value.
    pub fn unknown_filter_type(tag: impl Into<String>) -> Self {
        Self::UnknownFilterType(tag.into())
    }

    /// Build a [`FrescoError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`FrescoError::Acceleration`] value.
    pub fn acceleration(msg: impl Into<String>) -> Self {
        Self::Acceleration(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
