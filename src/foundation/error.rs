use crate::generation::gateway::GatewayError;

/// Convenience result type used across hookdance.
pub type DanceResult<T> = Result<T, DanceError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Malformed generator output is deliberately absent: it is handled by the repair pipeline and
/// surfaces as [`crate::DirectionOutcome::Unparseable`], never as an error.
#[derive(thiserror::Error, Debug)]
pub enum DanceError {
    /// Invalid caller-provided data (lyrics, beat grids, specs, config).
    #[error("validation error: {0}")]
    Validation(String),

    /// Direction documents that cannot be used even after repair.
    #[error("direction error: {0}")]
    Direction(String),

    /// Errors raised by render surfaces outside the frame loop (surface allocation, export).
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Transport or availability failure talking to the generation gateway.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DanceError {
    /// Build a [`DanceError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DanceError::Direction`] value.
    pub fn direction(msg: impl Into<String>) -> Self {
        Self::Direction(msg.into())
    }

    /// Build a [`DanceError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`DanceError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
