//! Error types shared by every synthesis stage.

use thiserror::Error;

/// Errors raised while synthesizing or exporting a heightmap.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("coordinate ({x}, {z}) is outside the {width}x{height} grid")]
    OutOfRange {
        x: i32,
        z: i32,
        width: usize,
        height: usize,
    },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// A random-walk search ran past its step cap without finishing.
    #[error("{search} did not finish within {cap} steps")]
    UnboundedSearch { search: &'static str, cap: usize },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SynthError>;

/// Shorthand for building an [`SynthError::InvalidParameter`].
pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> SynthError {
    SynthError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}
