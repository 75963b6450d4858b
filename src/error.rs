//! Error types shared by every stage of the pipeline.
//!
//! All failures are synchronous and reported before any work starts: a
//! call either returns its full result or one of these errors, never a
//! partial result. Zero-sum rows are not errors (they project to the origin).

use thiserror::Error;

/// Invalid parameters, detected before any computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at least 2 dimensions are required, found {found}")]
    TooFewDimensions { found: usize },
    #[error("bin count must be at least 1")]
    ZeroBins,
    #[error("color field size must be positive")]
    ZeroSize,
    #[error("lightness must lie in [0, 1], got {0}")]
    InvalidLightness(f64),
    #[error("lens radius must be a finite non-negative number, got {0}")]
    InvalidLensRadius(f64),
    #[error("sine sampler seed must be below {max}, got {seed}")]
    SeedOutOfRange { seed: u64, max: u64 },
}

/// Input data whose shape or content the projector cannot use.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("row {row} has {found} entries, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}, column {column} is not a finite number")]
    NonFinite { row: usize, column: usize },
    #[error("channel {found} out of range for {expected} channels")]
    ChannelCount { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
