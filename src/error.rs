//! Error types for the configuration recovery pipeline.
//!
//! Errors are categorized by who has to act on them:
//!
//! | Category | Variants | Recovery |
//! |----------|----------|----------|
//! | **Input** | `Shape`, `RangeViolation`, `Configuration` | Fix input |
//! | **I/O** | `Io` | Fix the output location, re-run the iteration |
//! | **Loop** | `Sampling`, `Task` | Decided by the recovery orchestrator |
//!
//! Nothing in this crate retries internally.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while turning samples into determinant files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqdError {
    // ── Input errors (fix input) ─────────────────────────────────────
    /// Bit matrix is empty, ragged, or cannot be split into two sectors.
    #[error("Shape error: {0}")]
    Shape(String),

    /// A value does not fit the 64-bit identifier or its byte encoding.
    #[error("Range violation: {0}")]
    RangeViolation(String),

    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── I/O errors ───────────────────────────────────────────────────
    /// Output file could not be created, written or read.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File the operation was targeting.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    // ── Loop errors ──────────────────────────────────────────────────
    /// The external sample source failed to produce a batch.
    #[error("Sampling failed: {0}")]
    Sampling(String),

    /// A blocking pipeline task panicked or was cancelled.
    #[error("Pipeline task failed: {0}")]
    Task(String),
}

impl SqdError {
    /// Create an I/O error tied to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the caller has to change its input before retrying.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Shape(_) | Self::RangeViolation(_) | Self::Configuration(_)
        )
    }

    /// Returns `true` for file-system failures.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Result type for pipeline operations.
pub type SqdResult<T> = Result<T, SqdError>;
