use std::io;
use thiserror::Error;

/// Reasons an input image is rejected before recognition.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File is empty: {0}")]
    Empty(String),

    #[error("Cannot read image file: {0}")]
    Unreadable(String),

    #[error("Image has zero dimension: {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("Failed to inspect {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Run-level failures. Every variant ends up as a `success: false` report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("OCR engine initialization failed: {0:#}")]
    EngineInit(anyhow::Error),

    #[error("OCR failed for all {attempts} rotations: {last_error}")]
    NoCandidates { attempts: usize, last_error: String },

    #[error("{0:#}")]
    Unexpected(#[from] anyhow::Error),
}
