use crate::page_range::RangeError;
use std::path::PathBuf;
use thiserror::Error;

/// Error kinds surfaced by the scan pipeline.
///
/// Setup errors (`InvalidUsage`, `InputNotFound`, `DocumentOpen`,
/// `InvalidPageRange`) abort the run before any worker starts. `Render`, `Ocr`
/// and `TermListRead` only ever fail the worker that hit them.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    #[error("{kind} file '{}' does not exist", path.display())]
    InputNotFound { kind: &'static str, path: PathBuf },

    #[error("failed to open the document '{}': {reason}", path.display())]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("invalid page range: {0}")]
    InvalidPageRange(#[from] RangeError),

    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },

    #[error("OCR failed on page {page}: {reason}")]
    Ocr { page: u32, reason: String },

    #[error("unable to open terms file '{}' for reading: {source}", path.display())]
    TermListRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
