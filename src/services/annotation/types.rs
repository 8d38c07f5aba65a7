//! Types shared across annotation passes.

use thiserror::Error;

use crate::models::DocumentError;
use crate::services::date_detection::DocTimeError;
use crate::services::timex_writer::WriterError;

use super::event_filter::FilterError;

/// Result of running a single pass over a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationOutput {
    /// The pass produced a value worth reporting (a date, a count, a path).
    Data(String),
    /// The pass ran but had nothing to record.
    NoResult,
    /// The pass did not apply to this document.
    Skipped,
}

/// Errors from annotation passes.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error(transparent)]
    DocTime(#[from] DocTimeError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}
