//! Annotator trait: the shared abstraction for document passes.

use crate::models::Document;

use super::types::{AnnotationError, AnnotationOutput};

/// A pass that reads and possibly mutates one document.
///
/// Passes are independent and are run in sequence by the caller. Each one
/// owns no per-document state, so the same instance can process any number
/// of documents.
pub trait Annotator: Send + Sync {
    /// Short machine-readable key, used in logs.
    fn annotation_type(&self) -> &str;

    /// Human-readable name for CLI output.
    fn display_name(&self) -> &str;

    /// Process a single document.
    fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutput, AnnotationError>;
}
