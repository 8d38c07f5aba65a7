//! Data models for annotated documents.

mod document;
mod span;

pub use document::{Document, DocumentError, DocumentFile, SourceMetadata};
pub use span::{Span, SpanKind};
