//! Annotation passes behind a common trait.
//!
//! Each pass (creation time resolution, event filtering, timex rendering)
//! implements the `Annotator` trait so the CLI can run them uniformly.

mod annotator;
mod dct_annotator;
mod event_filter;
mod types;

pub use annotator::Annotator;
pub use dct_annotator::DctAnnotator;
pub use event_filter::{EventFilter, FilterError, FilterOutcome, TermFilterSet};
pub use types::{AnnotationError, AnnotationOutput};
