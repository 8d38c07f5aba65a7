//! Service layer for document passes.
//!
//! Domain logic lives here, separated from the CLI. Each pass works on one
//! `Document` at a time and shares nothing mutable between documents.

pub mod annotation;
pub mod approximator;
pub mod date_detection;
pub mod resources;
pub mod timenorm;
pub mod timex_writer;

pub use annotation::{
    AnnotationError, AnnotationOutput, Annotator, DctAnnotator, EventFilter, FilterError,
    FilterOutcome, TermFilterSet,
};
pub use approximator::{DocTimeApproximator, LatestDateApproximator};
pub use date_detection::{DateEstimate, DateSource, DocTimeError, HeaderMode, MalformedHeaderPolicy};
pub use resources::{FileLocator, ResourceLocator};
pub use timenorm::{PatternNormalizer, ReferenceInstant, TemporalNormalizer, TemporalValue};
pub use timex_writer::{TimexTextWriter, WriterError};
