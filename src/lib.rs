//! doctime - document creation time, event filtering and TIMEX tagging for
//! annotated clinical notes.
//!
//! Each document arrives with its text and the spans an upstream pipeline
//! produced (sentences, event mentions, time mentions). Three independent
//! passes run over it:
//!
//! - [`services::DctAnnotator`] resolves the document creation time from the
//!   filename, the `Principal Date` header, or an approximator.
//! - [`services::EventFilter`] drops event mentions containing excluded terms.
//! - [`services::TimexTextWriter`] writes sentences with their time mentions
//!   replaced by normalized `<timex>` tags.

pub mod config;
pub mod models;
pub mod services;

pub use config::{Config, ConfigError, LoadOptions};
pub use models::{Document, DocumentError, Span};
