//! Document creation time annotator. Drives the strategies in
//! `date_detection` and falls back to an injected approximator.

use std::sync::Arc;

use tracing::{info, warn};

use crate::models::Document;
use crate::services::approximator::DocTimeApproximator;
use crate::services::date_detection::{
    date_from_filename, date_from_header, DateEstimate, DateSource, DocTimeError, HeaderMode,
    MalformedHeaderPolicy,
};

use super::annotator::Annotator;
use super::types::{AnnotationError, AnnotationOutput};

/// Resolves and records a document's creation time.
///
/// Strategies run in order and the first match wins:
/// 1. filename pattern (authoritative when it matches)
/// 2. `Principal Date` header line
/// 3. the approximator, which always completes
pub struct DctAnnotator {
    approximator: Arc<dyn DocTimeApproximator>,
    header_mode: HeaderMode,
    malformed_policy: MalformedHeaderPolicy,
}

impl DctAnnotator {
    pub fn new(approximator: Arc<dyn DocTimeApproximator>) -> Self {
        Self {
            approximator,
            header_mode: HeaderMode::default(),
            malformed_policy: MalformedHeaderPolicy::default(),
        }
    }

    pub fn with_header_mode(mut self, mode: HeaderMode) -> Self {
        self.header_mode = mode;
        self
    }

    pub fn with_malformed_policy(mut self, policy: MalformedHeaderPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }

    /// Run the strategy chain and write the result into the document's
    /// source metadata.
    pub fn resolve(&self, doc: &mut Document) -> Result<DateEstimate, DocTimeError> {
        let id = doc.id();

        if let Some(date) = date_from_filename(&id) {
            info!("{} follows the dated filename convention, using {}", id, date);
            doc.source_metadata_mut().original_date = Some(date.clone());
            return Ok(DateEstimate {
                date: Some(date),
                source: DateSource::Filename,
            });
        }

        info!("{} has no date in its filename, checking the Principal Date header", id);
        match date_from_header(doc.text(), self.header_mode) {
            Ok(Some(date)) => {
                doc.source_metadata_mut().original_date = Some(date.clone());
                return Ok(DateEstimate {
                    date: Some(date),
                    source: DateSource::Header,
                });
            }
            Ok(None) => {}
            Err(e) => match self.malformed_policy {
                MalformedHeaderPolicy::Fail => return Err(e),
                MalformedHeaderPolicy::Fallback => {
                    warn!("{}: {}, falling back to approximation", id, e);
                }
            },
        }

        info!("Approximating creation time for {}", id);
        self.approximator.approximate(doc);
        Ok(DateEstimate {
            date: doc.original_date().map(str::to_string),
            source: DateSource::Approximator,
        })
    }
}

impl Annotator for DctAnnotator {
    fn annotation_type(&self) -> &str {
        "doc_time"
    }

    fn display_name(&self) -> &str {
        "Document Creation Time"
    }

    fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutput, AnnotationError> {
        let estimate = self.resolve(doc)?;
        Ok(match estimate.date {
            Some(date) => AnnotationOutput::Data(format!("{}:{}", estimate.source, date)),
            None => AnnotationOutput::NoResult,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Records calls and writes a fixed date.
    #[derive(Default)]
    struct FixedApproximator {
        calls: AtomicUsize,
    }

    impl DocTimeApproximator for FixedApproximator {
        fn approximate(&self, doc: &mut Document) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            doc.source_metadata_mut().original_date = Some("1999-01-01".to_string());
        }
    }

    fn annotator() -> (DctAnnotator, Arc<FixedApproximator>) {
        let approx = Arc::new(FixedApproximator::default());
        (DctAnnotator::new(approx.clone()), approx)
    }

    #[test]
    fn test_filename_wins_over_header() {
        let (dct, approx) = annotator();
        let mut doc = Document::new(
            "/data/ID123_path_3-7-2019.txt",
            "Principal Date: 20250413\nbody",
        );

        let estimate = dct.resolve(&mut doc).unwrap();
        assert_eq!(estimate.source, DateSource::Filename);
        assert_eq!(doc.original_date(), Some("2019-03-07"));
        assert_eq!(approx.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_strict_header_used_when_filename_does_not_match() {
        let approx = Arc::new(FixedApproximator::default());
        let dct = DctAnnotator::new(approx.clone()).with_header_mode(HeaderMode::Strict);
        let mut doc = Document::new("note.txt", "MRN 1\nPrincipal Date: 2025-04-13\n");

        let estimate = dct.resolve(&mut doc).unwrap();
        assert_eq!(estimate.source, DateSource::Header);
        assert_eq!(doc.original_date(), Some("2025-04-13"));
        assert_eq!(approx.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_header_falls_back_to_approximator() {
        let (dct, approx) = annotator();
        let mut doc = Document::new("note.txt", "No header in this note.");

        let output = dct.annotate(&mut doc).unwrap();
        assert_eq!(output, AnnotationOutput::Data("approximator:1999-01-01".to_string()));
        assert_eq!(approx.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_indented_header_is_ignored() {
        let (dct, approx) = annotator();
        let mut doc = Document::new("note.txt", "  Principal Date: 20250413\nbody");
        dct.resolve(&mut doc).unwrap();
        assert_eq!(approx.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_header_fails_by_default() {
        let (dct, approx) = annotator();
        let mut doc = Document::new("note.txt", "Principal Date: 20250413\n");

        let err = dct.annotate(&mut doc).unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::DocTime(DocTimeError::MalformedHeaderDate { .. })
        ));
        assert_eq!(approx.calls.load(Ordering::SeqCst), 0);
        assert!(doc.original_date().is_none());
    }

    #[test]
    fn test_compat_header_keeps_prefix_so_never_resolves() {
        // The compat class only removes a non-digit with the `]` after it, so
        // the header prefix always survives and the result is never 8 chars.
        let (dct, approx) = annotator();
        let mut doc = Document::new("note.txt", "Principal Date]]]]20250413
body");

        let err = dct.resolve(&mut doc).unwrap_err();
        assert_eq!(
            err,
            DocTimeError::MalformedHeaderDate {
                line: "Principal Date]]]]20250413".to_string(),
                digits: "Principal Dat]20250413".to_string(),
            }
        );
        assert_eq!(approx.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_header_fallback_policy() {
        let approx = Arc::new(FixedApproximator::default());
        let dct = DctAnnotator::new(approx.clone())
            .with_malformed_policy(MalformedHeaderPolicy::Fallback);
        let mut doc = Document::new("note.txt", "Principal Date: 20250413\n");

        let estimate = dct.resolve(&mut doc).unwrap();
        assert_eq!(estimate.source, DateSource::Approximator);
        assert_eq!(doc.original_date(), Some("1999-01-01"));
    }

    #[test]
    fn test_approximator_may_leave_date_unset() {
        struct Silent;
        impl DocTimeApproximator for Silent {
            fn approximate(&self, _doc: &mut Document) {}
        }

        let dct = DctAnnotator::new(Arc::new(Silent));
        let mut doc = Document::new("note.txt", "nothing");
        assert_eq!(dct.annotate(&mut doc).unwrap(), AnnotationOutput::NoResult);
    }
}
