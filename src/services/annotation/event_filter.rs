//! Event mention filter: drops mentions whose text contains an excluded term.

use std::collections::BTreeSet;
use std::io::{self, BufRead, BufReader, Read};

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Document, Span};
use crate::services::resources::ResourceLocator;

use super::annotator::Annotator;
use super::types::{AnnotationError, AnnotationOutput};

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("No event filter list configured (set event_filter.filter_list or DOCTIME_FILTER_LIST)")]
    MissingFilterList,

    #[error("Failed to read event filter list {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },
}

/// Lower-cased exclusion terms. Never contains an empty term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFilterSet {
    terms: BTreeSet<String>,
}

impl TermFilterSet {
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// One term per line, UTF-8.
    pub fn from_reader<R: Read>(reader: R) -> io::Result<Self> {
        let lines = BufReader::new(reader).lines().collect::<io::Result<Vec<_>>>()?;
        Ok(Self::from_terms(lines))
    }

    /// Load the list named by `location` through `locator`.
    ///
    /// A missing or empty location is an error: the filter has no
    /// pass-through mode.
    pub fn load(location: Option<&str>, locator: &dyn ResourceLocator) -> Result<Self, FilterError> {
        let location = match location.map(str::trim) {
            Some(l) if !l.is_empty() => l,
            _ => return Err(FilterError::MissingFilterList),
        };

        let io_err = |source: io::Error| FilterError::Io {
            location: location.to_string(),
            source,
        };
        let reader = locator.open(location).map_err(io_err)?;
        let set = Self::from_reader(reader).map_err(io_err)?;
        debug!("Loaded {} filter terms from {}", set.len(), location);
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// First term contained in `text`, compared case-insensitively as a
    /// plain substring.
    ///
    /// This is a linear scan over every term, so filtering a document costs
    /// O(mentions × terms). It is meant for short curated lists.
    pub fn matching_term(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.iter().find(|term| lowered.contains(term))
    }
}

/// Event mentions split by the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Surviving mentions in their original order.
    pub retained: Vec<Span>,
    pub removed: Vec<Span>,
}

/// Removes event mentions that contain any term from a `TermFilterSet`.
pub struct EventFilter {
    terms: TermFilterSet,
}

impl EventFilter {
    pub fn new(terms: TermFilterSet) -> Self {
        Self { terms }
    }

    /// Build from a configured list location. Fails when none is configured.
    pub fn from_config(location: Option<&str>, locator: &dyn ResourceLocator) -> Result<Self, FilterError> {
        Ok(Self::new(TermFilterSet::load(location, locator)?))
    }

    pub fn terms(&self) -> &TermFilterSet {
        &self.terms
    }

    /// Split the document's event mentions without touching the document.
    pub fn partition(&self, doc: &Document) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for span in doc.event_mentions() {
            let text = doc.covered_text(span);
            match self.terms.matching_term(text) {
                Some(term) => {
                    debug!("Removing event mention {} {:?} (matched {:?})", span, text, term);
                    outcome.removed.push(*span);
                }
                None => outcome.retained.push(*span),
            }
        }
        outcome
    }

    /// Replace the document's event mentions with the retained ones.
    pub fn process(&self, doc: &mut Document) -> Result<FilterOutcome, AnnotationError> {
        let outcome = self.partition(doc);
        doc.replace_event_mentions(outcome.retained.clone())?;
        info!(
            "Filtered {}: kept {} event mentions, removed {}",
            doc.id(),
            outcome.retained.len(),
            outcome.removed.len()
        );
        Ok(outcome)
    }
}

impl Annotator for EventFilter {
    fn annotation_type(&self) -> &str {
        "event_filter"
    }

    fn display_name(&self) -> &str {
        "Event Filter"
    }

    fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutput, AnnotationError> {
        if doc.event_mentions().is_empty() {
            return Ok(AnnotationOutput::Skipped);
        }
        let outcome = self.process(doc)?;
        Ok(AnnotationOutput::Data(format!("removed:{}", outcome.removed.len())))
    }
}
