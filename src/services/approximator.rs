//! Fallback document creation time estimation.
//!
//! When neither the filename nor the header yields a date, the resolver
//! hands the document to a `DocTimeApproximator`. The approximator writes
//! its estimate directly into the document's source metadata and may leave
//! it untouched when it finds nothing usable.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use tracing::debug;

use crate::models::Document;
use crate::services::timenorm::month_from_name;

/// Contract for the terminal DCT strategy.
pub trait DocTimeApproximator: Send + Sync {
    /// Estimate a DCT and store it in `doc`'s source metadata.
    fn approximate(&self, doc: &mut Document);
}

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("ISO date pattern should compile")
});

static US_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("US date pattern should compile")
});

static LONG_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
    )
    .expect("long date pattern should compile")
});

/// Earliest year accepted as a plausible note date.
const MIN_YEAR: i32 = 1900;

/// Picks the latest explicit calendar date mentioned in the note text.
///
/// Years outside `1900..=current year + 1` are ignored, which filters out
/// birth-year typos and MRN fragments that happen to look like dates.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatestDateApproximator;

impl LatestDateApproximator {
    pub fn new() -> Self {
        Self
    }

    /// All plausible dates found in `text`, in no particular order.
    pub fn candidates(&self, text: &str) -> Vec<NaiveDate> {
        let max_year = Utc::now().year() + 1;
        let mut dates = Vec::new();

        for caps in ISO_DATE.captures_iter(text) {
            dates.extend(ymd(&caps[1], &caps[2], &caps[3]));
        }
        for caps in US_DATE.captures_iter(text) {
            dates.extend(ymd(&caps[3], &caps[1], &caps[2]));
        }
        for caps in LONG_DATE.captures_iter(text) {
            if let Some(month) = month_from_name(&caps[1]) {
                dates.extend(ymd(&caps[3], &month.to_string(), &caps[2]));
            }
        }

        dates.retain(|d| (MIN_YEAR..=max_year).contains(&d.year()));
        dates
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

impl DocTimeApproximator for LatestDateApproximator {
    fn approximate(&self, doc: &mut Document) {
        let Some(latest) = self.candidates(doc.text()).into_iter().max() else {
            debug!("No explicit dates in {}, leaving creation time unset", doc.id());
            return;
        };

        let date = latest.format("%Y-%m-%d").to_string();
        debug!("Approximated creation time for {} as {}", doc.id(), date);
        doc.source_metadata_mut().original_date = Some(date);
    }
}
