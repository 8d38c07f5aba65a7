//! Document creation time (DCT) detection strategies.
//!
//! Each strategy is an independent function that either produces a
//! normalized date string or declines. `DctAnnotator` chains them:
//! 1. Filename pattern (`<a>_<b>_<MM-DD-YYYY>...`)
//! 2. `Principal Date` header line
//! 3. External approximator (terminal fallback)

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of the header line carrying the note's principal date.
pub const HEADER_PREFIX: &str = "Principal Date";

/// Reduced form that is treated like a missing header.
const UNKNOWN_DIGITS: &str = "UNK";

/// Expected header digit layout: `20<YY><MM><DD>`.
const HEADER_DIGIT_LEN: usize = 8;

/// Legacy stripping class. It removes a non-digit together with the `]`
/// right after it and leaves every other character alone. Digits are ASCII
/// only, so other scripts' digits count as non-digits.
static COMPAT_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]]").expect("compat strip pattern should compile"));

static STRICT_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]").expect("strict strip pattern should compile"));

/// Which strategy produced a DCT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Filename,
    Header,
    Approximator,
}

impl DateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateSource::Filename => "filename",
            DateSource::Header => "header",
            DateSource::Approximator => "approximator",
        }
    }
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of DCT resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateEstimate {
    /// The date written to the metadata record. `None` when the
    /// approximator ran but could not settle on a date.
    pub date: Option<String>,
    pub source: DateSource,
}

/// How the header line is reduced to digits and sliced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMode {
    /// Legacy behaviour: strip `[^0-9]]` and slice `[0,3) [4,5) [6,7)`.
    #[default]
    Compat,
    /// Strip everything but ASCII digits and slice `[0,4) [4,6) [6,8)`.
    Strict,
}

/// What to do when the header yields a digit string of the wrong length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedHeaderPolicy {
    /// Surface `DocTimeError::MalformedHeaderDate` to the caller.
    #[default]
    Fail,
    /// Log and continue with the approximator.
    Fallback,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocTimeError {
    #[error("Principal date header {line:?} reduced to {digits:?}, expected 8 characters")]
    MalformedHeaderDate { line: String, digits: String },
}

/// Filename strategy.
///
/// `stem` is the base file name (no directory, no extension). The third
/// `_`-separated element must split on `-` into exactly three integers read
/// as month, day, year. Values are not range checked.
pub fn date_from_filename(stem: &str) -> Option<String> {
    let elements = split_dropping_trailing_empty(stem, '_');
    let candidate = elements.get(2)?;

    let parts = split_dropping_trailing_empty(candidate, '-');
    if parts.len() != 3 {
        return None;
    }

    let month: i32 = parts[0].parse().ok()?;
    let day: i32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;

    Some(format!("{}-{:02}-{:02}", year, month, day))
}

/// First line of `text` starting with [`HEADER_PREFIX`]. Lines split on `\n`.
pub fn find_header_line(text: &str) -> Option<&str> {
    text.split('\n').find(|line| line.starts_with(HEADER_PREFIX))
}

/// Reduce a header line to its date characters under `mode`.
pub fn header_digits(line: &str, mode: HeaderMode) -> String {
    match mode {
        HeaderMode::Compat => COMPAT_STRIP.replace_all(line, "").into_owned(),
        HeaderMode::Strict => STRICT_STRIP.replace_all(line, "").into_owned(),
    }
}

/// Slice an 8 character header digit string into a date under `mode`.
///
/// Compat mode keeps the legacy indices, so `"20250413"` becomes
/// `"202-5-4"`.
pub fn format_header_digits(digits: &str, mode: HeaderMode) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let slice = |from: usize, to: usize| -> String {
        chars
            .get(from..to.min(chars.len()))
            .map(|c| c.iter().collect())
            .unwrap_or_default()
    };

    match mode {
        HeaderMode::Compat => format!("{}-{}-{}", slice(0, 3), slice(4, 5), slice(6, 7)),
        HeaderMode::Strict => format!("{}-{}-{}", slice(0, 4), slice(4, 6), slice(6, 8)),
    }
}

/// Header strategy.
///
/// `Ok(None)` means no header line was found and the caller should fall
/// through. A header whose reduced form is not exactly 8 characters is an
/// error rather than a fall-through.
pub fn date_from_header(text: &str, mode: HeaderMode) -> Result<Option<String>, DocTimeError> {
    let Some(line) = find_header_line(text) else {
        return Ok(None);
    };

    let digits = header_digits(line, mode);
    if digits == UNKNOWN_DIGITS {
        return Ok(None);
    }

    if digits.chars().count() != HEADER_DIGIT_LEN {
        return Err(DocTimeError::MalformedHeaderDate {
            line: line.to_string(),
            digits,
        });
    }

    Ok(Some(format_header_digits(&digits, mode)))
}

/// `str::split` that drops trailing empty pieces, so `"a_b_"` yields two
/// elements rather than three.
fn split_dropping_trailing_empty(s: &str, sep: char) -> Vec<&str> {
    let mut parts: Vec<&str> = s.split(sep).collect();
    while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_date_zero_pads_month_and_day() {
        assert_eq!(
            date_from_filename("patient01_note_3-7-2019"),
            Some("2019-03-07".to_string())
        );
        assert_eq!(
            date_from_filename("ID123_path_11-25-2021_extra"),
            Some("2021-11-25".to_string())
        );
    }

    #[test]
    fn test_filename_date_not_range_checked() {
        assert_eq!(
            date_from_filename("a_b_13-45-2020"),
            Some("2020-13-45".to_string())
        );
    }

    #[test]
    fn test_filename_date_requires_three_elements() {
        assert_eq!(date_from_filename("a_03-05-2020"), None);
        assert_eq!(date_from_filename("note"), None);
        assert_eq!(date_from_filename("a_b_"), None);
    }

    #[test]
    fn test_filename_date_requires_three_tokens() {
        assert_eq!(date_from_filename("a_b_2020-03"), None);
        assert_eq!(date_from_filename("a_b_01-02-03-04"), None);
        // Trailing separators do not add tokens.
        assert_eq!(date_from_filename("a_b_03-05-2020-"), Some("2020-03-05".to_string()));
    }

    #[test]
    fn test_filename_date_non_numeric_tokens_do_not_match() {
        assert_eq!(date_from_filename("a_b_mar-05-2020"), None);
    }

    #[test]
    fn test_find_header_line_requires_line_start() {
        let text = "Patient: X\n  Principal Date: 20250413\nPrincipal Date: 20240101\n";
        assert_eq!(find_header_line(text), Some("Principal Date: 20240101"));
        assert_eq!(find_header_line("no header here"), None);
    }

    #[test]
    fn test_compat_strip_only_removes_bracket_pairs() {
        assert_eq!(
            header_digits("Principal Date: 20250413", HeaderMode::Compat),
            "Principal Date: 20250413"
        );
        assert_eq!(header_digits("ab]12x]", HeaderMode::Compat), "a12");
    }

    #[test]
    fn test_compat_strip_treats_non_ascii_digits_as_non_digits() {
        // U+0663 ARABIC-INDIC DIGIT THREE
        assert_eq!(
            header_digits("Principal Date \u{663}]", HeaderMode::Compat),
            "Principal Date "
        );
        assert_eq!(header_digits("Date 3]", HeaderMode::Compat), "Date 3]");
    }

    #[test]
    fn test_strict_strip_drops_non_ascii_digits() {
        assert_eq!(
            header_digits("Principal Date: \u{662}\u{660}\u{662}\u{665}-04-13", HeaderMode::Strict),
            "0413"
        );
        assert_eq!(
            date_from_header("Principal Date: \u{662}\u{660}20250413", HeaderMode::Strict),
            Ok(Some("2025-04-13".to_string()))
        );
    }

    #[test]
    fn test_strict_strip_keeps_digits_only() {
        assert_eq!(
            header_digits("Principal Date: 2025-04-13", HeaderMode::Strict),
            "20250413"
        );
    }

    #[test]
    fn test_compat_slicing_uses_pinned_indices() {
        assert_eq!(format_header_digits("20250413", HeaderMode::Compat), "202-5-4");
    }

    #[test]
    fn test_strict_slicing() {
        assert_eq!(format_header_digits("20250413", HeaderMode::Strict), "2025-04-13");
    }

    #[test]
    fn test_header_missing_falls_through() {
        assert_eq!(date_from_header("Some note\ntext", HeaderMode::Compat), Ok(None));
    }

    #[test]
    fn test_compat_header_is_malformed() {
        let err = date_from_header("Principal Date: 20250413\nbody", HeaderMode::Compat)
            .unwrap_err();
        assert_eq!(
            err,
            DocTimeError::MalformedHeaderDate {
                line: "Principal Date: 20250413".to_string(),
                digits: "Principal Date: 20250413".to_string(),
            }
        );
    }

    #[test]
    fn test_strict_header() {
        assert_eq!(
            date_from_header("MRN 1\nPrincipal Date: 04/13/2025 20250413", HeaderMode::Strict),
            Err(DocTimeError::MalformedHeaderDate {
                line: "Principal Date: 04/13/2025 20250413".to_string(),
                digits: "0413202520250413".to_string(),
            })
        );
        assert_eq!(
            date_from_header("MRN 1\nPrincipal Date: 20250413", HeaderMode::Strict),
            Ok(Some("2025-04-13".to_string()))
        );
    }
}
