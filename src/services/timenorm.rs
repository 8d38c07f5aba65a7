//! Temporal expression normalization.
//!
//! The renderer only depends on the `TemporalNormalizer` contract: a raw
//! mention string plus a reference instant in, an optional canonical value
//! out. `PatternNormalizer` is the built-in implementation; it covers
//! explicit calendar dates, clock times and simple durations, and resolves
//! relative expressions only when given a real anchor date.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Days, Months, NaiveDate};
use regex::{Captures, Regex};

/// Anchor against which relative expressions are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceInstant {
    /// Sentinel "no real time". Relative expressions cannot resolve.
    Unanchored,
    Date(NaiveDate),
}

impl ReferenceInstant {
    pub fn anchor(&self) -> Option<NaiveDate> {
        match self {
            ReferenceInstant::Unanchored => None,
            ReferenceInstant::Date(d) => Some(*d),
        }
    }
}

/// Unit of a duration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Canonical temporal value. `Display` renders a TIMEX3-style value string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporalValue {
    Date(NaiveDate),
    Month { year: i32, month: u32 },
    Year(i32),
    Time { hour: u32, minute: u32 },
    Duration { amount: u32, unit: DurationUnit },
}

impl fmt::Display for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TemporalValue::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            TemporalValue::Year(y) => write!(f, "{:04}", y),
            TemporalValue::Time { hour, minute } => write!(f, "T{:02}:{:02}", hour, minute),
            TemporalValue::Duration { amount, unit } => match unit {
                DurationUnit::Minute => write!(f, "PT{}M", amount),
                DurationUnit::Hour => write!(f, "PT{}H", amount),
                DurationUnit::Day => write!(f, "P{}D", amount),
                DurationUnit::Week => write!(f, "P{}W", amount),
                DurationUnit::Month => write!(f, "P{}M", amount),
                DurationUnit::Year => write!(f, "P{}Y", amount),
            },
        }
    }
}

/// Normalization service contract. Implementations must be pure.
pub trait TemporalNormalizer: Send + Sync {
    fn normalize(&self, raw: &str, reference: &ReferenceInstant) -> Option<TemporalValue>;
}

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";
const COUNT: &str = r"(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)";
const UNIT: &str = r"(minute|min|hour|hr|day|week|wk|month|mo|year|yr)s?";

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("(?i)^{}$", pattern)).expect("temporal pattern should compile")
}

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| anchored(r"(\d{4})-(\d{1,2})-(\d{1,2})"));
static SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| anchored(r"(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})"));
static MONTH_DAY_YEAR: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!(r"{}\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})", MONTH)));
static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    anchored(&format!(r"(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{},?\s+(\d{{4}})", MONTH))
});
static MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!(r"{}(?:,|\s+of)?\s+(\d{{4}})", MONTH)));
static SLASH_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| anchored(r"(\d{1,2})/(\d{4})"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| anchored(r"(?:in\s+)?(\d{4})"));
static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| anchored(r"(\d{1,2}):(\d{2})\s*(am|pm|a\.m\.|p\.m\.)?"));
static DURATION: LazyLock<Regex> =
    LazyLock::new(|| anchored(&format!(r"(?:for\s+)?{}\s+{}", COUNT, UNIT)));
static RELATIVE_DAY: LazyLock<Regex> = LazyLock::new(|| anchored(r"(today|yesterday|tomorrow)"));
static AGO: LazyLock<Regex> = LazyLock::new(|| anchored(&format!(r"{}\s+{}\s+ago", COUNT, UNIT)));

/// Month number for an English month name or abbreviation.
pub fn month_from_name(name: &str) -> Option<u32> {
    let name = name.trim_end_matches('.').to_lowercase();
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn parse_count(s: &str) -> Option<u32> {
    let n = match s.to_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        other => other.parse().ok()?,
    };
    Some(n)
}

fn parse_unit(s: &str) -> Option<DurationUnit> {
    let unit = match s.to_lowercase().trim_end_matches('s') {
        "minute" | "min" => DurationUnit::Minute,
        "hour" | "hr" => DurationUnit::Hour,
        "day" => DurationUnit::Day,
        "week" | "wk" => DurationUnit::Week,
        "month" | "mo" => DurationUnit::Month,
        "year" | "yr" => DurationUnit::Year,
        _ => return None,
    };
    Some(unit)
}

fn group<T: std::str::FromStr>(caps: &Captures, i: usize) -> Option<T> {
    caps.get(i)?.as_str().parse().ok()
}

/// Two-digit years pivot at 50: `49` is 2049, `50` is 1950.
fn expand_year(raw: &str, year: i32) -> i32 {
    if raw.len() == 2 {
        if year >= 50 {
            1900 + year
        } else {
            2000 + year
        }
    } else {
        year
    }
}

/// Regex based normalizer for common clinical date, time and duration forms.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternNormalizer;

impl PatternNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn absolute(&self, text: &str) -> Option<TemporalValue> {
        if let Some(caps) = ISO_DATE.captures(text) {
            let date = NaiveDate::from_ymd_opt(group(&caps, 1)?, group(&caps, 2)?, group(&caps, 3)?)?;
            return Some(TemporalValue::Date(date));
        }

        if let Some(caps) = SLASH_DATE.captures(text) {
            let year = expand_year(&caps[3], group(&caps, 3)?);
            let date = NaiveDate::from_ymd_opt(year, group(&caps, 1)?, group(&caps, 2)?)?;
            return Some(TemporalValue::Date(date));
        }

        if let Some(caps) = MONTH_DAY_YEAR.captures(text) {
            let month = month_from_name(&caps[1])?;
            let date = NaiveDate::from_ymd_opt(group(&caps, 3)?, month, group(&caps, 2)?)?;
            return Some(TemporalValue::Date(date));
        }

        if let Some(caps) = DAY_MONTH_YEAR.captures(text) {
            let month = month_from_name(&caps[2])?;
            let date = NaiveDate::from_ymd_opt(group(&caps, 3)?, month, group(&caps, 1)?)?;
            return Some(TemporalValue::Date(date));
        }

        if let Some(caps) = MONTH_YEAR.captures(text) {
            let month = month_from_name(&caps[1])?;
            return Some(TemporalValue::Month {
                year: group(&caps, 2)?,
                month,
            });
        }

        if let Some(caps) = SLASH_MONTH_YEAR.captures(text) {
            let month: u32 = group(&caps, 1)?;
            if !(1..=12).contains(&month) {
                return None;
            }
            return Some(TemporalValue::Month {
                year: group(&caps, 2)?,
                month,
            });
        }

        if let Some(caps) = YEAR.captures(text) {
            return Some(TemporalValue::Year(group(&caps, 1)?));
        }

        if let Some(caps) = CLOCK_TIME.captures(text) {
            let mut hour: u32 = group(&caps, 1)?;
            let minute: u32 = group(&caps, 2)?;
            if let Some(meridiem) = caps.get(3) {
                if !(1..=12).contains(&hour) {
                    return None;
                }
                let pm = meridiem.as_str().to_lowercase().starts_with('p');
                hour = match (pm, hour) {
                    (false, 12) => 0,
                    (true, 12) => 12,
                    (true, h) => h + 12,
                    (false, h) => h,
                };
            }
            if hour > 23 || minute > 59 {
                return None;
            }
            return Some(TemporalValue::Time { hour, minute });
        }

        if let Some(caps) = DURATION.captures(text) {
            return Some(TemporalValue::Duration {
                amount: parse_count(&caps[1])?,
                unit: parse_unit(&caps[2])?,
            });
        }

        None
    }

    /// `today`/`yesterday`/`tomorrow` and `<count> <unit> ago`. Results
    /// outside chrono's date range fail instead of wrapping.
    fn relative(&self, text: &str, anchor: NaiveDate) -> Option<TemporalValue> {
        if let Some(caps) = RELATIVE_DAY.captures(text) {
            let date = match caps[1].to_lowercase().as_str() {
                "yesterday" => anchor.checked_sub_days(Days::new(1))?,
                "tomorrow" => anchor.checked_add_days(Days::new(1))?,
                _ => anchor,
            };
            return Some(TemporalValue::Date(date));
        }

        if let Some(caps) = AGO.captures(text) {
            let amount = parse_count(&caps[1])?;
            let date = match parse_unit(&caps[2])? {
                DurationUnit::Minute | DurationUnit::Hour => return None,
                DurationUnit::Day => anchor.checked_sub_days(Days::new(amount.into()))?,
                DurationUnit::Week => {
                    anchor.checked_sub_days(Days::new(u64::from(amount).checked_mul(7)?))?
                }
                DurationUnit::Month => anchor.checked_sub_months(Months::new(amount))?,
                DurationUnit::Year => anchor.checked_sub_months(Months::new(amount.checked_mul(12)?))?,
            };
            return Some(TemporalValue::Date(date));
        }

        None
    }
}

impl TemporalNormalizer for PatternNormalizer {
    fn normalize(&self, raw: &str, reference: &ReferenceInstant) -> Option<TemporalValue> {
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return None;
        }

        self.absolute(&text)
            .or_else(|| reference.anchor().and_then(|anchor| self.relative(&text, anchor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> Option<String> {
        PatternNormalizer::new()
            .normalize(raw, &ReferenceInstant::Unanchored)
            .map(|v| v.to_string())
    }

    fn norm_at(raw: &str, anchor: NaiveDate) -> Option<String> {
        PatternNormalizer::new()
            .normalize(raw, &ReferenceInstant::Date(anchor))
            .map(|v| v.to_string())
    }

    #[test]
    fn test_explicit_dates() {
        assert_eq!(norm("March 3, 2020").as_deref(), Some("2020-03-03"));
        assert_eq!(norm("Sept. 21st 2019").as_deref(), Some("2019-09-21"));
        assert_eq!(norm("3 March 2020").as_deref(), Some("2020-03-03"));
        assert_eq!(norm("2020-3-3").as_deref(), Some("2020-03-03"));
        assert_eq!(norm("03/04/2020").as_deref(), Some("2020-03-04"));
        assert_eq!(norm("03/04/98").as_deref(), Some("1998-03-04"));
    }

    #[test]
    fn test_partial_dates() {
        assert_eq!(norm("March 2020").as_deref(), Some("2020-03"));
        assert_eq!(norm("06/2021").as_deref(), Some("2021-06"));
        assert_eq!(norm("2019").as_deref(), Some("2019"));
    }

    #[test]
    fn test_mention_text_whitespace_collapsed() {
        assert_eq!(norm("March\n 3,\t2020").as_deref(), Some("2020-03-03"));
    }

    #[test]
    fn test_invalid_calendar_values_fail() {
        assert_eq!(norm("February 30, 2020"), None);
        assert_eq!(norm("13/2020"), None);
        assert_eq!(norm("25:10"), None);
    }

    #[test]
    fn test_times_and_durations() {
        assert_eq!(norm("2:30 pm").as_deref(), Some("T14:30"));
        assert_eq!(norm("12:05 a.m.").as_deref(), Some("T00:05"));
        assert_eq!(norm("three days").as_deref(), Some("P3D"));
        assert_eq!(norm("for 2 weeks").as_deref(), Some("P2W"));
        assert_eq!(norm("6 hours").as_deref(), Some("PT6H"));
    }

    #[test]
    fn test_relative_expressions_need_anchor() {
        assert_eq!(norm("yesterday"), None);
        assert_eq!(norm("two weeks ago"), None);

        let anchor = NaiveDate::from_ymd_opt(2020, 3, 4).unwrap();
        assert_eq!(norm_at("yesterday", anchor).as_deref(), Some("2020-03-03"));
        assert_eq!(norm_at("Tomorrow", anchor).as_deref(), Some("2020-03-05"));
        assert_eq!(norm_at("two weeks ago", anchor).as_deref(), Some("2020-02-19"));
        assert_eq!(norm_at("a month ago", anchor).as_deref(), Some("2020-02-04"));
        assert_eq!(norm_at("3 years ago", anchor).as_deref(), Some("2017-03-04"));
        assert_eq!(norm_at("6 hours ago", anchor), None);
    }

    #[test]
    fn test_huge_relative_offsets_fail() {
        let anchor = NaiveDate::from_ymd_opt(2020, 3, 4).unwrap();
        assert_eq!(norm_at("4000000000 days ago", anchor), None);
        assert_eq!(norm_at("4000000000 weeks ago", anchor), None);
        assert_eq!(norm_at("4000000000 years ago", anchor), None);
        assert_eq!(norm_at("99999999999 days ago", anchor), None);
        assert_eq!(norm_at("tomorrow", NaiveDate::MAX), None);
        assert_eq!(norm_at("yesterday", NaiveDate::MIN), None);
    }

    #[test]
    fn test_unrecognized_text_fails() {
        assert_eq!(norm("postoperatively"), None);
        assert_eq!(norm("   "), None);
    }
}
