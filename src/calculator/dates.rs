//! Date normalization
//!
//! Form dates arrive in whatever format the field was configured with. The
//! normalizer tries a fixed list of candidate formats and only accepts a parse
//! when formatting the result with the same format reproduces the input, so a
//! day/month swap can't slip through silently.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use super::error::{CentileError, CentileResult};

/// Candidate formats, in the order they are tried
pub const CANDIDATE_FORMATS: [&str; 5] = [
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Earliest year accepted from any parse. `%Y` happily reads "20" as year 20.
const MIN_YEAR: i32 = 1000;

/// Permissive fallback formats, accepted without the round-trip check.
/// Two-digit years come first so `%Y` never sees them.
const FALLBACK_FORMATS: [&str; 21] = [
    "%d-%m-%y",
    "%d/%m/%y",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

/// Field order of a date validation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    Dmy,
    Mdy,
    Ymd,
}

impl FieldOrder {
    fn pattern(&self, sep: char) -> String {
        match self {
            FieldOrder::Dmy => format!("%d{sep}%m{sep}%Y"),
            FieldOrder::Mdy => format!("%m{sep}%d{sep}%Y"),
            FieldOrder::Ymd => format!("%Y{sep}%m{sep}%d"),
        }
    }
}

/// Format hint derived from a field's declared validation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormatHint {
    pub order: FieldOrder,
    pub with_time: bool,
    pub with_seconds: bool,
}

impl DateFormatHint {
    /// Parse a validation type such as `date_dmy` or `datetime_seconds_ymd`
    pub fn from_validation_type(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        let (kind, order) = lower.rsplit_once('_')?;

        let order = match order {
            "dmy" => FieldOrder::Dmy,
            "mdy" => FieldOrder::Mdy,
            "ymd" => FieldOrder::Ymd,
            _ => return None,
        };

        let (with_time, with_seconds) = match kind {
            "date" => (false, false),
            "datetime" => (true, false),
            "datetime_seconds" => (true, true),
            _ => return None,
        };

        Some(Self {
            order,
            with_time,
            with_seconds,
        })
    }

    /// Formats to try for this hint, most specific first
    pub fn formats(&self) -> Vec<String> {
        let mut formats = Vec::new();
        for sep in ['-', '/'] {
            let date = self.order.pattern(sep);
            if self.with_seconds {
                formats.push(format!("{date} %H:%M:%S"));
            }
            if self.with_time {
                formats.push(format!("{date} %H:%M"));
            }
            formats.push(date);
        }
        formats
    }
}

fn has_time(format: &str) -> bool {
    format.contains("%H")
}

fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    (date.year() >= MIN_YEAR).then_some(date)
}

/// Parse `text` with `format`, keeping only the calendar date
fn parse_with(text: &str, format: &str) -> Option<NaiveDate> {
    let date = if has_time(format) {
        NaiveDateTime::parse_from_str(text, format)
            .ok()
            .map(|dt| dt.date())
    } else {
        NaiveDate::parse_from_str(text, format).ok()
    };
    date.and_then(plausible)
}

/// Parse `text` with `format` and accept it only if it formats back identically
fn parse_round_trip(text: &str, format: &str) -> Option<NaiveDate> {
    if has_time(format) {
        let dt = NaiveDateTime::parse_from_str(text, format).ok()?;
        (dt.format(format).to_string() == text)
            .then(|| dt.date())
            .and_then(plausible)
    } else {
        let date = NaiveDate::parse_from_str(text, format).ok()?;
        (date.format(format).to_string() == text)
            .then_some(date)
            .and_then(plausible)
    }
}

/// Parses ambiguous form dates into calendar dates
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    candidates: Vec<String>,
    permissive_fallback: bool,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self {
            candidates: CANDIDATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            permissive_fallback: true,
        }
    }
}

impl DateNormalizer {
    /// Normalizer that fails instead of falling back to permissive parsing
    pub fn strict() -> Self {
        Self {
            permissive_fallback: false,
            ..Self::default()
        }
    }

    /// Normalize `text` to a calendar date.
    ///
    /// A recognised `hint` (a validation type like `date_mdy`) is tried first
    /// and trusted without the round-trip check. Unrecognised hints are ignored.
    pub fn normalize(&self, text: &str, hint: Option<&str>) -> CentileResult<NaiveDate> {
        let text = text.trim();

        if let Some(raw_hint) = hint {
            match DateFormatHint::from_validation_type(raw_hint) {
                Some(parsed) => {
                    for format in parsed.formats() {
                        if let Some(date) = parse_with(text, &format) {
                            tracing::debug!("Parsed date '{}' with hinted format '{}'", text, format);
                            return Ok(date);
                        }
                    }
                    tracing::debug!("Date '{}' does not match hint '{}'", text, raw_hint);
                }
                None => tracing::debug!("Ignoring unrecognised date format hint '{}'", raw_hint),
            }
        }

        for format in &self.candidates {
            if let Some(date) = parse_round_trip(text, format) {
                tracing::debug!("Parsed date '{}' with format '{}'", text, format);
                return Ok(date);
            }
        }

        if self.permissive_fallback {
            if let Some(date) = parse_permissive(text) {
                tracing::debug!("Parsed date '{}' with permissive fallback", text);
                return Ok(date);
            }
        }

        Err(CentileError::InvalidDateFormat(text.to_string()))
    }
}

fn parse_permissive(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return plausible(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return plausible(dt.date_naive());
    }
    FALLBACK_FORMATS
        .iter()
        .find_map(|format| parse_with(text, format))
}
