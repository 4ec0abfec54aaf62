//! Datetime normalizer.
//!
//! # Responsibility
//! - Parse loosely formatted note timestamps.
//! - Rewrite them as ISO-8601 strings.
//!
//! # Invariants
//! - Naive inputs produce naive output (`YYYY-MM-DDTHH:MM:SS[.ffffff]`).
//! - Inputs with an explicit offset keep it in the output.

use crate::error::{ConvertError, ConvertResult};
use crate::model::note::NoteRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

// `%.f` also accepts a missing fraction.
const NAIVE_DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M",
];
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const ISO_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
const ISO_MICROS: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Timestamp text that matched no accepted layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatetimeError {
    pub raw: String,
}

impl Display for DatetimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unable to parse timestamp `{}`", self.raw)
    }
}

impl Error for DatetimeError {}

/// One note whose timestamp could not be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatetimeFailure {
    pub index: usize,
    pub title: String,
    pub raw: String,
}

impl Display for DatetimeFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} title=`{}` datetime=`{}`",
            self.index, self.title, self.raw
        )
    }
}

/// Formats a naive datetime the way ISO-8601 canonical output expects.
///
/// Sub-second precision is emitted only when present.
pub fn format_iso(value: &NaiveDateTime) -> String {
    if value.nanosecond() == 0 {
        value.format(ISO_SECONDS).to_string()
    } else {
        value.format(ISO_MICROS).to_string()
    }
}

/// Parses one raw timestamp into its canonical ISO-8601 form.
pub fn parse_timestamp(raw: &str) -> Result<String, DatetimeError> {
    let trimmed = raw.trim();

    for layout in NAIVE_DATETIME_LAYOUTS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Ok(format_iso(&parsed));
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        let naive = format_iso(&parsed.naive_local());
        return Ok(format!("{naive}{}", parsed.format("%:z")));
    }

    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, layout) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(format_iso(&midnight));
            }
        }
    }

    Err(DatetimeError {
        raw: raw.to_string(),
    })
}

/// Canonicalizes the timestamp of every note in the batch.
///
/// # Errors
/// Returns `ConvertError::UnparseableDatetimes` naming each failing note's
/// title and raw timestamp. No record is updated in that case.
pub fn normalize_datetimes(notes: &[NoteRecord]) -> ConvertResult<()> {
    let mut parsed = Vec::with_capacity(notes.len());
    let mut failures = Vec::new();

    for note in notes {
        match parse_timestamp(note.datetime_raw()) {
            Ok(value) => parsed.push(value),
            Err(err) => failures.push(DatetimeFailure {
                index: note.index(),
                title: note.title().to_string(),
                raw: err.raw,
            }),
        }
    }

    if !failures.is_empty() {
        error!(
            "event=datetimes_normalize module=normalize status=error unparsed={} total={}",
            failures.len(),
            notes.len()
        );
        return Err(ConvertError::UnparseableDatetimes(failures));
    }

    for (note, value) in notes.iter().zip(parsed) {
        note.set_datetime(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_timestamp;

    #[test]
    fn log_timestamp_becomes_iso() {
        assert_eq!(
            parse_timestamp("2024-01-01 10:00:00").unwrap(),
            "2024-01-01T10:00:00"
        );
    }

    #[test]
    fn accepts_alternate_layouts() {
        assert_eq!(
            parse_timestamp("2024/03/05 07:08:09").unwrap(),
            "2024-03-05T07:08:09"
        );
        assert_eq!(
            parse_timestamp("2024-03-05 07:08").unwrap(),
            "2024-03-05T07:08:00"
        );
        assert_eq!(parse_timestamp("2024-03-05").unwrap(), "2024-03-05T00:00:00");
        assert_eq!(
            parse_timestamp("2024-03-05T07:08:09.250").unwrap(),
            "2024-03-05T07:08:09.250000"
        );
    }

    #[test]
    fn keeps_explicit_offset() {
        assert_eq!(
            parse_timestamp("2024-03-05T07:08:09+02:00").unwrap(),
            "2024-03-05T07:08:09+02:00"
        );
    }

    #[test]
    fn rejects_impossible_calendar_values() {
        let err = parse_timestamp("2024-13-45 10:00:00").unwrap_err();
        assert_eq!(err.raw, "2024-13-45 10:00:00");
        assert!(parse_timestamp("2023-02-29 10:00:00").is_err());
        assert!(parse_timestamp("2024-01-01 25:00:00").is_err());
    }
}
