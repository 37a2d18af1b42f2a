//! Sanity checks for event records.
//!
//! The browser trusts its data source, so nothing here rejects records at load
//! time. The checks back the viewer's `--validate` mode and the warnings
//! logged after a load.

use crate::{DATE_FORMAT, EventRecord};
use chrono::NaiveDate;

/// What is wrong with a record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Problem {
    #[error("title is blank")]
    BlankTitle,

    #[error("location is blank")]
    BlankLocation,

    #[error("date {0:?} is not a YYYY-MM-DD calendar date")]
    MalformedDate(String),

    #[error("coordinates are not finite numbers")]
    NonFiniteCoordinate,

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A problem found in the record at `index` (position in the source array)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{index}] {problem}")]
pub struct ValidationIssue {
    pub index: usize,
    pub problem: Problem,
}

/// Check every record, returning all issues in source order
pub fn validate_records(records: &[EventRecord]) -> Vec<ValidationIssue> {
    profiling::scope!("validate_records");

    records
        .iter()
        .enumerate()
        .flat_map(|(index, record)| {
            record_problems(record)
                .into_iter()
                .map(move |problem| ValidationIssue { index, problem })
        })
        .collect()
}

fn record_problems(record: &EventRecord) -> Vec<Problem> {
    let mut problems = Vec::new();

    if record.title.trim().is_empty() {
        problems.push(Problem::BlankTitle);
    }
    if record.location.trim().is_empty() {
        problems.push(Problem::BlankLocation);
    }
    // Strict: exactly ten characters, so "2024-6-1" is rejected too
    if record.date.len() != 10 || NaiveDate::parse_from_str(&record.date, DATE_FORMAT).is_err() {
        problems.push(Problem::MalformedDate(record.date.clone()));
    }

    if !record.lat.is_finite() || !record.lon.is_finite() {
        problems.push(Problem::NonFiniteCoordinate);
    } else {
        if !(-90.0..=90.0).contains(&record.lat) {
            problems.push(Problem::LatitudeOutOfRange(record.lat));
        }
        if !(-180.0..=180.0).contains(&record.lon) {
            problems.push(Problem::LongitudeOutOfRange(record.lon));
        }
    }

    problems
}
