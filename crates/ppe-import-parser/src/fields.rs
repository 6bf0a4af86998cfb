use chrono::NaiveDateTime;

use crate::errors::RecordError;

/// `MM/dd/yyyy hh:mm:ss a`, e.g. `03/14/2024 01:05:09 PM`.
pub const EVENT_TIME_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

pub fn parse_event_time(value: &str) -> Result<NaiveDateTime, RecordError> {
    NaiveDateTime::parse_from_str(value, EVENT_TIME_FORMAT).map_err(|source| {
        RecordError::DateParse {
            value: value.to_string(),
            source,
        }
    })
}

/// Quantities are stored as a 32-bit integer. No trimming and no range checks
/// beyond what `i32` can hold.
pub fn parse_quantity(value: &str) -> Result<i32, RecordError> {
    value
        .parse::<i32>()
        .map_err(|source| RecordError::NumberFormat {
            value: value.to_string(),
            source,
        })
}

pub fn strip_commas(value: &str) -> String {
    value.chars().filter(|c| *c != ',').collect()
}
