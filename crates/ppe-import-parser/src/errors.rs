use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn one data row into an [`ImportRecord`](crate::ImportRecord).
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("row has {found} fields, expected at least {expected}")]
    MalformedRow { found: usize, expected: usize },

    #[error("invalid event time '{value}': {source}")]
    DateParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid quantity '{value}': {source}")]
    NumberFormat {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} CSV error: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
