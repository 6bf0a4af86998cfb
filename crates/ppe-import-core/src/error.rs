// crates/ppe-import-core/src/error.rs

use std::fmt;
use std::path::PathBuf;

use ppe_import_parser::{ReadError, RecordError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::credential::CryptoError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Bad file path {}: {source}", path.display())]
    BadPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found {}: {source}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} line {line}: {source}", path.display())]
    Record {
        path: PathBuf,
        line: usize,
        #[source]
        source: RecordError,
    },

    #[error("CSV parsing error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Database operation failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Credential error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure classes of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadPath,
    FileNotFound,
    MalformedRow,
    DateParse,
    NumberFormat,
    Database,
    Crypto,
    Config,
}

impl ErrorKind {
    /// Severe kinds are data errors; the rest are environmental and logged as
    /// warnings.
    pub fn is_severe(&self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedRow | ErrorKind::DateParse | ErrorKind::NumberFormat
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadPath => "bad_path",
            ErrorKind::FileNotFound => "file_not_found",
            ErrorKind::MalformedRow => "malformed_row",
            ErrorKind::DateParse => "date_parse",
            ErrorKind::NumberFormat => "number_format",
            ErrorKind::Database => "database",
            ErrorKind::Crypto => "crypto",
            ErrorKind::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::BadPath { .. } => ErrorKind::BadPath,
            ImportError::FileNotFound { .. } => ErrorKind::FileNotFound,
            ImportError::Record { source, .. } => match source {
                RecordError::MalformedRow { .. } => ErrorKind::MalformedRow,
                RecordError::DateParse { .. } => ErrorKind::DateParse,
                RecordError::NumberFormat { .. } => ErrorKind::NumberFormat,
            },
            ImportError::Csv { .. } => ErrorKind::MalformedRow,
            ImportError::Database(_) => ErrorKind::Database,
            ImportError::Crypto(_) => ErrorKind::Crypto,
            ImportError::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<ReadError> for ImportError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Open { path, source } => ImportError::FileNotFound { path, source },
            ReadError::Csv { path, source } => ImportError::Csv { path, source },
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
