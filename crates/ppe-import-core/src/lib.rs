pub mod config;
pub mod credential;
pub mod db;
pub mod error;
pub mod ingestion;
pub mod sink;

pub use error::{ErrorKind, ImportError, Result};
pub use ppe_import_parser::RecordError;
