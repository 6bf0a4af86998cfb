pub mod errors;
pub mod fields;
pub mod model;
mod reader;

pub use errors::{ReadError, RecordError};
pub use fields::EVENT_TIME_FORMAT;
pub use model::{audit_line, Column, ImportRecord, AUDIT_PREFIX, COLUMN_COUNT};
pub use reader::{data_rows, read_rows};

pub use csv::StringRecord;
