use std::fmt;

use chrono::NaiveDateTime;
use csv::StringRecord;

use crate::errors::RecordError;
use crate::fields::{parse_event_time, parse_quantity, strip_commas};

/// Number of columns a data row must carry.
pub const COLUMN_COUNT: usize = 10;

pub const AUDIT_PREFIX: &str = "Inserted record: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Terminal,
    Department,
    EventTime,
    EmployeeNumber,
    LastName,
    FirstName,
    PartNumber,
    ItemId,
    ItemName,
    Quantity,
}

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Terminal,
        Column::Department,
        Column::EventTime,
        Column::EmployeeNumber,
        Column::LastName,
        Column::FirstName,
        Column::PartNumber,
        Column::ItemId,
        Column::ItemName,
        Column::Quantity,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Target column name in the `PPE_DATA` table.
    pub fn db_name(&self) -> &'static str {
        match self {
            Column::Terminal => "TERMINAL",
            Column::Department => "DEPARTMENT",
            Column::EventTime => "DATE_TIME",
            Column::EmployeeNumber => "EMP_NUMBER",
            Column::LastName => "LAST_NAME",
            Column::FirstName => "FIRST_NAME",
            Column::PartNumber => "GCT_PART_NUMBER",
            Column::ItemId => "ITEM_ID",
            Column::ItemName => "ITEM_NAME",
            Column::Quantity => "QUANTITY",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.db_name())
    }
}

/// One decoded data row, ready to be bound to the insert statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub terminal: String,
    pub department: String,
    pub event_time: NaiveDateTime,
    pub employee_number: String,
    pub last_name: String,
    pub first_name: String,
    pub part_number: String,
    pub item_id: String,
    pub item_name: String,
    pub quantity: i32,
}

impl ImportRecord {
    pub fn from_row(row: &StringRecord) -> Result<Self, RecordError> {
        if row.len() < COLUMN_COUNT {
            return Err(RecordError::MalformedRow {
                found: row.len(),
                expected: COLUMN_COUNT,
            });
        }

        let field = |column: Column| row.get(column.index()).unwrap_or_default();

        Ok(Self {
            terminal: field(Column::Terminal).to_string(),
            department: field(Column::Department).to_string(),
            event_time: parse_event_time(field(Column::EventTime))?,
            employee_number: field(Column::EmployeeNumber).to_string(),
            last_name: field(Column::LastName).to_string(),
            first_name: field(Column::FirstName).to_string(),
            part_number: field(Column::PartNumber).to_string(),
            item_id: field(Column::ItemId).to_string(),
            item_name: strip_commas(field(Column::ItemName)),
            quantity: parse_quantity(field(Column::Quantity))?,
        })
    }
}

/// Audit text for an inserted row: the prefix followed by every raw field
/// concatenated without a separator.
pub fn audit_line(row: &StringRecord) -> String {
    let mut line = String::with_capacity(AUDIT_PREFIX.len() + row.as_slice().len());
    line.push_str(AUDIT_PREFIX);
    for value in row.iter() {
        line.push_str(value);
    }
    line
}
