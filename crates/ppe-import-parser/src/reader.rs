use std::fs;
use std::path::Path;

use csv::{Position, ReaderBuilder, StringRecord};

use crate::errors::ReadError;

/// Reads every row of a delimited file into memory. The header is returned
/// as row 0 like any other row; callers skip it with [`data_rows`]. Blank
/// lines are not rows.
///
/// Each row's position points at the line its first field starts on.
pub fn read_rows(path: &Path) -> Result<Vec<StringRecord>, ReadError> {
    let bytes = fs::read(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let mut cursor = LineCursor::default();
    let mut rows = Vec::new();
    for result in reader.records() {
        let mut row = result.map_err(|source| ReadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(pos) = row.position().cloned() {
            row.set_position(Some(cursor.record_start(&bytes, pos)));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Data rows with the 1-based file line each one starts on; row 0 is always
/// the header.
pub fn data_rows(rows: &[StringRecord]) -> impl Iterator<Item = (usize, &StringRecord)> {
    rows.iter().enumerate().skip(1).map(|(idx, row)| {
        let line = row
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(idx + 1);
        (line, row)
    })
}

/// Tracks the line number of a byte offset while records are read in order.
struct LineCursor {
    offset: usize,
    line: usize,
}

impl Default for LineCursor {
    fn default() -> Self {
        Self { offset: 0, line: 1 }
    }
}

impl LineCursor {
    /// The reader may report a record as starting before the blank lines it
    /// skipped; move past them so the line is the record's own.
    fn record_start(&mut self, bytes: &[u8], mut pos: Position) -> Position {
        let mut start = (pos.byte() as usize).clamp(self.offset, bytes.len());
        while start < bytes.len() && matches!(bytes[start], b'\n' | b'\r') {
            start += 1;
        }

        self.line += bytes[self.offset..start]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.offset = start;

        pos.set_byte(start as u64).set_line(self.line as u64);
        pos
    }
}
