//! Record sets: the header row and typed data rows of an extracted region.

use crate::error::WorkbookError;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Timelike;
use std::fmt;

/// A typed cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl CellValue {
    /// Blank cells and empty strings, such as a formula whose cached result is `""`.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(value) => value.is_empty(),
            _ => false,
        }
    }

    /// Text written to the CSV field.
    pub fn to_field(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(value) => write!(f, "{value}"),
            // -0 prints as "-0"
            CellValue::Number(value) if *value == 0.0 => write!(f, "0"),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            CellValue::DateTime(value) if value.nanosecond() == 0 => {
                write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S"))
            }
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S%.3f")),
            CellValue::Time(value) if value.nanosecond() == 0 => write!(f, "{}", value.format("%H:%M:%S")),
            CellValue::Time(value) => write!(f, "{}", value.format("%H:%M:%S%.3f")),
        }
    }
}

/// Header names plus data rows, each exactly as wide as the header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordSet {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RecordSet {
    /// Pads or truncates every row to the header width and drops rows whose
    /// values are all empty.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .filter(|row| !row.iter().all(CellValue::is_empty))
            .collect();
        RecordSet { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            headers: &self.headers,
            values,
        })
    }
}

/// One data row keyed by header name.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    headers: &'a [String],
    values: &'a [CellValue],
}

impl<'a> Record<'a> {
    /// Value under the first header called `name`.
    pub fn get(&self, name: &str) -> Option<&'a CellValue> {
        self.headers
            .iter()
            .position(|header| header == name)
            .map(|index| &self.values[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Builds the record set from a sheet region.
///
/// The first row of the region is the header row. Its width ends at the last
/// non-empty header cell; blank headers before that are named `column<N>`.
pub(crate) fn from_sheet(sheet: &Sheet) -> Result<RecordSet, WorkbookError> {
    let table = sheet.table();
    let missing_header = || SpreadsheetError::MissingHeaderRowError(sheet.file_name.to_owned(), sheet.name.to_owned());
    let Some((header_row, data_rows)) = table.split_first() else {
        return Err(missing_header().into());
    };

    let mut headers = Vec::with_capacity(header_row.len());
    for cell in header_row {
        let value = match cell {
            Some(cell) => cell.to_value().map_err(|message| cell_value_error(sheet, cell.reference(), message))?,
            None => CellValue::Empty,
        };
        headers.push(value.to_field());
    }
    let width = headers
        .iter()
        .rposition(|header| !header.is_empty())
        .map(|index| index + 1)
        .ok_or_else(missing_header)?;
    headers.truncate(width);
    for (index, header) in headers.iter_mut().enumerate() {
        if header.is_empty() {
            *header = format!("column{}", index + 1);
        }
    }

    let mut rows = Vec::with_capacity(data_rows.len());
    for data_row in data_rows {
        let mut values = Vec::with_capacity(width);
        for cell in data_row.iter().take(width) {
            let value = match cell {
                Some(cell) => cell.to_value().map_err(|message| cell_value_error(sheet, cell.reference(), message))?,
                None => CellValue::Empty,
            };
            values.push(value);
        }
        rows.push(values);
    }
    Ok(RecordSet::new(headers, rows))
}

fn cell_value_error(sheet: &Sheet, reference: String, message: String) -> SpreadsheetError {
    SpreadsheetError::CellValueError(sheet.file_name.to_owned(), sheet.name.to_owned(), reference, message)
}
