use crate::error::WorkbookError;
use crate::helpers::reader::WorkbookReader;
use crate::helpers::xml::XmlAttributes;
use crate::helpers::xml::XmlText;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Read;
use thiserror::Error;
use zip::ZipArchive;

const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
const SPREADSHEET: QName = QName(b"office:spreadsheet");
const TABLE: QName = QName(b"table:table");
const TABLE_ROW: QName = QName(b"table:table-row");
const TABLE_CELL: QName = QName(b"table:table-cell");
/// Cell hidden under a merged cell
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
const ANNOTATION: QName = QName(b"office:annotation");
const PARAGRAPH: QName = QName(b"text:p");
/// Run of `text:c` spaces
const SPACES: QName = QName(b"text:s");
const MANIFEST_FILE_ENTRY: QName = QName(b"manifest:file-entry");
const MANIFEST_ENCRYPTION_DATA: QName = QName(b"manifest:encryption-data");

#[derive(Error, Debug)]
pub enum OdsError {
    #[error("Invalid ODS MIME type")]
    MimeTypeError,
}

/// An OpenDocument spreadsheet (`.ods`).
pub(crate) struct OdsSpreadsheet {
    pub(crate) name: String,
    zip: ZipArchive<WorkbookReader>,
}

impl OdsSpreadsheet {
    pub(crate) fn open(file_name: &str, reader: WorkbookReader) -> Result<Self, WorkbookError> {
        let mut zip = ZipArchive::new(reader)?;
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?;
        }
        Ok(OdsSpreadsheet {
            name: file_name.to_owned(),
            zip,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Sheet, WorkbookError> {
        let mut reader = self.zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;

        let mut sheet_name = None::<String>;
        let mut has_tables = false;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == SPREADSHEET => break,
            Event::Start(event) if event.name() == TABLE => {
                has_tables = true;
                let table_name = event.attribute("table:name")?.unwrap_or_default();
                if criteria.accept(&table_name) {
                    sheet_name = Some(table_name.to_string());
                    break;
                }
            }
        });
        let Some(sheet_name) = sheet_name else {
            let error = if has_tables {
                SpreadsheetError::SheetNotFoundError(self.name.to_owned(), criteria.describe_sheet())
            } else {
                SpreadsheetError::SpreadsheetEmptyError(self.name.to_owned())
            };
            return Err(error.into());
        };
        let mut sheet = Sheet::new(&self.name, &sheet_name, criteria.range);

        // First row and column of the current (possibly repeated) row and cell
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 1usize;
        let mut col_count = 1usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut element_context = false; // reading text children
        let mut comment_context = false; // inside an annotation
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TABLE => break,
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = event.parse_attribute("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => {
                row += row_count;
                if sheet.after_row_upper_bound(row) {
                    break;
                }
            }
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                value.clear();
                col_count = event.parse_attribute("table:number-columns-repeated")?.unwrap_or(1);
                let value_type = event.attribute("office:value-type")?;
                kind = match value_type.as_deref() {
                    None => CellType::Empty,
                    Some("boolean") => CellType::Boolean,
                    Some("date") => CellType::IsoDateTime,
                    Some("time") => CellType::IsoDuration,
                    Some("string") => {
                        let is_error = event.attribute("calcext:value-type")?
                            .map(|calc_type| calc_type == "error")
                            .unwrap_or(false);
                        if is_error { CellType::Error } else { CellType::InlineString }
                    }
                    Some(_) => CellType::Number,
                };
                match kind {
                    CellType::InlineString | CellType::Error => element_context = true,
                    CellType::Boolean => {
                        let truth = event.attribute("office:boolean-value")?
                            .map(|boolean| boolean != "false" && boolean != "0")
                            .unwrap_or(false);
                        value.push_str(if truth { "1" } else { "0" });
                    }
                    CellType::IsoDateTime => if let Some(data) = event.attribute("office:date-value")? {
                        value.push_str(&data);
                    }
                    CellType::IsoDuration => if let Some(data) = event.attribute("office:time-value")? {
                        value.push_str(&data);
                    }
                    CellType::Number => if let Some(data) = event.attribute("office:value")? {
                        value.push_str(&data);
                    }
                    _ => (),
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                let is_text = matches!(kind, CellType::InlineString | CellType::Error);
                if kind != CellType::Empty && (is_text || !value.is_empty()) {
                    for row_number in row..row + row_count {
                        if sheet.after_row_upper_bound(row_number) {
                            break;
                        }
                        for col_number in col..col + col_count {
                            if sheet.after_col_upper_bound(col_number) {
                                break;
                            }
                            if sheet.contains(row_number, col_number) {
                                sheet.push(Cell {
                                    row: row_number,
                                    col: col_number,
                                    kind,
                                    value: value.to_owned(),
                                });
                            }
                        }
                    }
                }
                col += col_count;
                kind = CellType::Empty;
                element_context = false;
                comment_context = false;
            }
            Event::Start(event) if element_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if element_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if element_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == SPACES => {
                let count = event.parse_attribute("text:c")?.unwrap_or(1);
                for _ in 0..count {
                    value.push(' ');
                }
            }
            Event::Text(event) if element_context && !comment_context => value.push_text(&event)?,
            Event::GeneralRef(event) if element_context && !comment_context => value.push_reference(&event)?,
        });
        Ok(sheet)
    }
}

/// The optional `mimetype` member must name the spreadsheet type.
fn check_mime(zip: &mut ZipArchive<WorkbookReader>) -> Result<(), WorkbookError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// Encrypted entries carry `manifest:encryption-data` in the manifest.
fn is_password_protected(zip: &mut ZipArchive<WorkbookReader>) -> Result<bool, WorkbookError> {
    let Some(mut reader) = zip.xml_reader("META-INF/manifest.xml")? else {
        return Ok(false);
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == MANIFEST_FILE_ENTRY => in_file_entry = true,
        Event::End(event) if event.name() == MANIFEST_FILE_ENTRY => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == MANIFEST_ENCRYPTION_DATA => {
            return Ok(true);
        }
    });
    Ok(false)
}
