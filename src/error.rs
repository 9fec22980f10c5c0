use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the feed: what the scheduler logs and the binary reports.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The workbook path does not exist or is not a regular file.
    #[error("Workbook not found: '{}'", .0.display())]
    SourceNotFound(PathBuf),

    /// Anything that went wrong while opening, reading, rendering or publishing.
    #[error("Extract from '{}' failed: {source}", .path.display())]
    ExtractionFailure {
        path: PathBuf,
        #[source]
        source: WorkbookError,
    },

    /// Clean shutdown request. Not a failure.
    #[error("Interrupt requested")]
    InterruptRequested,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Scheduled run aborted: {0}")]
    JobAborted(String),
}

impl FeedError {
    /// Wraps a low level error with the workbook it was raised for.
    /// A missing file seen this late (removed between checks) is still `SourceNotFound`.
    pub(crate) fn extraction(path: PathBuf, error: WorkbookError) -> Self {
        match error {
            WorkbookError::IoError(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                FeedError::SourceNotFound(path)
            }
            _ => FeedError::ExtractionFailure {
                path,
                source: error,
            },
        }
    }
}

/// Aggregates errors from the standard library, the parsing stack and internal modules.
#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    CsvError(#[from] csv::Error),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    OdsError(#[from] crate::spreadsheet::ods::OdsError),

    #[error("{0}")]
    RangeError(#[from] crate::spreadsheet::range::RangeError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, WorkbookError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| WorkbookError::WithContextError(format!("{}: {}", message, e)))
    }
}
