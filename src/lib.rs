//! # Options Feed
//!
//! Republishes a fixed region of a spreadsheet as a CSV file, once or on a
//! fixed interval, for a dashboard that reads the CSV on every request.
//!
//! ## Components
//!
//! - [`extractor::Extractor`]: opens the workbook read-only, reads the header
//!   row and data rows of the configured region, renders them as CSV and
//!   replaces the output file atomically.
//! - [`scheduler::Scheduler`]: invokes a [`scheduler::Job`] every interval until
//!   shut down, never running two jobs at once.
//!
//! ## Supported formats
//!
//! Office Open XML workbooks (`.xlsx`, `.xlsm`, `.xlam`) and OpenDocument
//! spreadsheets (`.ods`). Formula cells yield their cached values.
//!
//! ## Example
//!
//! ```no_run
//! use options_feed::extractor::{Extractor, ExtractorConfig};
//!
//! let extractor = Extractor::new(ExtractorConfig {
//!     workbook: "options.xlsm".into(),
//!     output: "static/data.csv".into(),
//!     sheet: Some("Sheet1".to_owned()),
//!     range: Some("A1:F18".to_owned()),
//!     snapshot: true,
//! })?;
//! let report = extractor.extract()?;
//! println!("{} rows", report.rows);
//! # Ok::<(), options_feed::error::FeedError>(())
//! ```
pub mod artifact;
pub mod config;
pub mod error;
pub mod extractor;
mod helpers;
pub mod record;
pub mod scheduler;
mod spreadsheet;

pub use error::FeedError;
pub use extractor::ExtractReport;
pub use extractor::Extractor;
pub use extractor::ExtractorConfig;
pub use record::CellValue;
pub use record::RecordSet;
pub use scheduler::ScheduleConfig;
pub use scheduler::ScheduleSummary;
pub use scheduler::Scheduler;
