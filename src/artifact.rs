//! The CSV artifact: rendering a record set and publishing it atomically.
//!
//! Publication writes a temporary file in the output's directory, syncs it and
//! renames it over the destination, so readers see either the previous
//! complete file or the new one.

use crate::error::WorkbookError;
use crate::record::RecordSet;
use csv::Terminator;
use csv::WriterBuilder;
use std::fs;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Renders the header line and every data row into an in-memory CSV document.
pub fn render(records: &RecordSet) -> Result<Vec<u8>, WorkbookError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(records.headers())?;
    for row in records.rows() {
        writer.write_record(row.iter().map(|value| value.to_field()))?;
    }
    writer
        .into_inner()
        .map_err(|error| WorkbookError::IoError(error.into_error()))
}

/// Atomically replaces `path` with `content`.
pub fn publish(path: &Path, content: &[u8]) -> io::Result<()> {
    publish_with(path, |file| file.write_all(content))
}

/// Atomically replaces `path` with whatever `write` puts in the temporary file.
/// If `write` fails the temporary file is removed and `path` is left untouched.
pub fn publish_with<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let mut temporary = NamedTempFile::new_in(directory)?;
    write(temporary.as_file_mut())?;
    temporary.as_file().sync_all()?;
    temporary.persist(path).map_err(|error| error.error)?;
    Ok(())
}
