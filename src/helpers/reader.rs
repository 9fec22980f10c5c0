use crate::error::WorkbookError;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;

/// Signature of an OLE2 compound file. Encrypted OOXML packages are stored in one.
const COMPOUND_FILE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Byte source for a workbook: either the open file or a snapshot of its contents.
pub(crate) enum WorkbookReader {
    /// Reads through the file handle, which stays open until the reader is dropped
    File(BufReader<File>),
    /// Whole file copied into memory; the handle is closed before parsing starts
    Snapshot(Cursor<Vec<u8>>),
}

impl WorkbookReader {
    /// Opens a workbook for reading. Never opens for write.
    ///
    /// # Arguments
    /// * `path` - Path of the workbook file
    /// * `snapshot` - Copy the file into memory and release the handle immediately
    pub(crate) fn open(path: &Path, snapshot: bool) -> Result<WorkbookReader, WorkbookError> {
        if snapshot {
            Ok(WorkbookReader::Snapshot(Cursor::new(fs::read(path)?)))
        } else {
            Ok(WorkbookReader::File(BufReader::new(File::open(path)?)))
        }
    }

    /// Checks for the compound file signature and rewinds to the start.
    pub(crate) fn is_compound_file(&mut self) -> Result<bool, WorkbookError> {
        let mut signature = [0u8; 8];
        let mut filled = 0;
        while filled < signature.len() {
            match self.read(&mut signature[filled..])? {
                0 => break,
                count => filled += count,
            }
        }
        self.seek(SeekFrom::Start(0))?;
        Ok(filled == signature.len() && signature == COMPOUND_FILE_MAGIC)
    }
}

impl Read for WorkbookReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            WorkbookReader::File(reader) => reader.read(buf),
            WorkbookReader::Snapshot(reader) => reader.read(buf),
        }
    }
}

impl Seek for WorkbookReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            WorkbookReader::File(reader) => reader.seek(pos),
            WorkbookReader::Snapshot(reader) => reader.seek(pos),
        }
    }
}
