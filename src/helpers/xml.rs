//! Streaming XML access shared by the OOXML and OpenDocument readers.

use crate::error::WorkbookError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown entity '&{0};'")]
    ParseEntityError(String),

    #[error("Cannot parse attribute value '{0}'")]
    ParseAttributeValueError(String),
}

/// Event reader for workbook parts. `<c/>` and `<c></c>` both yield a
/// Start/End pair and text keeps its surrounding whitespace.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);
        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Next event, or `None` at end of document.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, WorkbookError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

/// Attribute lookup by qualified name on a start tag.
pub(crate) trait XmlAttributes<'a> {
    fn attribute(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, WorkbookError>;

    fn parse_attribute<T: FromStr>(&'a self, name: &str) -> Result<Option<T>, WorkbookError> {
        match self.attribute(name)? {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| XmlError::ParseAttributeValueError(value.into_owned()).into()),
            None => Ok(None),
        }
    }
}

impl<'a> XmlAttributes<'a> for BytesStart<'a> {
    fn attribute(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, WorkbookError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }
}

/// Cell text assembled from text events and entity or character references.
pub(crate) trait XmlText {
    fn push_text(&mut self, text: &BytesText) -> Result<(), WorkbookError>;

    fn push_reference(&mut self, reference: &BytesRef) -> Result<(), WorkbookError>;
}

impl XmlText for String {
    fn push_text(&mut self, text: &BytesText) -> Result<(), WorkbookError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    /// Resolves `#123`, `#x7B` and the predefined XML entities.
    fn push_reference(&mut self, reference: &BytesRef) -> Result<(), WorkbookError> {
        let raw = reference.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16)?,
                None => number.parse::<u32>()?,
            };
            self.extend(char::from_u32(code));
        } else {
            let entity = resolve_xml_entity(&raw).ok_or_else(|| XmlError::ParseEntityError(raw.to_string()))?;
            self.push_str(entity);
        }
        Ok(())
    }
}

/// Drives an `XmlReader` to the end of the document, dispatching each event to
/// the given match arms. Unmatched events are ignored; `break` leaves the loop.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}
