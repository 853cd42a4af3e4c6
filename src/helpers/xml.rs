//! Event reading over the XML parts of a workbook package.

use crate::error::TrimError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

const TAG_TEXT_RUN: QName = QName(b"t");
const TAG_PHONETIC_RUN: QName = QName(b"rPh");

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown entity '&{0};'")]
    UnknownEntity(String),

    #[error("Invalid value '{1}' for attribute '{0}'")]
    InvalidAttribute(String, String),
}

/// Loops over the reader's events until end of document, dispatching to the given match arms.
/// Unmatched events are ignored.
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

/// Buffered event reader over one XML part
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    /// Empty elements are reported as start/end pairs and text keeps its whitespace.
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
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

    /// Next event, `None` at end of document.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, TrimError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(TrimError::XmlError(error)),
        }
    }

    /// Collects the text of the element that just started, up to its `end_tag`.
    ///
    /// Only `<t>` runs count, except with `bare_text` where the element's own text does too
    /// (`<v>`). Phonetic `<rPh>` runs are always left out.
    pub(crate) fn read_text(&mut self, end_tag: QName, bare_text: bool) -> Result<String, TrimError> {
        let mut in_phonetic_run = false;
        let mut in_text = bare_text;
        let mut text = String::new();
        match_xml_events!(self => {
            Event::End(event) if event.name() == end_tag => break,
            Event::Start(event) if event.name() == TAG_PHONETIC_RUN => in_phonetic_run = true,
            Event::End(event) if event.name() == TAG_PHONETIC_RUN => in_phonetic_run = false,
            Event::Start(event) if !in_phonetic_run && event.name() == TAG_TEXT_RUN => in_text = true,
            Event::End(event) if in_text && event.name() == TAG_TEXT_RUN => in_text = bare_text,
            Event::Text(event) if in_text => text.push_str(&event.xml_content()?),
            Event::CData(event) if in_text => text.push_str(&event.xml_content()?),
            Event::GeneralRef(event) if in_text => push_reference(&mut text, &event)?,
        });
        Ok(text)
    }
}

/// Appends an entity or character reference (`&amp;`, `&#20013;`, `&#x4E2D;`).
fn push_reference(text: &mut String, reference: &BytesRef) -> Result<(), TrimError> {
    let raw = reference.xml_content()?;
    if let Some(number) = raw.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16)?,
            None => number.parse::<u32>()?,
        };
        if let Some(character) = char::from_u32(code) {
            text.push(character);
        }
    } else if let Some(entity) = resolve_xml_entity(&raw) {
        text.push_str(entity);
    } else {
        Err(XmlError::UnknownEntity(raw.to_string()))?;
    }
    Ok(())
}

/// Attribute access on element start tags
pub(crate) trait XmlElementExt {
    /// Unescaped value of the named attribute
    fn attribute(&self, name: &str) -> Result<Option<Cow<'_, str>>, TrimError>;

    /// Value of the named attribute parsed into `T`
    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, TrimError>;
}

impl XmlElementExt for BytesStart<'_> {
    fn attribute(&self, name: &str) -> Result<Option<Cow<'_, str>>, TrimError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }

    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, TrimError> {
        let Some(value) = self.attribute(name)? else {
            return Ok(None);
        };
        value
            .parse::<T>()
            .map(Some)
            .map_err(|_| XmlError::InvalidAttribute(name.to_owned(), value.to_string()).into())
    }
}
