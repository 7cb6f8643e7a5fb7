//! Tanzil XML ingestor using quick-xml.
//!
//! Reads the simple Tanzil schema:
//!
//! ```text
//! <quran>
//!   <sura index="1" name="...">
//!     <aya index="1" text="..."/>
//!     ...
//!   </sura>
//!   ...
//! </quran>
//! ```
//!
//! Every `sura` element updates the current surah number. Every other
//! element that carries both a numeric `index` and a `text` attribute
//! becomes a verse of the current surah; anything else is skipped.

use std::collections::HashSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{TanzilError, TanzilResult};
use crate::verse::{Verse, EXPECTED_VERSE_COUNT};

const SURA_TAG: &[u8] = b"sura";
const INDEX_ATTR: &[u8] = b"index";
const TEXT_ATTR: &[u8] = b"text";

/// Read and validate a complete Tanzil document.
///
/// Fails with [`TanzilError::Validation`] unless exactly
/// [`EXPECTED_VERSE_COUNT`] verses were read.
///
/// # Example
///
/// ```
/// let xml = br#"<quran><sura index="1"><aya index="1" text="a"/></sura></quran>"#;
/// let err = tanzil2sql::parser::parse(xml).unwrap_err();
/// assert!(err.to_string().contains("1, not 6236"));
/// ```
pub fn parse(input: &[u8]) -> TanzilResult<Vec<Verse>> {
    let verses = read_verses(input)?;
    validate_count(&verses)?;
    Ok(verses)
}

/// Read verses in document order without checking the total.
pub fn read_verses(input: &[u8]) -> TanzilResult<Vec<Verse>> {
    if input.is_empty() {
        return Err(TanzilError::input("XML content is empty"));
    }

    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut ctx = ParseContext::default();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| parse_error(&reader, e))?;

        match event {
            Event::Start(ref e) => {
                ctx.start_element(e).map_err(|e| parse_error(&reader, e))?;
                ctx.open.push(e.name().as_ref().to_vec());
            }
            Event::Empty(ref e) => {
                ctx.start_element(e).map_err(|e| parse_error(&reader, e))?;
            }
            Event::End(ref e) => {
                let closed = ctx.open.pop();
                if closed.as_deref() != Some(e.name().as_ref()) {
                    return Err(TanzilError::parse(
                        reader.buffer_position() as u64,
                        format!(
                            "unexpected closing tag </{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        ),
                    ));
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    let position = reader.buffer_position() as u64;
    if let Some(name) = ctx.open.last() {
        return Err(TanzilError::parse(
            position,
            format!("unclosed element <{}>", String::from_utf8_lossy(name)),
        ));
    }
    if !ctx.saw_root {
        return Err(TanzilError::parse(position, "document has no root element"));
    }

    ctx.finish()
}

/// Check the total verse count of a finished document.
pub fn validate_count(verses: &[Verse]) -> TanzilResult<()> {
    if verses.len() != EXPECTED_VERSE_COUNT {
        tracing::warn!(
            "Verse count mismatch: read {}, expected {}",
            verses.len(),
            EXPECTED_VERSE_COUNT
        );
        return Err(TanzilError::Validation {
            expected: EXPECTED_VERSE_COUNT,
            actual: verses.len(),
        });
    }
    Ok(())
}

/// Mutable state threaded through one parse.
#[derive(Debug, Default)]
struct ParseContext {
    surah: u32,
    verses: Vec<Verse>,
    open: Vec<Vec<u8>>,
    saw_root: bool,
    skipped: usize,
}

impl ParseContext {
    fn start_element(&mut self, element: &BytesStart) -> Result<(), quick_xml::Error> {
        self.saw_root = true;

        if element.name().as_ref() == SURA_TAG {
            if let Some(surah) = attribute(element, INDEX_ATTR)?.and_then(|v| v.parse().ok()) {
                self.surah = surah;
            }
            return Ok(());
        }

        let mut aya: Option<u32> = None;
        let mut text: Option<String> = None;
        for attr in element.attributes() {
            let attr = attr?;
            let key = attr.key.as_ref();
            if key == INDEX_ATTR {
                aya = attr.unescape_value()?.parse().ok();
            } else if key == TEXT_ATTR {
                text = Some(attr.unescape_value()?.into_owned());
            }
        }

        match (aya, text) {
            (Some(aya), Some(text)) => self.verses.push(Verse::new(self.surah, aya, text)),
            _ => {
                self.skipped += 1;
                tracing::trace!(
                    "Skipping <{}> without index/text",
                    String::from_utf8_lossy(element.name().as_ref())
                );
            }
        }
        Ok(())
    }

    fn finish(self) -> TanzilResult<Vec<Verse>> {
        let mut seen = HashSet::with_capacity(self.verses.len());
        let duplicates = self.verses.iter().filter(|v| !seen.insert(v.id())).count();
        if duplicates > 0 {
            tracing::warn!("{} verses repeat an earlier (surah, aya) pair", duplicates);
        }

        tracing::debug!(
            "Read {} verses, skipped {} elements",
            self.verses.len(),
            self.skipped
        );
        Ok(self.verses)
    }
}

/// Unescaped value of an attribute, if present.
fn attribute(element: &BytesStart, name: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> TanzilError {
    TanzilError::parse(reader.buffer_position() as u64, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_reads_verses_in_document_order() {
        let xml = br#"<?xml version="1.0" encoding="utf-8" ?>
<quran>
  <sura index="2" name="x">
    <aya index="2" text="second"/>
    <aya index="1" text="first"/>
  </sura>
  <sura index="1" name="y">
    <aya index="1" text="opening"/>
  </sura>
</quran>"#;
        let verses = read_verses(xml).unwrap();
        let ids: Vec<_> = verses.iter().map(Verse::id).collect();
        assert_eq!(ids, vec![(2, 2), (2, 1), (1, 1)]);
        assert_eq!(verses[2].text, "opening");
    }

    #[test]
    fn test_unescapes_attribute_values() {
        let xml = br#"<quran><sura index="1"><aya index="1" text="a &amp; b &apos;c&apos;"/></sura></quran>"#;
        let verses = read_verses(xml).unwrap();
        assert_eq!(verses[0].text, "a & b 'c'");
    }

    #[test]
    fn test_skips_elements_missing_attributes() {
        let xml = br#"<quran>
  <sura index="1">
    <aya index="1"/>
    <aya text="no index"/>
    <aya index="x" text="bad index"/>
    <aya index="2" text="kept"/>
  </sura>
</quran>"#;
        let verses = read_verses(xml).unwrap();
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].id(), (1, 2));
    }

    #[test]
    fn test_bad_sura_index_keeps_current_surah() {
        let xml = br#"<quran>
  <sura index="5"><aya index="1" text="a"/></sura>
  <sura index="six"><aya index="2" text="b"/></sura>
  <sura><aya index="3" text="c"/></sura>
</quran>"#;
        let verses = read_verses(xml).unwrap();
        assert!(verses.iter().all(|v| v.surah == 5));
    }

    #[test]
    fn test_aya_before_any_sura_gets_surah_zero() {
        let xml = br#"<quran><aya index="1" text="orphan"/></quran>"#;
        let verses = read_verses(xml).unwrap();
        assert_eq!(verses[0].id(), (0, 1));
    }

    #[test]
    fn test_full_document_passes_validation() {
        let xml = fixtures::tanzil_xml();
        let verses = parse(xml.as_bytes()).unwrap();
        assert_eq!(verses.len(), 6236);
        let ids: HashSet<_> = verses.iter().map(Verse::id).collect();
        assert_eq!(ids.len(), 6236);
    }

    #[test]
    fn test_any_distribution_of_6236_passes() {
        let xml = fixtures::flat_xml(&[3000, 3236]);
        assert_eq!(parse(xml.as_bytes()).unwrap().len(), 6236);
    }

    #[test]
    fn test_6235_verses_fail_validation() {
        let xml = fixtures::flat_xml(&[6235]);
        let err = parse(xml.as_bytes()).unwrap_err();
        match err {
            TanzilError::Validation { expected, actual } => {
                assert_eq!(expected, 6236);
                assert_eq!(actual, 6235);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(
            parse(xml.as_bytes())
                .unwrap_err()
                .to_string()
                .contains("6235, not 6236")
        );
    }

    #[test]
    fn test_missing_text_does_not_count() {
        let mut xml = fixtures::flat_xml(&[6236]);
        xml = xml.replacen("<sura index=\"1\">", "<sura index=\"1\"><aya index=\"9999\"/>", 1);
        assert_eq!(xml.matches("<aya ").count(), 6237);
        assert_eq!(parse(xml.as_bytes()).unwrap().len(), 6236);
    }

    #[test]
    fn test_unclosed_element_is_parse_error() {
        let xml = br#"<quran><sura index="1"><aya index="1" text="a"/>"#;
        let err = read_verses(xml).unwrap_err();
        assert!(matches!(err, TanzilError::Parse { .. }));
        assert!(err.to_string().contains("unclosed element <sura>"));
    }

    #[test]
    fn test_mismatched_end_tag_is_parse_error() {
        let xml = br#"<quran><sura index="1"></aya></quran>"#;
        assert!(matches!(
            read_verses(xml).unwrap_err(),
            TanzilError::Parse { .. }
        ));
    }

    #[test]
    fn test_truncated_tag_is_parse_error() {
        let xml = br#"<quran><sura index="1"><aya index="1" text="a"#;
        assert!(matches!(
            read_verses(xml).unwrap_err(),
            TanzilError::Parse { .. }
        ));
    }

    #[test]
    fn test_empty_input_is_input_error() {
        assert!(matches!(read_verses(b"").unwrap_err(), TanzilError::Input(_)));
    }

    #[test]
    fn test_document_without_root_is_parse_error() {
        assert!(matches!(
            read_verses(b"  \n ").unwrap_err(),
            TanzilError::Parse { .. }
        ));
    }
}
