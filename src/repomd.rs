// src/repomd.rs

//! repomd.xml index parsing
//!
//! repomd.xml lists every metadata document of a repository together with
//! its location and checksum. The checksum is what the cache uses to decide
//! whether a database is still fresh.

use crate::error::{Error, Result};
use crate::parser::MetadataKind;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;
use tracing::debug;

/// One `<data>` block of repomd.xml
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepomdEntry {
    /// Data type, e.g. "primary" or "filelists"
    pub data_type: String,
    /// Location relative to the repository root
    pub location: String,
    pub checksum_type: Option<String>,
    pub checksum: String,
    pub open_checksum: Option<String>,
}

impl RepomdEntry {
    /// The decoder able to read this document, if any
    pub fn kind(&self) -> Option<MetadataKind> {
        MetadataKind::from_repomd_type(&self.data_type)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Checksum,
    OpenChecksum,
}

/// Parse repomd.xml
pub fn parse_repomd<R: BufRead>(input: R) -> Result<Vec<RepomdEntry>> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);
    reader.expand_empty_elements(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<RepomdEntry> = None;
    let mut field = Field::None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|source| Error::Xml {
            position: reader.buffer_position(),
            source,
        })?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"data" => {
                    current = Some(RepomdEntry {
                        data_type: attribute(&e, b"type")?.unwrap_or_default(),
                        ..RepomdEntry::default()
                    });
                }
                b"location" => {
                    if let (Some(entry), Some(href)) = (current.as_mut(), attribute(&e, b"href")?) {
                        entry.location = href;
                    }
                }
                b"checksum" => {
                    if let Some(entry) = current.as_mut() {
                        entry.checksum_type = attribute(&e, b"type")?;
                        field = Field::Checksum;
                    }
                }
                b"open-checksum" => field = Field::OpenChecksum,
                _ => {}
            },
            Event::Text(e) => {
                if let Some(entry) = current.as_mut() {
                    let text = e.unescape().map_err(|source| Error::Xml {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    match field {
                        Field::Checksum => entry.checksum = text.into_owned(),
                        Field::OpenChecksum => entry.open_checksum = Some(text.into_owned()),
                        Field::None => {}
                    }
                }
            }
            Event::End(e) => {
                field = Field::None;
                if e.name().as_ref() == b"data" {
                    if let Some(entry) = current.take() {
                        debug!("repomd.xml lists {} at {}", entry.data_type, entry.location);
                        entries.push(entry);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// Find the entry for a document kind
pub fn find_entry(entries: &[RepomdEntry], kind: MetadataKind) -> Result<&RepomdEntry> {
    entries
        .iter()
        .find(|e| e.kind() == Some(kind))
        .ok_or_else(|| Error::MissingMetadata(kind.to_string()))
}

fn attribute(start: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    let mut found = None;
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::InvalidMetadata(format!("Bad attribute in repomd.xml: {}", e)))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::InvalidMetadata(format!("Bad attribute value in repomd.xml: {}", e)))?;
            found = Some(value.into_owned());
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPOMD_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo" xmlns:rpm="http://linux.duke.edu/metadata/rpm">
  <revision>1700000000</revision>
  <data type="primary">
    <checksum type="sha256">aaa111</checksum>
    <open-checksum type="sha256">bbb222</open-checksum>
    <location href="repodata/aaa111-primary.xml.gz"/>
    <timestamp>1700000000</timestamp>
    <size>1234</size>
  </data>
  <data type="filelists">
    <checksum type="sha256">ccc333</checksum>
    <location href="repodata/ccc333-filelists.xml.gz"/>
  </data>
  <data type="group">
    <checksum type="sha256">ddd444</checksum>
    <location href="repodata/comps.xml"/>
  </data>
</repomd>
"#;

    #[test]
    fn test_parse_repomd() {
        let entries = parse_repomd(REPOMD_XML.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);

        let primary = find_entry(&entries, MetadataKind::Primary).unwrap();
        assert_eq!(primary.location, "repodata/aaa111-primary.xml.gz");
        assert_eq!(primary.checksum, "aaa111");
        assert_eq!(primary.checksum_type.as_deref(), Some("sha256"));
        assert_eq!(primary.open_checksum.as_deref(), Some("bbb222"));

        let filelists = find_entry(&entries, MetadataKind::Filelists).unwrap();
        assert_eq!(filelists.checksum, "ccc333");
        assert_eq!(filelists.open_checksum, None);

        assert_eq!(entries[2].kind(), None);
    }

    #[test]
    fn test_missing_entry() {
        let entries = parse_repomd(REPOMD_XML.as_bytes()).unwrap();
        let result = find_entry(&entries, MetadataKind::Other);
        assert!(matches!(result, Err(Error::MissingMetadata(_))));
    }
}
