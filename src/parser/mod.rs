// src/parser/mod.rs

//! Streaming decoders for RPM repodata documents
//!
//! This module provides event-driven decoders for the three package-level
//! repodata documents:
//! - primary.xml: package metadata, dependencies and primary files
//! - filelists.xml: complete file lists
//! - other.xml: changelogs
//!
//! quick-xml tokenizes the document; each decoder is a small state machine
//! fed with start/end/text events. A package is handed to the caller's
//! callback as soon as its `</package>` is seen and dropped right after, so
//! memory use is bounded by the largest single package, not the document.

pub mod filelists;
pub mod other;
pub mod primary;

use crate::compression::open_metadata;
use crate::error::{Error, Result};
use crate::package::Package;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, error, warn};

/// Which repodata document a decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Primary,
    Filelists,
    Other,
}

impl MetadataKind {
    pub const ALL: [MetadataKind; 3] = [
        MetadataKind::Primary,
        MetadataKind::Filelists,
        MetadataKind::Other,
    ];

    /// Name used for this document in repomd.xml
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKind::Primary => "primary",
            MetadataKind::Filelists => "filelists",
            MetadataKind::Other => "other",
        }
    }

    /// Parse a repomd.xml data type
    pub fn from_repomd_type(data_type: &str) -> Option<Self> {
        match data_type {
            "primary" => Some(MetadataKind::Primary),
            "filelists" => Some(MetadataKind::Filelists),
            "other" => Some(MetadataKind::Other),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Packages handed to the callback
    pub packages: usize,
    /// An unterminated trailing package was dropped
    pub incomplete: bool,
}

/// Ordered attribute list of the element being opened
///
/// Attribute counts are tiny, so lookups are a linear scan. When a key is
/// repeated, the last occurrence wins.
#[derive(Debug, Default)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.pairs.push((key.to_string(), value.to_string()));
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Value of the last attribute named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn fill(&mut self, start: &BytesStart<'_>) -> quick_xml::Result<()> {
        self.clear();
        let mut attributes = start.attributes();
        // Repeated keys are kept so that `get` can apply last-wins
        attributes.with_checks(false);
        for attr in attributes {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = attr.unescape_value()?;
            self.push(key, &value);
        }
        Ok(())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (key, value) in iter {
            attrs.push(key, value);
        }
        attrs
    }
}

/// Structural problems a decoder refuses to recover from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// `<package>` opened while another package was still open
    NestedPackage,
}

pub type HandlerResult = std::result::Result<(), ProtocolError>;

/// Receiver of tokenizer events
///
/// The driver owns the text buffer: it is cleared on every start tag, grows
/// with every text event and is cleared again after every end tag. `text`
/// passed to `end_element` is therefore only the character data seen since
/// the most recent start tag.
pub trait SaxHandler {
    fn start_element(&mut self, name: &str, attrs: &Attributes) -> HandlerResult;

    fn end_element(&mut self, name: &str, text: &str) -> HandlerResult;

    /// Called once the token stream is over, whether it ended cleanly or not
    fn finish(&mut self) -> DecodeSummary;
}

/// Feed every event of an XML document into `handler`
pub fn drive<R: BufRead, H: SaxHandler>(input: R, handler: &mut H) -> Result<()> {
    let mut reader = Reader::from_reader(input);
    reader.expand_empty_elements(true);

    let mut buf = Vec::new();
    let mut attrs = Attributes::new();
    let mut text = String::new();

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|source| xml_error(reader.buffer_position(), source))?;

        let outcome = match event {
            Event::Start(e) => {
                text.clear();
                attrs.fill(&e).map_err(|source| xml_error(position, source))?;
                let qname = e.name();
                let name = reader
                    .decoder()
                    .decode(qname.as_ref())
                    .map_err(|source| xml_error(position, source))?;
                handler.start_element(&name, &attrs)
            }
            Event::End(e) => {
                let qname = e.name();
                let name = reader
                    .decoder()
                    .decode(qname.as_ref())
                    .map_err(|source| xml_error(position, source))?;
                let outcome = handler.end_element(&name, &text);
                text.clear();
                outcome
            }
            Event::Text(e) => {
                let chunk = e.unescape().map_err(|source| xml_error(position, source))?;
                text.push_str(&chunk);
                Ok(())
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let chunk = reader
                    .decoder()
                    .decode(&raw)
                    .map_err(|source| xml_error(position, source))?;
                text.push_str(&chunk);
                Ok(())
            }
            Event::Eof => break,
            _ => Ok(()),
        };

        outcome.map_err(|violation| match violation {
            ProtocolError::NestedPackage => {
                error!("Nested <package> element at byte {}", position);
                Error::NestedPackage { position }
            }
        })?;

        buf.clear();
    }

    Ok(())
}

fn xml_error(position: usize, source: quick_xml::Error) -> Error {
    error!("XML error at byte {}: {}", position, source);
    Error::Xml { position, source }
}

/// Drive `handler` over `input` and let it clean up whatever happened
fn run<R: BufRead, H: SaxHandler>(input: R, mut handler: H) -> Result<DecodeSummary> {
    let outcome = drive(input, &mut handler);
    let summary = handler.finish();
    outcome.map(|()| summary)
}

/// Decode a primary.xml document
pub fn decode_primary<R, F>(input: R, callback: F) -> Result<DecodeSummary>
where
    R: BufRead,
    F: FnMut(&Package),
{
    run(input, primary::PrimaryDecoder::new(callback))
}

/// Decode a filelists.xml document
pub fn decode_filelists<R, F>(input: R, callback: F) -> Result<DecodeSummary>
where
    R: BufRead,
    F: FnMut(&Package),
{
    run(input, filelists::FilelistsDecoder::new(callback))
}

/// Decode an other.xml document
pub fn decode_other<R, F>(input: R, callback: F) -> Result<DecodeSummary>
where
    R: BufRead,
    F: FnMut(&Package),
{
    run(input, other::OtherDecoder::new(callback))
}

/// Decode a document of the given kind
pub fn decode<R, F>(kind: MetadataKind, input: R, callback: F) -> Result<DecodeSummary>
where
    R: BufRead,
    F: FnMut(&Package),
{
    match kind {
        MetadataKind::Primary => decode_primary(input, callback),
        MetadataKind::Filelists => decode_filelists(input, callback),
        MetadataKind::Other => decode_other(input, callback),
    }
}

/// Decode a (possibly compressed) metadata file
pub fn decode_file<P, F>(kind: MetadataKind, path: P, callback: F) -> Result<DecodeSummary>
where
    P: AsRef<Path>,
    F: FnMut(&Package),
{
    let path = path.as_ref();
    debug!("Decoding {} metadata from {}", kind, path.display());
    decode(kind, open_metadata(path)?, callback)
}

/// Package bookkeeping shared by all decoders
///
/// Holds the package currently being built and hands it to the callback
/// when it is complete.
pub(crate) struct Emitter<F> {
    callback: F,
    current: Option<Package>,
    emitted: usize,
}

impl<F: FnMut(&Package)> Emitter<F> {
    pub(crate) fn new(callback: F) -> Self {
        Self {
            callback,
            current: None,
            emitted: 0,
        }
    }

    /// Start a new package
    pub(crate) fn open(&mut self) -> std::result::Result<&mut Package, ProtocolError> {
        if self.current.is_some() {
            return Err(ProtocolError::NestedPackage);
        }
        Ok(self.current.insert(Package::new()))
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Package> {
        self.current.as_mut()
    }

    /// Hand the open package to the callback, then free it
    pub(crate) fn emit(&mut self) {
        if let Some(package) = self.current.take() {
            debug!("Decoded package {}", package.nevra());
            (self.callback)(&package);
            self.emitted += 1;
        }
    }

    /// Drop any unterminated package and report what was emitted
    pub(crate) fn finish(&mut self) -> DecodeSummary {
        let incomplete = match self.current.take() {
            Some(package) => {
                warn!("Incomplete package lost: {}", package.nevra());
                true
            }
            None => false,
        };

        DecodeSummary {
            packages: self.emitted,
            incomplete,
        }
    }
}

/// Read `<version epoch=".." ver=".." rel=".."/>` into the package
pub(crate) fn read_version(package: &mut Package, attrs: &Attributes) {
    if let Some(epoch) = attrs.get("epoch") {
        package.epoch = Some(package.intern(epoch));
    }
    if let Some(ver) = attrs.get("ver") {
        package.version = Some(package.intern(ver));
    }
    if let Some(rel) = attrs.get("rel") {
        package.release = Some(package.intern(rel));
    }
}

/// Read the `pkgid`, `name` and `arch` attributes of a `<package>` element
pub(crate) fn read_identity(package: &mut Package, attrs: &Attributes) {
    if let Some(pkgid) = attrs.get("pkgid") {
        package.pkg_id = Some(package.intern(pkgid));
    }
    if let Some(name) = attrs.get("name") {
        package.name = Some(package.intern(name));
    }
    if let Some(arch) = attrs.get("arch") {
        package.arch = Some(package.intern(arch));
    }
}
