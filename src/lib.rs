// src/lib.rs

//! Repocache
//!
//! Streaming decoders for RPM repository metadata and the SQLite caches
//! built from them.
//!
//! # Architecture
//!
//! - Streaming: primary.xml, filelists.xml and other.xml are decoded one
//!   package at a time; each package is handed to a callback and freed
//! - Arena records: every string of a package lives in one buffer owned by
//!   the package, so a record is freed in a single step
//! - Incremental caches: a cache is only touched when the metadata checksum
//!   changes, and then only new packages are written

pub mod arena;
pub mod cache;
pub mod compression;
pub mod db;
mod error;
pub mod package;
pub mod parser;
pub mod repomd;

pub use error::{Error, Result};
pub use package::{DependencyKind, Package};
pub use parser::{
    decode, decode_file, decode_filelists, decode_other, decode_primary, DecodeSummary,
    MetadataKind,
};
