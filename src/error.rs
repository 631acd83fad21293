// src/error.rs

use thiserror::Error;

/// Core error types for repocache
#[derive(Error, Debug)]
pub enum Error {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The XML tokenizer gave up on the document
    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    /// A `<package>` was opened while another one was still open
    #[error("Nested <package> element at byte {position}")]
    NestedPackage { position: usize },

    /// Metadata that decoded fine but is unusable (e.g. bad repomd.xml)
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// A metadata type was not listed in repomd.xml
    #[error("Metadata not found in repository: {0}")]
    MissingMetadata(String),
}

/// Result type alias using repocache's Error type
pub type Result<T> = std::result::Result<T, Error>;
