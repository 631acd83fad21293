// src/compression.rs

//! Opening repodata files
//!
//! Repositories publish their metadata compressed; the format is detected
//! from the file extension.

use crate::error::Result;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;
use xz2::read::XzDecoder;

/// Compression applied to a metadata file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression from a file name
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("xz") => Compression::Xz,
            Some("zst") => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Open a metadata file, transparently decompressing it
pub fn open_metadata(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let compression = Compression::from_path(path);
    debug!("Opening {} ({:?})", path.display(), compression);

    let reader: Box<dyn BufRead> = match compression {
        Compression::Gzip => Box::new(BufReader::new(GzDecoder::new(file))),
        Compression::Xz => Box::new(BufReader::new(XzDecoder::new(file))),
        Compression::Zstd => Box::new(BufReader::new(zstd::stream::read::Decoder::new(file)?)),
        Compression::None => Box::new(BufReader::new(file)),
    };

    Ok(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::{Read, Write};

    #[test]
    fn test_detect_compression() {
        assert_eq!(Compression::from_path(Path::new("primary.xml.gz")), Compression::Gzip);
        assert_eq!(Compression::from_path(Path::new("other.xml.xz")), Compression::Xz);
        assert_eq!(Compression::from_path(Path::new("filelists.xml.zst")), Compression::Zstd);
        assert_eq!(Compression::from_path(Path::new("repomd.xml")), Compression::None);
    }

    #[test]
    fn test_open_gzip_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("primary.xml.gz");

        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"<metadata/>").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let mut content = String::new();
        open_metadata(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "<metadata/>");
    }

    #[test]
    fn test_open_zstd_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.xml.zst");
        std::fs::write(&path, zstd::encode_all(&b"<otherdata/>"[..], 0).unwrap()).unwrap();

        let mut content = String::new();
        open_metadata(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "<otherdata/>");
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_metadata(Path::new("/nonexistent/primary.xml"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
