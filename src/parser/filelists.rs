// src/parser/filelists.rs

//! filelists.xml decoder
//!
//! Package identity comes entirely from the attributes of `<package>`; the
//! body only carries `<version>` and the complete list of `<file>` elements.

use super::{read_identity, read_version, Attributes, DecodeSummary, Emitter, HandlerResult, SaxHandler};
use crate::arena::ArenaStr;
use crate::package::{Package, PackageFile, DEFAULT_FILE_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Toplevel,
    Package,
}

/// `<file>` seen but not yet closed
#[derive(Debug, Clone, Copy)]
struct PendingFile {
    file_type: Option<ArenaStr>,
}

pub(crate) struct FilelistsDecoder<F> {
    state: State,
    out: Emitter<F>,
    file: Option<PendingFile>,
}

impl<F: FnMut(&Package)> FilelistsDecoder<F> {
    pub(crate) fn new(callback: F) -> Self {
        Self {
            state: State::Toplevel,
            out: Emitter::new(callback),
            file: None,
        }
    }
}

impl<F: FnMut(&Package)> SaxHandler for FilelistsDecoder<F> {
    fn start_element(&mut self, name: &str, attrs: &Attributes) -> HandlerResult {
        if name == "package" {
            let pkg = self.out.open()?;
            read_identity(pkg, attrs);
            self.state = State::Package;
            return Ok(());
        }

        if self.state != State::Package {
            return Ok(());
        }
        let Some(pkg) = self.out.current_mut() else {
            return Ok(());
        };

        match name {
            "version" => read_version(pkg, attrs),
            "file" => {
                self.file = Some(PendingFile {
                    file_type: attrs.get("type").map(|t| pkg.intern(t)),
                });
            }
            _ => {}
        }

        Ok(())
    }

    fn end_element(&mut self, name: &str, text: &str) -> HandlerResult {
        if self.state != State::Package {
            return Ok(());
        }

        match name {
            "package" => {
                self.out.emit();
                self.file = None;
                self.state = State::Toplevel;
            }
            "file" => {
                if let Some(pkg) = self.out.current_mut() {
                    let pending = self.file.take();
                    let name = pkg.intern(text);
                    let file_type = match pending.and_then(|f| f.file_type) {
                        Some(t) => t,
                        None => pkg.intern(DEFAULT_FILE_TYPE),
                    };
                    pkg.push_file(PackageFile { name, file_type });
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn finish(&mut self) -> DecodeSummary {
        self.file = None;
        self.state = State::Toplevel;
        self.out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::decode_filelists;

    const FILELISTS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<filelists xmlns="http://linux.duke.edu/metadata/filelists" packages="2">
<package pkgid="abc123" name="foo" arch="x86_64">
  <version epoch="0" ver="1.2" rel="3"/>
  <file>/usr/bin/foo</file>
  <file type="dir">/usr/share/foo</file>
  <file type="ghost">/var/log/foo.log</file>
</package>
<package pkgid="def456" name="bar" arch="noarch">
  <version epoch="1" ver="2.0" rel="1"/>
</package>
</filelists>
"#;

    type Listing = (String, Vec<(String, String)>);

    fn collect(xml: &str) -> (crate::error::Result<DecodeSummary>, Vec<Listing>) {
        let mut seen = Vec::new();
        let result = decode_filelists(xml.as_bytes(), |pkg| {
            let files = pkg
                .files()
                .map(|f| (f.name.to_string(), f.file_type.to_string()))
                .collect();
            seen.push((pkg.nevra(), files));
        });
        (result, seen)
    }

    #[test]
    fn test_identity_from_attributes() {
        let mut ids = Vec::new();
        decode_filelists(FILELISTS_XML.as_bytes(), |pkg| {
            ids.push((
                pkg.pkg_id().unwrap().to_string(),
                pkg.name().unwrap().to_string(),
                pkg.arch().unwrap().to_string(),
            ));
        })
        .unwrap();

        assert_eq!(
            ids,
            vec![
                ("abc123".to_string(), "foo".to_string(), "x86_64".to_string()),
                ("def456".to_string(), "bar".to_string(), "noarch".to_string()),
            ]
        );
    }

    #[test]
    fn test_file_list_and_types() {
        let (result, seen) = collect(FILELISTS_XML);
        assert_eq!(result.unwrap().packages, 2);

        assert_eq!(seen[0].0, "foo-1.2-3.x86_64");
        assert_eq!(
            seen[0].1,
            vec![
                ("/usr/bin/foo".to_string(), "file".to_string()),
                ("/usr/share/foo".to_string(), "dir".to_string()),
                ("/var/log/foo.log".to_string(), "ghost".to_string()),
            ]
        );
        assert_eq!(seen[1].0, "bar-1:2.0-1.noarch");
        assert!(seen[1].1.is_empty());
    }

    #[test]
    fn test_file_type_does_not_leak_between_files() {
        let xml = r#"<filelists><package pkgid="x" name="x" arch="noarch">
            <file type="dir">/a</file><file>/a/b</file>
        </package></filelists>"#;
        let (_, seen) = collect(xml);
        assert_eq!(seen[0].1[1], ("/a/b".to_string(), "file".to_string()));
    }

    #[test]
    fn test_abandoned_file_is_discarded() {
        let attrs = Attributes::new();
        let typed: Attributes = [("type", "dir")].into_iter().collect();
        let mut names = Vec::new();

        let mut decoder = FilelistsDecoder::new(|pkg: &Package| {
            names.push(pkg.files().map(|f| f.name.to_string()).collect::<Vec<_>>());
        });
        decoder.start_element("package", &attrs).unwrap();
        decoder.start_element("file", &typed).unwrap();
        decoder.end_element("package", "").unwrap();

        // The pending file of the first package must not reach the second
        decoder.start_element("package", &attrs).unwrap();
        decoder.end_element("file", "/orphan").unwrap();
        decoder.end_element("package", "").unwrap();
        assert_eq!(decoder.finish().packages, 2);
        drop(decoder);

        assert_eq!(names, vec![Vec::<String>::new(), vec!["/orphan".to_string()]]);
    }

    #[test]
    fn test_truncated_document() {
        let cut = FILELISTS_XML.rfind("</package>").unwrap();
        let (result, seen) = collect(&FILELISTS_XML[..cut]);
        assert_eq!(result.unwrap(), DecodeSummary { packages: 1, incomplete: true });
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_nested_package() {
        let xml = r#"<filelists><package name="a"><package name="b"/></package></filelists>"#;
        let (result, seen) = collect(xml);
        assert!(matches!(result, Err(Error::NestedPackage { .. })));
        assert!(seen.is_empty());
    }
}
