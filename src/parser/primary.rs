// src/parser/primary.rs

//! primary.xml decoder
//!
//! States nest as the document does:
//! `Toplevel -> Package -> Format -> Dependencies(kind)`.
//! Identity and descriptive fields come from leaf elements of `<package>`,
//! RPM header fields, dependency lists and the primary file list from
//! `<format>`.

use super::{read_version, Attributes, DecodeSummary, Emitter, HandlerResult, SaxHandler};
use crate::arena::ArenaStr;
use crate::package::{Dependency, DependencyKind, Package, PackageFile, DEFAULT_FILE_TYPE};
use tracing::warn;

/// Dependencies whose name starts with this describe rpm features, not packages
pub const RESERVED_CAPABILITY_PREFIX: &str = "rpmlib(";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Toplevel,
    Package,
    Format,
    Dependencies(DependencyKind),
}

pub(crate) struct PrimaryDecoder<F> {
    state: State,
    out: Emitter<F>,
    /// `type` attribute of the `<file>` element being read
    file_type: Option<ArenaStr>,
}

impl<F: FnMut(&Package)> PrimaryDecoder<F> {
    pub(crate) fn new(callback: F) -> Self {
        Self {
            state: State::Toplevel,
            out: Emitter::new(callback),
            file_type: None,
        }
    }
}

impl<F: FnMut(&Package)> SaxHandler for PrimaryDecoder<F> {
    fn start_element(&mut self, name: &str, attrs: &Attributes) -> HandlerResult {
        if name == "package" {
            self.out.open()?;
            self.file_type = None;
            self.state = State::Package;
            return Ok(());
        }

        let Some(pkg) = self.out.current_mut() else {
            return Ok(());
        };

        match self.state {
            State::Toplevel => {}
            State::Package => {
                if let Some(next) = package_start(pkg, name, attrs) {
                    self.state = next;
                }
            }
            State::Format => {
                if let Some(next) = format_start(pkg, &mut self.file_type, name, attrs) {
                    self.state = next;
                }
            }
            State::Dependencies(kind) => dependency_start(pkg, kind, name, attrs),
        }

        Ok(())
    }

    fn end_element(&mut self, name: &str, text: &str) -> HandlerResult {
        match self.state {
            State::Toplevel => {}
            State::Package if name == "package" => {
                self.out.emit();
                self.file_type = None;
                self.state = State::Toplevel;
            }
            State::Package => {
                if let Some(pkg) = self.out.current_mut() {
                    package_end(pkg, name, text);
                }
            }
            State::Format if name == "format" => self.state = State::Package,
            State::Format => {
                if let Some(pkg) = self.out.current_mut() {
                    format_end(pkg, &mut self.file_type, name, text);
                }
            }
            State::Dependencies(_) => {
                if name != "rpm:entry" {
                    self.state = State::Format;
                }
            }
        }

        Ok(())
    }

    fn finish(&mut self) -> DecodeSummary {
        self.file_type = None;
        self.state = State::Toplevel;
        self.out.finish()
    }
}

fn package_start(pkg: &mut Package, name: &str, attrs: &Attributes) -> Option<State> {
    match name {
        "format" => return Some(State::Format),
        "version" => read_version(pkg, attrs),
        "checksum" => {
            if let Some(kind) = attrs.get("type") {
                pkg.checksum_type = Some(pkg.intern(kind));
            }
        }
        "time" => {
            if let Some(file) = attrs.get("file") {
                pkg.time_file = Some(pkg.intern(file));
            }
            if let Some(build) = attrs.get("build") {
                pkg.time_build = Some(pkg.intern(build));
            }
        }
        "size" => {
            if let Some(package) = attrs.get("package") {
                pkg.size_package = Some(pkg.intern(package));
            }
            if let Some(installed) = attrs.get("installed") {
                pkg.size_installed = Some(pkg.intern(installed));
            }
            if let Some(archive) = attrs.get("archive") {
                pkg.size_archive = Some(pkg.intern(archive));
            }
        }
        "location" => {
            if let Some(href) = attrs.get("href") {
                pkg.location_href = Some(pkg.intern(href));
            }
        }
        _ => {}
    }
    None
}

fn package_end(pkg: &mut Package, name: &str, text: &str) {
    // Leaf elements with no text carry nothing worth keeping
    if text.is_empty() {
        return;
    }

    let value = match name {
        "name" | "arch" | "checksum" | "summary" | "description" | "packager" | "url" => pkg.intern(text),
        _ => return,
    };

    match name {
        "name" => pkg.name = Some(value),
        "arch" => pkg.arch = Some(value),
        "checksum" => {
            pkg.checksum_value = Some(value);
            pkg.pkg_id = Some(value);
        }
        "summary" => pkg.summary = Some(value),
        "description" => pkg.description = Some(value),
        "packager" => pkg.packager = Some(value),
        "url" => pkg.url = Some(value),
        _ => {}
    }
}

fn format_start(
    pkg: &mut Package,
    file_type: &mut Option<ArenaStr>,
    name: &str,
    attrs: &Attributes,
) -> Option<State> {
    if let Some(kind) = DependencyKind::from_tag(name) {
        return Some(State::Dependencies(kind));
    }

    match name {
        "rpm:header-range" => {
            if let Some(start) = attrs.get("start") {
                pkg.rpm_header_start = Some(pkg.intern(start));
            }
            if let Some(end) = attrs.get("end") {
                pkg.rpm_header_end = Some(pkg.intern(end));
            }
        }
        "file" => *file_type = attrs.get("type").map(|t| pkg.intern(t)),
        _ => {}
    }
    None
}

fn format_end(pkg: &mut Package, file_type: &mut Option<ArenaStr>, name: &str, text: &str) {
    match name {
        "rpm:license" => pkg.rpm_license = Some(pkg.intern(text)),
        "rpm:vendor" => pkg.rpm_vendor = Some(pkg.intern(text)),
        "rpm:group" => pkg.rpm_group = Some(pkg.intern(text)),
        "rpm:buildhost" => pkg.rpm_buildhost = Some(pkg.intern(text)),
        "rpm:sourcerpm" => pkg.rpm_sourcerpm = Some(pkg.intern(text)),
        "file" => {
            let name = pkg.intern(text);
            let file_type = match file_type.take() {
                Some(t) => t,
                None => pkg.intern(DEFAULT_FILE_TYPE),
            };
            pkg.push_file(PackageFile { name, file_type });
        }
        _ => {}
    }
}

fn dependency_start(pkg: &mut Package, kind: DependencyKind, name: &str, attrs: &Attributes) {
    if name != "rpm:entry" {
        return;
    }

    let Some(dep_name) = attrs.get("name") else {
        warn!("Skipping nameless {} entry in {}", kind.as_str(), pkg.nevra());
        return;
    };

    if dep_name.starts_with(RESERVED_CAPABILITY_PREFIX) {
        return;
    }

    let dep = Dependency {
        name: pkg.intern(dep_name),
        flags: attrs.get("flags").map(|v| pkg.intern(v)),
        epoch: attrs.get("epoch").map(|v| pkg.intern(v)),
        version: attrs.get("ver").map(|v| pkg.intern(v)),
        release: attrs.get("rel").map(|v| pkg.intern(v)),
    };
    pkg.push_dependency(kind, dep);
}
