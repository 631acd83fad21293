// src/package.rs

//! Package records produced by the repodata decoders
//!
//! A [`Package`] owns a [`StringArena`] holding every string it refers to.
//! Numeric fields (sizes, times, header offsets) are kept exactly as they
//! appear in the document; parsing them is left to consumers.

use crate::arena::{ArenaStr, StringArena};
use serde::Serialize;

/// Type recorded for a `<file>` element without a `type` attribute
pub const DEFAULT_FILE_TYPE: &str = "file";

/// Kind of dependency relation listed under `<format>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Provides,
    Requires,
    Obsoletes,
    Conflicts,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 4] = [
        DependencyKind::Provides,
        DependencyKind::Requires,
        DependencyKind::Obsoletes,
        DependencyKind::Conflicts,
    ];

    /// Map a `<format>` child tag to its dependency kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "rpm:provides" => Some(DependencyKind::Provides),
            "rpm:requires" => Some(DependencyKind::Requires),
            "rpm:obsoletes" => Some(DependencyKind::Obsoletes),
            "rpm:conflicts" => Some(DependencyKind::Conflicts),
            _ => None,
        }
    }

    /// Cache table holding this kind of dependency
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Provides => "provides",
            DependencyKind::Requires => "requires",
            DependencyKind::Obsoletes => "obsoletes",
            DependencyKind::Conflicts => "conflicts",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A single `<rpm:entry>` of a dependency list
#[derive(Debug, Clone, Copy)]
pub struct Dependency {
    pub name: ArenaStr,
    pub flags: Option<ArenaStr>,
    pub epoch: Option<ArenaStr>,
    pub version: Option<ArenaStr>,
    pub release: Option<ArenaStr>,
}

/// A file owned by a package
#[derive(Debug, Clone, Copy)]
pub struct PackageFile {
    pub name: ArenaStr,
    pub file_type: ArenaStr,
}

/// One `<changelog>` entry
#[derive(Debug, Clone, Copy)]
pub struct ChangelogEntry {
    pub author: Option<ArenaStr>,
    pub date: Option<ArenaStr>,
    pub changelog: ArenaStr,
}

/// Borrowed view of a [`Dependency`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DependencyRef<'a> {
    pub name: &'a str,
    pub flags: Option<&'a str>,
    pub epoch: Option<&'a str>,
    pub version: Option<&'a str>,
    pub release: Option<&'a str>,
}

/// Borrowed view of a [`PackageFile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileRef<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub file_type: &'a str,
}

/// Borrowed view of a [`ChangelogEntry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangelogRef<'a> {
    pub author: Option<&'a str>,
    pub date: Option<&'a str>,
    pub changelog: &'a str,
}

/// One package as described by a repodata document
///
/// Which fields are populated depends on the document: primary fills the
/// metadata and dependencies, filelists the identity and files, other the
/// identity and changelogs.
#[derive(Debug, Default)]
pub struct Package {
    arena: StringArena,

    pub pkg_id: Option<ArenaStr>,
    pub name: Option<ArenaStr>,
    pub arch: Option<ArenaStr>,
    pub epoch: Option<ArenaStr>,
    pub version: Option<ArenaStr>,
    pub release: Option<ArenaStr>,

    pub checksum_type: Option<ArenaStr>,
    pub checksum_value: Option<ArenaStr>,

    pub summary: Option<ArenaStr>,
    pub description: Option<ArenaStr>,
    pub url: Option<ArenaStr>,
    pub packager: Option<ArenaStr>,
    pub location_href: Option<ArenaStr>,

    pub time_file: Option<ArenaStr>,
    pub time_build: Option<ArenaStr>,
    pub size_package: Option<ArenaStr>,
    pub size_installed: Option<ArenaStr>,
    pub size_archive: Option<ArenaStr>,

    pub rpm_license: Option<ArenaStr>,
    pub rpm_vendor: Option<ArenaStr>,
    pub rpm_group: Option<ArenaStr>,
    pub rpm_buildhost: Option<ArenaStr>,
    pub rpm_sourcerpm: Option<ArenaStr>,
    pub rpm_header_start: Option<ArenaStr>,
    pub rpm_header_end: Option<ArenaStr>,

    dependencies: [Vec<Dependency>; 4],
    files: Vec<PackageFile>,
    changelogs: Vec<ChangelogEntry>,
}

impl Package {
    /// Create an empty package with a fresh arena
    pub fn new() -> Self {
        Self {
            arena: StringArena::with_capacity(1024),
            ..Self::default()
        }
    }

    /// Copy `s` into this package's arena
    pub fn intern(&mut self, s: &str) -> ArenaStr {
        self.arena.alloc(s)
    }

    /// Resolve a handle belonging to this package
    pub fn str(&self, s: ArenaStr) -> &str {
        self.arena.get(s)
    }

    /// Resolve an optional handle belonging to this package
    pub fn opt(&self, s: Option<ArenaStr>) -> Option<&str> {
        s.map(|s| self.arena.get(s))
    }

    /// Bytes of text owned by this package
    pub fn text_size(&self) -> usize {
        self.arena.len()
    }

    pub fn pkg_id(&self) -> Option<&str> {
        self.opt(self.pkg_id)
    }

    pub fn name(&self) -> Option<&str> {
        self.opt(self.name)
    }

    pub fn arch(&self) -> Option<&str> {
        self.opt(self.arch)
    }

    pub fn epoch(&self) -> Option<&str> {
        self.opt(self.epoch)
    }

    pub fn version(&self) -> Option<&str> {
        self.opt(self.version)
    }

    pub fn release(&self) -> Option<&str> {
        self.opt(self.release)
    }

    pub fn checksum_type(&self) -> Option<&str> {
        self.opt(self.checksum_type)
    }

    pub fn checksum_value(&self) -> Option<&str> {
        self.opt(self.checksum_value)
    }

    pub fn summary(&self) -> Option<&str> {
        self.opt(self.summary)
    }

    pub fn description(&self) -> Option<&str> {
        self.opt(self.description)
    }

    pub fn url(&self) -> Option<&str> {
        self.opt(self.url)
    }

    pub fn packager(&self) -> Option<&str> {
        self.opt(self.packager)
    }

    pub fn location_href(&self) -> Option<&str> {
        self.opt(self.location_href)
    }

    /// Append a dependency of the given kind
    pub fn push_dependency(&mut self, kind: DependencyKind, dep: Dependency) {
        self.dependencies[kind.index()].push(dep);
    }

    pub fn push_file(&mut self, file: PackageFile) {
        self.files.push(file);
    }

    pub fn push_changelog(&mut self, entry: ChangelogEntry) {
        self.changelogs.push(entry);
    }

    /// Number of dependencies of the given kind
    pub fn dependency_count(&self, kind: DependencyKind) -> usize {
        self.dependencies[kind.index()].len()
    }

    /// Dependencies of the given kind in document order
    pub fn dependencies(&self, kind: DependencyKind) -> impl ExactSizeIterator<Item = DependencyRef<'_>> {
        self.dependencies[kind.index()].iter().map(|dep| DependencyRef {
            name: self.str(dep.name),
            flags: self.opt(dep.flags),
            epoch: self.opt(dep.epoch),
            version: self.opt(dep.version),
            release: self.opt(dep.release),
        })
    }

    /// Files in document order
    pub fn files(&self) -> impl ExactSizeIterator<Item = FileRef<'_>> {
        self.files.iter().map(|file| FileRef {
            name: self.str(file.name),
            file_type: self.str(file.file_type),
        })
    }

    /// Changelog entries in document order
    pub fn changelogs(&self) -> impl ExactSizeIterator<Item = ChangelogRef<'_>> {
        self.changelogs.iter().map(|entry| ChangelogRef {
            author: self.opt(entry.author),
            date: self.opt(entry.date),
            changelog: self.str(entry.changelog),
        })
    }

    /// `name-[epoch:]version-release.arch`, with `?` for missing parts
    pub fn nevra(&self) -> String {
        let name = self.name().unwrap_or("?");
        let version = self.version().unwrap_or("?");
        let release = self.release().unwrap_or("?");
        let arch = self.arch().unwrap_or("?");

        match self.epoch() {
            Some(epoch) if !epoch.is_empty() && epoch != "0" => {
                format!("{}-{}:{}-{}.{}", name, epoch, version, release, arch)
            }
            _ => format!("{}-{}-{}.{}", name, version, release, arch),
        }
    }

    /// Serializable snapshot borrowing from this package
    pub fn view(&self) -> PackageView<'_> {
        PackageView {
            pkgid: self.pkg_id(),
            name: self.name(),
            arch: self.arch(),
            epoch: self.epoch(),
            version: self.version(),
            release: self.release(),
            checksum_type: self.checksum_type(),
            checksum: self.checksum_value(),
            summary: self.summary(),
            description: self.description(),
            url: self.url(),
            packager: self.packager(),
            location_href: self.location_href(),
            time_file: self.opt(self.time_file),
            time_build: self.opt(self.time_build),
            size_package: self.opt(self.size_package),
            size_installed: self.opt(self.size_installed),
            size_archive: self.opt(self.size_archive),
            rpm_license: self.opt(self.rpm_license),
            rpm_vendor: self.opt(self.rpm_vendor),
            rpm_group: self.opt(self.rpm_group),
            rpm_buildhost: self.opt(self.rpm_buildhost),
            rpm_sourcerpm: self.opt(self.rpm_sourcerpm),
            rpm_header_start: self.opt(self.rpm_header_start),
            rpm_header_end: self.opt(self.rpm_header_end),
            provides: self.dependencies(DependencyKind::Provides).collect(),
            requires: self.dependencies(DependencyKind::Requires).collect(),
            obsoletes: self.dependencies(DependencyKind::Obsoletes).collect(),
            conflicts: self.dependencies(DependencyKind::Conflicts).collect(),
            files: self.files().collect(),
            changelogs: self.changelogs().collect(),
        }
    }
}

/// Borrowed, serializable form of a [`Package`]
#[derive(Debug, Serialize)]
pub struct PackageView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkgid: Option<&'a str>,
    pub name: Option<&'a str>,
    pub arch: Option<&'a str>,
    pub epoch: Option<&'a str>,
    pub version: Option<&'a str>,
    pub release: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packager: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_href: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_build: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_package: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_installed: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_archive: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpm_license: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpm_vendor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpm_group: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpm_buildhost: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpm_sourcerpm: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpm_header_start: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpm_header_end: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<DependencyRef<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<DependencyRef<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub obsoletes: Vec<DependencyRef<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<DependencyRef<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileRef<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changelogs: Vec<ChangelogRef<'a>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_package() -> Package {
        let mut pkg = Package::new();
        pkg.name = Some(pkg.intern("bash"));
        pkg.arch = Some(pkg.intern("x86_64"));
        pkg.epoch = Some(pkg.intern("0"));
        pkg.version = Some(pkg.intern("5.2.26"));
        pkg.release = Some(pkg.intern("3.fc40"));
        pkg
    }

    #[test]
    fn test_identity_accessors() {
        let pkg = sample_package();
        assert_eq!(pkg.name(), Some("bash"));
        assert_eq!(pkg.version(), Some("5.2.26"));
        assert_eq!(pkg.summary(), None);
        assert_eq!(pkg.nevra(), "bash-5.2.26-3.fc40.x86_64");
    }

    #[test]
    fn test_nevra_with_epoch() {
        let mut pkg = sample_package();
        pkg.epoch = Some(pkg.intern("2"));
        assert_eq!(pkg.nevra(), "bash-2:5.2.26-3.fc40.x86_64");
    }

    #[test]
    fn test_dependencies_keep_insertion_order() {
        let mut pkg = sample_package();
        for name in ["libc.so.6", "libtinfo.so.6"] {
            let dep = Dependency {
                name: pkg.intern(name),
                flags: None,
                epoch: None,
                version: None,
                release: None,
            };
            pkg.push_dependency(DependencyKind::Requires, dep);
        }

        let names: Vec<_> = pkg.dependencies(DependencyKind::Requires).map(|d| d.name).collect();
        assert_eq!(names, vec!["libc.so.6", "libtinfo.so.6"]);
        assert_eq!(pkg.dependency_count(DependencyKind::Provides), 0);
    }

    #[test]
    fn test_dependency_kind_tags() {
        assert_eq!(DependencyKind::from_tag("rpm:obsoletes"), Some(DependencyKind::Obsoletes));
        assert_eq!(DependencyKind::from_tag("rpm:entry"), None);
        assert_eq!(DependencyKind::Conflicts.as_str(), "conflicts");
    }

    #[test]
    fn test_view_serializes_files() {
        let mut pkg = sample_package();
        let file = PackageFile {
            name: pkg.intern("/usr/bin/bash"),
            file_type: pkg.intern(DEFAULT_FILE_TYPE),
        };
        pkg.push_file(file);

        let json = serde_json::to_value(pkg.view()).unwrap();
        assert_eq!(json["name"], "bash");
        assert_eq!(json["files"][0]["name"], "/usr/bin/bash");
        assert_eq!(json["files"][0]["type"], "file");
        assert!(json.get("requires").is_none());
    }
}
