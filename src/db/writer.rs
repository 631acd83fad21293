// src/db/writer.rs

//! Writing decoded packages into a cache database
//!
//! Numeric-as-text fields are bound as text; the INTEGER column affinity
//! takes care of storing them as numbers.

use crate::error::Result;
use crate::package::{DependencyKind, Package};
use rusqlite::{Connection, params};
use std::collections::HashMap;

/// Insert the `packages` row of a primary.xml package and return its pkgKey
pub fn write_package(conn: &Connection, pkg: &Package) -> Result<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO packages (
            pkgId, name, arch, version, epoch, release, summary, description, url,
            time_file, time_build, rpm_license, rpm_vendor, rpm_group, rpm_buildhost,
            rpm_sourcerpm, rpm_header_start, rpm_header_end, rpm_packager,
            size_package, size_installed, size_archive, location_href, checksum_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                 ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
    )?;

    stmt.execute(params![
        pkg.pkg_id(),
        pkg.name(),
        pkg.arch(),
        pkg.version(),
        pkg.epoch(),
        pkg.release(),
        pkg.summary(),
        pkg.description(),
        pkg.url(),
        pkg.opt(pkg.time_file),
        pkg.opt(pkg.time_build),
        pkg.opt(pkg.rpm_license),
        pkg.opt(pkg.rpm_vendor),
        pkg.opt(pkg.rpm_group),
        pkg.opt(pkg.rpm_buildhost),
        pkg.opt(pkg.rpm_sourcerpm),
        pkg.opt(pkg.rpm_header_start),
        pkg.opt(pkg.rpm_header_end),
        pkg.packager(),
        pkg.opt(pkg.size_package),
        pkg.opt(pkg.size_installed),
        pkg.opt(pkg.size_archive),
        pkg.location_href(),
        pkg.checksum_type(),
    ])?;

    Ok(conn.last_insert_rowid())
}

/// Insert every dependency of every kind
pub fn write_dependencies(conn: &Connection, pkg_key: i64, pkg: &Package) -> Result<()> {
    for kind in DependencyKind::ALL {
        // Table names come from a closed set, never from the document
        let sql = format!(
            "INSERT INTO {} (name, flags, epoch, version, release, pkgKey) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            kind.as_str()
        );
        let mut stmt = conn.prepare_cached(&sql)?;

        for dep in pkg.dependencies(kind) {
            stmt.execute(params![dep.name, dep.flags, dep.epoch, dep.version, dep.release, pkg_key])?;
        }
    }
    Ok(())
}

/// Insert the primary file list, one row per file
pub fn write_files(conn: &Connection, pkg_key: i64, pkg: &Package) -> Result<()> {
    let mut stmt = conn.prepare_cached("INSERT INTO files (name, type, pkgKey) VALUES (?1, ?2, ?3)")?;

    for file in pkg.files() {
        stmt.execute(params![file.name, file.file_type, pkg_key])?;
    }
    Ok(())
}

/// Insert the `packages` row of filelists/other caches and return its pkgKey
pub fn write_package_id(conn: &Connection, pkg: &Package) -> Result<i64> {
    let mut stmt = conn.prepare_cached("INSERT INTO packages (pkgId) VALUES (?1)")?;
    stmt.execute([pkg.pkg_id()])?;
    Ok(conn.last_insert_rowid())
}

/// Files of one directory, encoded for the `filelist` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dirname: String,
    /// Base names joined with `/`
    pub filenames: String,
    /// One character per file: `f`ile, `d`irectory or `g`host
    pub filetypes: String,
}

/// Group a package's files by directory, keeping first-seen order
pub fn encode_filelist(pkg: &Package) -> Vec<DirectoryEntry> {
    let mut entries: Vec<DirectoryEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for file in pkg.files() {
        let (dirname, basename) = split_path(file.name);
        let type_code = match file.file_type {
            "dir" => 'd',
            "ghost" => 'g',
            _ => 'f',
        };

        let slot = *index.entry(dirname).or_insert_with(|| {
            entries.push(DirectoryEntry {
                dirname: dirname.to_string(),
                filenames: String::new(),
                filetypes: String::new(),
            });
            entries.len() - 1
        });

        let entry = &mut entries[slot];
        if !entry.filetypes.is_empty() {
            entry.filenames.push('/');
        }
        entry.filenames.push_str(basename);
        entry.filetypes.push(type_code);
    }

    entries
}

fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => (".", path),
    }
}

/// Insert the directory-grouped file list
pub fn write_filelist(conn: &Connection, pkg_key: i64, pkg: &Package) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO filelist (pkgKey, dirname, filenames, filetypes) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for entry in encode_filelist(pkg) {
        stmt.execute(params![pkg_key, entry.dirname, entry.filenames, entry.filetypes])?;
    }
    Ok(())
}

/// Insert changelog entries
pub fn write_changelogs(conn: &Connection, pkg_key: i64, pkg: &Package) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO changelog (pkgKey, author, date, changelog) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for entry in pkg.changelogs() {
        stmt.execute(params![pkg_key, entry.author, entry.date, entry.changelog])?;
    }
    Ok(())
}

/// Delete a package; triggers remove its dependent rows
pub fn remove_package(conn: &Connection, pkg_key: i64) -> Result<()> {
    let mut stmt = conn.prepare_cached("DELETE FROM packages WHERE pkgKey = ?1")?;
    stmt.execute([pkg_key])?;
    Ok(())
}
