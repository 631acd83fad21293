// src/cache.rs

//! Incremental SQLite cache updates
//!
//! A cache is rebuilt only when the checksum of its metadata changed. Even
//! then, packages already present (same pkgId) are kept as they are: only
//! new packages are written and vanished ones deleted.

use crate::db::{self, schema, writer};
use crate::error::{Error, Result};
use crate::package::Package;
use crate::parser::{self, DecodeSummary, MetadataKind};
use crate::repomd;
use rayon::prelude::*;
use rusqlite::Connection;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What an update did to a cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub added: usize,
    pub removed: usize,
    /// The cache already matched the checksum and was left alone
    pub fresh: bool,
    pub decode: DecodeSummary,
}

/// Update the cache of a primary.xml file
pub fn update_primary(md_path: &Path, checksum: &str) -> Result<PathBuf> {
    update(MetadataKind::Primary, md_path, checksum)
}

/// Update the cache of a filelists.xml file
pub fn update_filelists(md_path: &Path, checksum: &str) -> Result<PathBuf> {
    update(MetadataKind::Filelists, md_path, checksum)
}

/// Update the cache of an other.xml file
pub fn update_other(md_path: &Path, checksum: &str) -> Result<PathBuf> {
    update(MetadataKind::Other, md_path, checksum)
}

/// Update the cache of a metadata file and return the database path
pub fn update(kind: MetadataKind, md_path: &Path, checksum: &str) -> Result<PathBuf> {
    let db_path = db::cache_path(md_path);
    let mut conn = db::open(&db_path)?;
    update_connection(&mut conn, kind, md_path, checksum)?;
    Ok(db_path)
}

/// Update an already opened cache database from a metadata file
pub fn update_connection(
    conn: &mut Connection,
    kind: MetadataKind,
    md_path: &Path,
    checksum: &str,
) -> Result<UpdateStats> {
    if db::dbinfo_fresh(conn, checksum)? {
        debug!("{} cache for {} is up to date", kind, md_path.display());
        return Ok(UpdateStats {
            fresh: true,
            ..UpdateStats::default()
        });
    }

    let started = Instant::now();

    let stats = db::transaction(conn, |tx| {
        schema::create_tables(tx, kind)?;
        db::dbinfo_clear(tx)?;

        let existing = db::read_package_ids(tx)?;
        let mut seen: HashSet<String> = HashSet::with_capacity(existing.len());
        let mut added = 0;
        let mut failure: Option<Error> = None;

        let decode = parser::decode_file(kind, md_path, |pkg| {
            if failure.is_some() {
                return;
            }

            let Some(pkg_id) = pkg.pkg_id() else {
                warn!("Skipping package without pkgId: {}", pkg.nevra());
                return;
            };

            seen.insert(pkg_id.to_string());
            if existing.contains_key(pkg_id) {
                return;
            }

            match write_package(tx, kind, pkg) {
                Ok(()) => added += 1,
                Err(e) => failure = Some(e),
            }
        })?;

        if let Some(e) = failure {
            return Err(e);
        }

        let mut removed = 0;
        for (pkg_id, pkg_key) in &existing {
            if !seen.contains(pkg_id) {
                writer::remove_package(tx, *pkg_key)?;
                removed += 1;
            }
        }

        db::dbinfo_update(tx, checksum)?;

        Ok(UpdateStats {
            added,
            removed,
            fresh: false,
            decode,
        })
    })?;

    info!(
        "{}: added {} new packages, deleted {} old in {:.2} seconds",
        kind,
        stats.added,
        stats.removed,
        started.elapsed().as_secs_f64()
    );

    Ok(stats)
}

fn write_package(conn: &Connection, kind: MetadataKind, pkg: &Package) -> Result<()> {
    match kind {
        MetadataKind::Primary => {
            let key = writer::write_package(conn, pkg)?;
            writer::write_dependencies(conn, key, pkg)?;
            writer::write_files(conn, key, pkg)?;
        }
        MetadataKind::Filelists => {
            let key = writer::write_package_id(conn, pkg)?;
            writer::write_filelist(conn, key, pkg)?;
        }
        MetadataKind::Other => {
            let key = writer::write_package_id(conn, pkg)?;
            writer::write_changelogs(conn, key, pkg)?;
        }
    }
    Ok(())
}

/// Update all three caches of a repository
///
/// `repo_root` is the directory holding `repodata/repomd.xml`. The three
/// documents are independent, so each is decoded on its own rayon worker.
pub fn update_repository(repo_root: &Path) -> Result<Vec<(MetadataKind, PathBuf)>> {
    let repomd_path = repo_root.join("repodata").join("repomd.xml");
    info!("Reading repository index {}", repomd_path.display());

    let entries = repomd::parse_repomd(BufReader::new(File::open(&repomd_path)?))?;

    let jobs = MetadataKind::ALL
        .iter()
        .map(|&kind| {
            let entry = repomd::find_entry(&entries, kind)?;
            Ok((kind, repo_root.join(&entry.location), entry.checksum.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    jobs.par_iter()
        .map(|(kind, md_path, checksum)| Ok((*kind, update(*kind, md_path, checksum)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY_V1: &str = r#"<metadata packages="2">
<package type="rpm"><name>foo</name><arch>noarch</arch><version epoch="0" ver="1" rel="1"/>
  <checksum type="sha256">aaa</checksum>
  <format><rpm:requires><rpm:entry name="bar"/></rpm:requires><file>/usr/bin/foo</file></format>
</package>
<package type="rpm"><name>bar</name><arch>noarch</arch><version epoch="0" ver="1" rel="1"/>
  <checksum type="sha256">bbb</checksum>
</package>
</metadata>"#;

    const PRIMARY_V2: &str = r#"<metadata packages="2">
<package type="rpm"><name>foo</name><arch>noarch</arch><version epoch="0" ver="1" rel="1"/>
  <checksum type="sha256">aaa</checksum>
  <format><rpm:requires><rpm:entry name="bar"/></rpm:requires><file>/usr/bin/foo</file></format>
</package>
<package type="rpm"><name>baz</name><arch>noarch</arch><version epoch="0" ver="2" rel="1"/>
  <checksum type="sha256">ccc</checksum>
</package>
</metadata>"#;

    fn package_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM packages ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_incremental_primary_update() {
        let dir = tempfile::tempdir().unwrap();
        let md_path = dir.path().join("primary.xml");
        let mut conn = Connection::open_in_memory().unwrap();

        std::fs::write(&md_path, PRIMARY_V1).unwrap();
        let stats = update_connection(&mut conn, MetadataKind::Primary, &md_path, "v1").unwrap();
        assert_eq!(stats.added, 2);
        assert_eq!(stats.removed, 0);
        assert_eq!(package_names(&conn), vec!["bar", "foo"]);

        // Same checksum: nothing is decoded
        let stats = update_connection(&mut conn, MetadataKind::Primary, &md_path, "v1").unwrap();
        assert!(stats.fresh);

        std::fs::write(&md_path, PRIMARY_V2).unwrap();
        let stats = update_connection(&mut conn, MetadataKind::Primary, &md_path, "v2").unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.decode.packages, 2);
        assert_eq!(package_names(&conn), vec!["baz", "foo"]);

        let requires: i64 = conn
            .query_row("SELECT COUNT(*) FROM requires", [], |row| row.get(0))
            .unwrap();
        assert_eq!(requires, 1);
        assert!(db::dbinfo_fresh(&conn, "v2").unwrap());
    }

    #[test]
    fn test_failed_decode_keeps_previous_cache() {
        let dir = tempfile::tempdir().unwrap();
        let md_path = dir.path().join("primary.xml");
        let mut conn = Connection::open_in_memory().unwrap();

        std::fs::write(&md_path, PRIMARY_V1).unwrap();
        update_connection(&mut conn, MetadataKind::Primary, &md_path, "v1").unwrap();

        std::fs::write(&md_path, "<metadata><package><name>x</name></metadata>").unwrap();
        let result = update_connection(&mut conn, MetadataKind::Primary, &md_path, "broken");
        assert!(result.is_err());

        assert_eq!(package_names(&conn), vec!["bar", "foo"]);
        assert!(db::dbinfo_fresh(&conn, "v1").unwrap());
    }

    #[test]
    fn test_update_writes_cache_next_to_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let md_path = dir.path().join("other.xml");
        std::fs::write(
            &md_path,
            r#"<otherdata><package pkgid="aaa" name="foo" arch="noarch">
                <changelog author="a" date="1">first</changelog>
            </package></otherdata>"#,
        )
        .unwrap();

        let db_path = update_other(&md_path, "sum").unwrap();
        assert_eq!(db_path, dir.path().join("other.xml.sqlite"));

        let conn = db::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM changelog", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_packages_without_pkgid_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let md_path = dir.path().join("filelists.xml");
        std::fs::write(
            &md_path,
            r#"<filelists>
                <package name="nopkgid" arch="noarch"><file>/a</file></package>
                <package pkgid="aaa" name="foo" arch="noarch"><file>/usr/bin/foo</file></package>
            </filelists>"#,
        )
        .unwrap();

        let mut conn = Connection::open_in_memory().unwrap();
        let stats = update_connection(&mut conn, MetadataKind::Filelists, &md_path, "sum").unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.decode.packages, 2);
    }
}
