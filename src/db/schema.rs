// src/db/schema.rs

//! Cache database schema
//!
//! Each metadata document gets its own database. All of them share the
//! `db_info` table, which records the schema version and the checksum of
//! the metadata the database was built from.

use crate::error::Result;
use crate::parser::MetadataKind;
use rusqlite::Connection;
use tracing::debug;

/// Version stored in `db_info.dbversion`; caches with another version are rebuilt
pub const DB_VERSION: i64 = 8;

const DB_INFO: &str = "
    CREATE TABLE IF NOT EXISTS db_info (dbversion INTEGER, checksum TEXT);
";

const PRIMARY_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS packages (
        pkgKey INTEGER PRIMARY KEY,
        pkgId TEXT,
        name TEXT,
        arch TEXT,
        version TEXT,
        epoch TEXT,
        release TEXT,
        summary TEXT,
        description TEXT,
        url TEXT,
        time_file INTEGER,
        time_build INTEGER,
        rpm_license TEXT,
        rpm_vendor TEXT,
        rpm_group TEXT,
        rpm_buildhost TEXT,
        rpm_sourcerpm TEXT,
        rpm_header_start INTEGER,
        rpm_header_end INTEGER,
        rpm_packager TEXT,
        size_package INTEGER,
        size_installed INTEGER,
        size_archive INTEGER,
        location_href TEXT,
        checksum_type TEXT
    );
    CREATE INDEX IF NOT EXISTS packagename ON packages (name);
    CREATE INDEX IF NOT EXISTS packageId ON packages (pkgId);

    CREATE TABLE IF NOT EXISTS files (name TEXT, type TEXT, pkgKey INTEGER);
    CREATE INDEX IF NOT EXISTS filenames ON files (name);
    CREATE INDEX IF NOT EXISTS pkgfiles ON files (pkgKey);

    CREATE TABLE IF NOT EXISTS requires (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
    CREATE TABLE IF NOT EXISTS provides (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
    CREATE TABLE IF NOT EXISTS conflicts (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
    CREATE TABLE IF NOT EXISTS obsoletes (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
    CREATE INDEX IF NOT EXISTS pkgrequires ON requires (pkgKey);
    CREATE INDEX IF NOT EXISTS requiresname ON requires (name);
    CREATE INDEX IF NOT EXISTS pkgprovides ON provides (pkgKey);
    CREATE INDEX IF NOT EXISTS providesname ON provides (name);
    CREATE INDEX IF NOT EXISTS pkgconflicts ON conflicts (pkgKey);
    CREATE INDEX IF NOT EXISTS pkgobsoletes ON obsoletes (pkgKey);

    CREATE TRIGGER IF NOT EXISTS removals AFTER DELETE ON packages
    BEGIN
        DELETE FROM files WHERE pkgKey = old.pkgKey;
        DELETE FROM requires WHERE pkgKey = old.pkgKey;
        DELETE FROM provides WHERE pkgKey = old.pkgKey;
        DELETE FROM conflicts WHERE pkgKey = old.pkgKey;
        DELETE FROM obsoletes WHERE pkgKey = old.pkgKey;
    END;
";

const FILELISTS_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS packages (pkgKey INTEGER PRIMARY KEY, pkgId TEXT);
    CREATE INDEX IF NOT EXISTS keyfile ON packages (pkgId);

    CREATE TABLE IF NOT EXISTS filelist (pkgKey INTEGER, dirname TEXT, filenames TEXT, filetypes TEXT);
    CREATE INDEX IF NOT EXISTS dirnames ON filelist (dirname);
    CREATE INDEX IF NOT EXISTS pkgfilelist ON filelist (pkgKey);

    CREATE TRIGGER IF NOT EXISTS remove_filelist AFTER DELETE ON packages
    BEGIN
        DELETE FROM filelist WHERE pkgKey = old.pkgKey;
    END;
";

const OTHER_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS packages (pkgKey INTEGER PRIMARY KEY, pkgId TEXT);
    CREATE INDEX IF NOT EXISTS keychange ON packages (pkgId);

    CREATE TABLE IF NOT EXISTS changelog (pkgKey INTEGER, author TEXT, date INTEGER, changelog TEXT);
    CREATE INDEX IF NOT EXISTS pkgchangelog ON changelog (pkgKey);

    CREATE TRIGGER IF NOT EXISTS remove_changelogs AFTER DELETE ON packages
    BEGIN
        DELETE FROM changelog WHERE pkgKey = old.pkgKey;
    END;
";

/// Create the tables for a metadata kind; safe to call on an existing cache
pub fn create_tables(conn: &Connection, kind: MetadataKind) -> Result<()> {
    debug!("Creating {} cache tables", kind);

    let tables = match kind {
        MetadataKind::Primary => PRIMARY_TABLES,
        MetadataKind::Filelists => FILELISTS_TABLES,
        MetadataKind::Other => OTHER_TABLES,
    };

    conn.execute_batch(DB_INFO)?;
    conn.execute_batch(tables)?;
    Ok(())
}
