// src/db/mod.rs

//! SQLite cache layer
//!
//! This module handles all SQLite operations including:
//! - Locating and opening the cache database of a metadata file
//! - Freshness bookkeeping in `db_info`
//! - Transaction handling
//! - Writing decoded packages (see `writer`)

pub mod schema;
pub mod writer;

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the cache database belonging to a metadata file
///
/// The database lives next to the metadata, with `.sqlite` appended to the
/// full file name (`primary.xml.gz` -> `primary.xml.gz.sqlite`).
pub fn cache_path(md_path: &Path) -> PathBuf {
    let mut name = md_path.as_os_str().to_os_string();
    name.push(".sqlite");
    PathBuf::from(name)
}

/// Open a cache database, creating it if needed
///
/// # Arguments
///
/// * `db_path` - Path of the database file
///
/// # Returns
///
/// * `Result<Connection>` - Database connection if successful
pub fn open(db_path: &Path) -> Result<Connection> {
    debug!("Opening cache database at: {}", db_path.display());

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::InvalidMetadata(format!("Failed to create cache directory {}: {}", parent.display(), e))
        })?;
    }

    let conn = Connection::open(db_path)?;

    // The cache can always be rebuilt from metadata, so favour speed
    conn.execute_batch(
        "
        PRAGMA synchronous = OFF;
        PRAGMA busy_timeout = 5000;
        ",
    )?;

    Ok(conn)
}

/// Run `f` inside a transaction, committing only if it succeeds
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Whether the cache was built by this schema version from `checksum`
pub fn dbinfo_fresh(conn: &Connection, checksum: &str) -> Result<bool> {
    let has_table: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'db_info'",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(false);
    }

    let row: Option<(i64, Option<String>)> = conn
        .query_row("SELECT dbversion, checksum FROM db_info LIMIT 1", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .optional()?;

    let fresh = matches!(
        row,
        Some((version, Some(ref stored))) if version == schema::DB_VERSION && stored == checksum
    );
    debug!("Cache freshness for checksum {}: {}", checksum, fresh);
    Ok(fresh)
}

/// Forget which metadata the cache was built from
pub fn dbinfo_clear(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM db_info", [])?;
    Ok(())
}

/// Record that the cache now matches `checksum`
pub fn dbinfo_update(conn: &Connection, checksum: &str) -> Result<()> {
    dbinfo_clear(conn)?;
    conn.execute(
        "INSERT INTO db_info (dbversion, checksum) VALUES (?1, ?2)",
        rusqlite::params![schema::DB_VERSION, checksum],
    )?;
    Ok(())
}

/// Map of `pkgId -> pkgKey` for every package already cached
pub fn read_package_ids(conn: &Connection) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT pkgId, pkgKey FROM packages")?;
    let ids = stmt
        .query_map([], |row| Ok((row.get::<_, Option<String>>(0)?, row.get(1)?)))?
        .filter_map(|row| match row {
            Ok((Some(pkg_id), key)) => Some(Ok((pkg_id, key))),
            Ok((None, _)) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;

    Ok(ids)
}
