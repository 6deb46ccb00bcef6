//! Customer schema, versioned through `PRAGMA user_version`.
//!
//! Each step is plain SQL applied once, in version order, inside a single
//! transaction together with the version bump.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, sql)` pairs, strictly increasing by version.
const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_customers.sql"))];

/// Schema version this binary creates and expects.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |&(version, _)| version)
}

fn pending_steps(from: u32) -> impl Iterator<Item = &'static (u32, &'static str)> {
    SCHEMA_STEPS.iter().filter(move |(version, _)| *version > from)
}

/// Brings the customer schema up to [`latest_version`].
///
/// Fails with [`DbError::UnsupportedSchemaVersion`] when the file was written
/// by a newer build; such a database is left untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = current_user_version(conn)?;
    let target = latest_version();
    if from > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: target,
        });
    }

    let mut steps = pending_steps(from).peekable();
    if steps.peek().is_none() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for &(version, sql) in steps {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        info!("event=db_migrate module=db status=step version={version}");
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from} to_version={target}");
    Ok(())
}

/// Reads `PRAGMA user_version` from the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
