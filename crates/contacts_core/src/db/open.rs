//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by the store.
//! - Trigger schema migrations for callers that bootstrap the schema.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout.
//! - Connections from `open_db*` have migrations fully applied.

use super::migrations::apply_migrations;
use crate::config::DEFAULT_BUSY_TIMEOUT;
use super::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a configured connection to an existing database file.
///
/// Used for per-operation access once the schema has been bootstrapped.
/// Unlike [`open_db`], a missing file is an error rather than a new database.
pub fn open_connection(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = open_file(path.as_ref(), flags, busy_timeout)?;
    debug!("event=db_connect module=db status=ok mode=file");
    Ok(conn)
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Creates the database file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
}

/// Same as [`open_db`] with an explicit busy timeout.
pub fn open_db_with_timeout(
    path: impl AsRef<Path>,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let conn = match open_file(path.as_ref(), OpenFlags::default(), busy_timeout) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }
    };

    migrate_and_log(conn, "file", started_at)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let conn = match Connection::open_in_memory()
        .and_then(|conn| configure_connection(&conn, DEFAULT_BUSY_TIMEOUT).map(|()| conn))
    {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    migrate_and_log(conn, "memory", started_at)
}

fn migrate_and_log(mut conn: Connection, mode: &str, started_at: Instant) -> DbResult<Connection> {
    match apply_migrations(&mut conn) {
        Ok(applied) => {
            info!(
                "event=db_open module=db status=ok mode={} migrations_applied={} duration_ms={}",
                mode,
                applied,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn open_file(path: &Path, flags: OpenFlags, busy_timeout: Duration) -> DbResult<Connection> {
    let to_open_error = |source| DbError::Open {
        path: path.to_path_buf(),
        source,
    };
    let conn = Connection::open_with_flags(path, flags).map_err(to_open_error)?;
    configure_connection(&conn, busy_timeout).map_err(to_open_error)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}
