//! Connection bootstrap for the slot database.
//!
//! # Invariants
//! - Returned connections run with `synchronous=FULL` and
//!   `secure_delete=ON`, so replaced blobs are zeroed in freed pages.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Target<'a> {
    File(&'a Path),
    Memory,
}

impl Target<'_> {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

/// Opens the slot database file at `path`, creating it when missing.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_target(Target::File(path.as_ref()))
}

/// Opens a private in-memory slot database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_target(Target::Memory)
}

fn open_target(target: Target<'_>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = target.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let opened = target
        .connect()
        .map_err(DbError::from)
        .and_then(|mut conn| {
            configure(&conn)?;
            apply_migrations(&mut conn)?;
            Ok(conn)
        });

    match &opened {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code={} error={}",
            mode,
            started_at.elapsed().as_millis(),
            err.log_code(),
            err
        ),
    }
    opened
}

fn configure(conn: &Connection) -> DbResult<()> {
    conn.pragma_update(None, "synchronous", "FULL")
        .map_err(|source| DbError::Pragma {
            name: "synchronous",
            source,
        })?;
    conn.pragma_update_and_check(None, "secure_delete", true, |row| row.get::<_, i64>(0))
        .map_err(|source| DbError::Pragma {
            name: "secure_delete",
            source,
        })?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}
