//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::time::Duration;

use rowbind::{Connection, ConnectionOptions, JournalMode};
use tempfile::TempDir;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// In-memory database with `schema` applied.
pub fn memory_db(schema: &str) -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch(schema).expect("apply schema");
    conn
}

/// WAL database in a fresh temp directory with `schema` applied. Keep the
/// directory alive for as long as the connection is used.
pub fn file_db(schema: &str) -> (TempDir, Connection) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let options = ConnectionOptions::default()
        .journal_mode(JournalMode::Wal)
        .busy_timeout(Duration::from_secs(1));
    let conn = Connection::open(&dir.path().join("rowbind.sqlite"), &options)
        .expect("open file db");
    conn.execute_batch(schema).expect("apply schema");
    (dir, conn)
}
