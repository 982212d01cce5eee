//! Forwarding of `log` records to a host-provided logger.
//!
//! Lives in its own test binary: the logger is process-global and would
//! clash with the tracing subscriber the other integration tests install.

use std::sync::{Arc, Mutex};

use rowbind::logger::{self, LogLevel, Logger};
use rowbind::{Connection, ParameterConverter, Statement};

#[derive(Default)]
struct Collector {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl Logger for Collector {
    fn log(&self, level: LogLevel, message: String) {
        self.records.lock().expect("lock").push((level, message));
    }
}

impl Collector {
    fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .expect("lock")
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

#[test]
fn test_forwards_rowbind_records_and_filters_foreign_noise() {
    let collector = Arc::new(Collector::default());
    logger::set_logger(collector.clone());

    ParameterConverter::<(i64,)>::build().expect("build");
    let conn = Connection::open_in_memory().expect("open in-memory db");
    let stmt = Statement::prepare(&conn, "SELECT 1").expect("prepare");
    stmt.reset().expect("reset");

    log::debug!("debug noise from the host");
    log::warn!("warning from the host");

    assert!(collector.contains(LogLevel::Debug, "compiled parameter converter"));
    assert!(collector.contains(LogLevel::Trace, "statement reset to version 1"));
    assert!(collector.contains(LogLevel::Warn, "warning from the host"));
    assert!(!collector.contains(LogLevel::Debug, "debug noise"));
}
