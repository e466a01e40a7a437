//! Per-request record of executed SQL statements.
//!
//! A [QueryLog] is opened for every request to the GraphQL endpoint and
//! shared by the auth middleware, the scoped [Database](super::Database)
//! handle and the DataLoaders of that request.
//! The [QueryLogger](crate::graphql::QueryLogger) extension prints it once the
//! operation has finished.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// One statement as it was sent to the data store.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub sql: String,
    pub elapsed: Duration,
}

/// Shared, append-only list of statements executed during one request.
#[derive(Debug, Clone, Default)]
pub struct QueryLog {
    entries: Arc<Mutex<Vec<ExecutedQuery>>>,
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, sql: impl Into<String>, elapsed: Duration) {
        self.entries.lock().push(ExecutedQuery {
            sql: sql.into(),
            elapsed,
        });
    }

    /// Snapshot of the statements recorded so far, in execution order.
    pub fn entries(&self) -> Vec<ExecutedQuery> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Write every recorded statement as a `Query:` / `Time:` / `---` block.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        for query in self.entries.lock().iter() {
            writeln!(out, "Query: {}", query.sql)?;
            writeln!(out, "Time: {:.3}", query.elapsed.as_secs_f64())?;
            writeln!(out, "---")?;
        }
        Ok(())
    }

    /// Print the log to stdout while holding the stdout lock, so blocks from
    /// concurrent requests never interleave.
    pub fn print(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_to(&mut out)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_records_in_execution_order() {
        let log = QueryLog::new();
        log.record("SELECT 1", Duration::from_millis(1));
        log.record("SELECT 2", Duration::from_millis(2));

        let sql: Vec<_> = log.entries().into_iter().map(|q| q.sql).collect();
        assert_eq!(sql, vec!["SELECT 1".to_string(), "SELECT 2".to_string()]);
    }

    #[test]
    fn test_clones_share_entries() {
        let log = QueryLog::new();
        let other = log.clone();
        other.record("SELECT 1", Duration::ZERO);

        assert_eq!(log.len(), 1);
        assert!(!log.is_empty());
    }

    #[test]
    fn test_write_format() {
        let log = QueryLog::new();
        log.record("SELECT id FROM users", Duration::from_millis(12));

        let mut buf = Vec::new();
        log.write_to(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Query: SELECT id FROM users\nTime: 0.012\n---\n"
        );
    }

    #[test]
    fn test_empty_log_writes_nothing() {
        let mut buf = Vec::new();
        QueryLog::new().write_to(&mut buf).unwrap();
        assert!(buf.is_empty());
    }
}
