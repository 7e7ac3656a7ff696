//! `EXPLAIN` plan rows.

use tracing::debug;

use super::DiagnosticCollector;
use crate::model::{CollectorKind, ExplainRow};
use crate::session::{Row, Session, SessionError};

pub fn explain_statement(query: &str) -> String {
    format!("EXPLAIN {}", query)
}

/// Collects the execution plan of a query as reported by the server.
///
/// Runs a single `EXPLAIN` statement; the query itself is not executed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplainCollector;

impl ExplainCollector {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticCollector for ExplainCollector {
    type Output = Vec<ExplainRow>;

    fn kind(&self) -> CollectorKind {
        CollectorKind::Explain
    }

    fn collect(
        &self,
        session: &mut dyn Session,
        query: &str,
    ) -> Result<Vec<ExplainRow>, SessionError> {
        let rows = session.query(&explain_statement(query))?;
        debug!(rows = rows.len(), "explain collected");
        Ok(rows.iter().map(explain_row).collect())
    }
}

fn explain_row(row: &Row) -> ExplainRow {
    let col = |name: &str| row.get_ignore_case(name).flatten().map(str::to_string);
    ExplainRow {
        id: col("id"),
        select_type: col("select_type"),
        table: col("table"),
        access_type: col("type"),
        possible_keys: col("possible_keys"),
        key: col("key"),
        key_len: col("key_len"),
        reference: col("ref"),
        rows: col("rows"),
        filtered: col("filtered"),
        extra: col("Extra"),
    }
}
