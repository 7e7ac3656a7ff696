//! `SHOW STATUS` counter deltas.

use tracing::{debug, warn};

use super::DiagnosticCollector;
use crate::model::{
    CollectorKind, LAST_QUERY_COST, StatusDelta, StatusSnapshot, StatusValue, parse_number,
};
use crate::session::{Row, Session, SessionError};

pub const SHOW_STATUS: &str = "SHOW STATUS";

/// Measures how much server work one run of a query causes.
///
/// Runs the query `warm_up_runs` times, snapshots `SHOW STATUS`, runs it once
/// more, snapshots again, and reports the per-counter differences. In total
/// `warm_up_runs + 3` statements reach the session.
#[derive(Debug, Clone, Copy)]
pub struct StatusCollector {
    warm_up_runs: u32,
}

impl StatusCollector {
    pub fn new(warm_up_runs: u32) -> Self {
        Self { warm_up_runs }
    }

    pub fn warm_up_runs(&self) -> u32 {
        self.warm_up_runs
    }

    fn snapshot(session: &mut dyn Session) -> Result<StatusSnapshot, SessionError> {
        session.query(SHOW_STATUS).map(|rows| parse_snapshot(&rows))
    }

    /// Runs the profiled query. Its own failure (bad SQL, missing table) does
    /// not stop collection: the counters still describe what the server did.
    fn run_query(session: &mut dyn Session, query: &str, phase: &'static str) {
        if let Err(e) = session.execute(query) {
            warn!(phase, error = %e, "profiled query failed");
        }
    }
}

impl DiagnosticCollector for StatusCollector {
    type Output = StatusDelta;

    fn kind(&self) -> CollectorKind {
        CollectorKind::Status
    }

    fn collect(&self, session: &mut dyn Session, query: &str) -> Result<StatusDelta, SessionError> {
        for _ in 0..self.warm_up_runs {
            Self::run_query(session, query, "warm-up");
        }

        let before = Self::snapshot(session)?;
        Self::run_query(session, query, "measured");
        let after = Self::snapshot(session)?;

        let delta = compute_delta(&before, &after);
        debug!(
            counters = before.len(),
            deltas = delta.len(),
            "status delta computed"
        );
        Ok(delta)
    }
}

/// Builds a snapshot from `SHOW STATUS` rows (`Variable_name`, `Value`).
///
/// Rows without a name are skipped; `NULL` values become empty strings,
/// which never parse as numbers.
pub fn parse_snapshot(rows: &[Row]) -> StatusSnapshot {
    rows.iter()
        .filter_map(|row| {
            let name = row.get_ignore_case("Variable_name").flatten()?;
            let value = row.get_ignore_case("Value").flatten().unwrap_or("");
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Per-counter `after - before` for counters numeric in both snapshots.
///
/// Counters missing from `after` or non-numeric on either side are left out.
/// `Last_query_cost` is always taken as `after`'s raw value.
pub fn compute_delta(before: &StatusSnapshot, after: &StatusSnapshot) -> StatusDelta {
    let mut delta = StatusDelta::new();

    for (name, start) in before {
        let Some(end) = after.get(name) else {
            continue;
        };
        if let Some(d) = counter_delta(start, end) {
            delta.insert(name.clone(), StatusValue::Delta(d));
        }
    }

    if let Some(cost) = after.get(LAST_QUERY_COST) {
        delta.insert(LAST_QUERY_COST.to_string(), StatusValue::Raw(cost.clone()));
    }

    delta
}

/// `end - start` of one counter. Integers subtract exactly; decimal values
/// subtract as floats and the difference is truncated toward zero.
fn counter_delta(start: &str, end: &str) -> Option<i64> {
    let (start, end) = (start.trim(), end.trim());
    if let (Ok(a), Ok(b)) = (start.parse::<i64>(), end.parse::<i64>()) {
        return Some(b.saturating_sub(a));
    }
    let diff = parse_number(end)? - parse_number(start)?;
    (diff.abs() < i64::MAX as f64).then(|| diff.trunc() as i64)
}
