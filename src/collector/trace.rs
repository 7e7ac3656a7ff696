//! `INFORMATION_SCHEMA.PROFILING` timing traces.
//!
//! The profiling subsystem numbers profiled statements per session, starting
//! at 1. The trace of the measured run is read back by that number, which is
//! only correct on a session that has not profiled anything before.

use tracing::{debug, warn};

use super::DiagnosticCollector;
use crate::model::{CollectorKind, TraceStep, parse_number};
use crate::session::{Row, Session, SessionError};

/// Profiling query id of the first profiled statement in a session.
pub const PROFILED_QUERY_ID: u32 = 1;

/// Reads the steps of the first profiled statement in execution order.
pub fn trace_query() -> String {
    format!(
        "SELECT STATE, DURATION FROM INFORMATION_SCHEMA.PROFILING \
         WHERE QUERY_ID = {} ORDER BY SEQ",
        PROFILED_QUERY_ID
    )
}

const PROFILING_ON: &str = "SET profiling = 1";
const PROFILING_OFF: &str = "SET profiling = 0";

/// Collects the step-by-step timing of one run of a query.
///
/// # Precondition
///
/// `session` must be fresh: no statement may have been profiled on it
/// before. Reusing a session across two profiled queries reads back the
/// earlier query's steps. Warm-up and status statements run before
/// profiling is enabled do not count.
///
/// The query runs exactly once, with no warm-up, so first-run costs show up
/// in the trace. Four statements reach the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceCollector;

impl TraceCollector {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticCollector for TraceCollector {
    type Output = Vec<TraceStep>;

    fn kind(&self) -> CollectorKind {
        CollectorKind::Trace
    }

    fn collect(
        &self,
        session: &mut dyn Session,
        query: &str,
    ) -> Result<Vec<TraceStep>, SessionError> {
        session.execute(PROFILING_ON)?;

        if let Err(e) = session.execute(query) {
            warn!(error = %e, "profiled query failed");
        }
        let steps = session.query(&trace_query()).map(|rows| parse_trace(&rows));

        if let Err(e) = session.execute(PROFILING_OFF) {
            warn!(error = %e, "failed to disable profiling");
        }

        let steps = steps?;
        debug!(
            query_id = PROFILED_QUERY_ID,
            steps = steps.len(),
            "trace collected"
        );
        Ok(steps)
    }
}

/// Converts profiling rows (`STATE`, `DURATION`) to steps, keeping order.
///
/// Rows without a state are skipped; unparsable durations count as zero.
pub fn parse_trace(rows: &[Row]) -> Vec<TraceStep> {
    rows.iter()
        .filter_map(|row| {
            let state = row.get_ignore_case("STATE").flatten()?;
            let duration = row
                .get_ignore_case("DURATION")
                .flatten()
                .and_then(parse_number)
                .unwrap_or(0.0);
            Some(TraceStep::new(state, duration))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockSession;
    use crate::session::mock::profiling_rows;

    const QUERY: &str = "SELECT COUNT(*) FROM orders";

    #[test]
    fn collect_toggles_profiling_around_single_run() {
        let mut session = MockSession::new().on(
            &trace_query(),
            profiling_rows(&[("starting", 0.000047), ("Sending data", 0.0125), ("end", 0.000004)]),
        );

        let steps = TraceCollector::new().collect(&mut session, QUERY).unwrap();

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], TraceStep::new("starting", 0.000047));
        assert_eq!(steps[1].state, "Sending data");
        assert!((steps[1].duration - 0.0125).abs() < 1e-12);
        assert_eq!(
            session.executed(),
            vec![
                PROFILING_ON.to_string(),
                QUERY.to_string(),
                trace_query(),
                PROFILING_OFF.to_string(),
            ]
        );
    }

    #[test]
    fn profiling_disabled_even_when_retrieval_fails() {
        let mut session = MockSession::new().on_error(&trace_query(), "no such table");

        let result = TraceCollector::new().collect(&mut session, QUERY);

        assert!(result.is_err());
        assert_eq!(session.executed().last().map(String::as_str), Some(PROFILING_OFF));
    }

    #[test]
    fn enable_failure_aborts_before_running_query() {
        let mut session = MockSession::new().on_error(PROFILING_ON, "unknown variable");

        assert!(TraceCollector::new().collect(&mut session, QUERY).is_err());
        assert_eq!(session.executed(), vec![PROFILING_ON]);
    }

    #[test]
    fn trace_query_targets_first_profiled_statement() {
        let sql = trace_query();
        assert!(sql.contains("WHERE QUERY_ID = 1 ORDER BY SEQ"));
        assert!(sql.starts_with("SELECT STATE, DURATION FROM INFORMATION_SCHEMA.PROFILING"));
    }

    #[test]
    fn parse_trace_tolerates_bad_rows() {
        let rows = vec![
            Row::new().with("STATE", Some("init")).with("DURATION", Some("abc")),
            Row::new().with("DURATION", Some("0.1")),
            Row::new().with("state", Some("end")).with("duration", Some("0.000002")),
        ];

        let steps = parse_trace(&rows);

        assert_eq!(steps, vec![TraceStep::new("init", 0.0), TraceStep::new("end", 0.000002)]);
    }
}
