//! Request entry point: profiles one or two queries into a [`Report`].
//!
//! Each profiled query gets its own freshly opened session, used for the
//! status, trace and explain collectors in that order and dropped
//! afterwards. A fresh session is what makes the trace collector read back
//! the right profiling entry. Only a failure to open a session or running
//! out of time aborts the request; collector failures degrade to empty
//! results.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::collector::{DiagnosticCollector, ExplainCollector, StatusCollector, TraceCollector};
use crate::compare::{ComparisonRow, TraceComparison, compare_status, compare_traces};
use crate::config::ProfilerConfig;
use crate::model::{CollectorFailure, ExplainRow, Run, RunPair, StatusDelta, TraceStep};
use crate::session::{Connector, Row, Session, SessionError};

/// Error type for a whole profiling request.
#[derive(Debug)]
pub enum ProfileError {
    /// A session for one of the queries could not be opened.
    Connection(SessionError),
    /// The request hit its execution time ceiling or was cancelled.
    Timeout(Duration),
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Connection(e) => write!(f, "cannot open session: {}", e),
            ProfileError::Timeout(limit) => {
                write!(f, "execution time ceiling of {:?} exceeded", limit)
            }
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileError::Connection(e) => Some(e),
            ProfileError::Timeout(_) => None,
        }
    }
}

/// Queries submitted for profiling, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRequest {
    pub query: String,
    pub compare: String,
}

impl ProfileRequest {
    pub fn new(query: impl Into<String>, compare: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            compare: compare.into(),
        }
    }

    /// Normalized queries to run, `None` when nothing was submitted.
    ///
    /// Inputs are trimmed. A lone second query is promoted to first, which
    /// turns comparison mode off.
    pub fn queries(&self) -> Option<RunPair<String>> {
        let query = self.query.trim();
        let compare = self.compare.trim();
        match (query.is_empty(), compare.is_empty()) {
            (true, true) => None,
            (true, false) => Some(RunPair::Single(compare.to_string())),
            (false, true) => Some(RunPair::Single(query.to_string())),
            (false, false) => Some(RunPair::Pair(query.to_string(), compare.to_string())),
        }
    }
}

/// Everything collected for the submitted queries, indexed by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub queries: RunPair<String>,
    pub status: RunPair<StatusDelta>,
    pub explain: RunPair<Vec<ExplainRow>>,
    pub trace: RunPair<Vec<TraceStep>>,
    /// Collectors that fell back to an empty result, per query.
    pub failures: RunPair<Vec<CollectorFailure>>,
}

impl Profile {
    pub fn is_comparison(&self) -> bool {
        self.queries.is_comparison()
    }

    pub fn status_rows(&self) -> Vec<ComparisonRow> {
        compare_status(&self.status)
    }

    pub fn trace_comparison(&self) -> RunPair<TraceComparison> {
        compare_traces(&self.trace)
    }
}

/// Result of one profiling request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Unix timestamp, seconds.
    pub generated_at: i64,
    /// `None` when no query was submitted.
    pub profile: Option<Profile>,
}

impl Report {
    pub fn empty() -> Self {
        Self {
            generated_at: chrono::Utc::now().timestamp(),
            profile: None,
        }
    }
}

/// Point in time after which a request sends no further statements.
///
/// Clones share cancellation, so a caller can stop a request running on
/// another thread.
#[derive(Debug, Clone)]
pub struct Deadline {
    limit: Duration,
    at: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Deadline {
    /// Expires `limit` from now. A zero limit only expires on [`Deadline::cancel`].
    pub fn after(limit: Duration) -> Self {
        let at = if limit.is_zero() {
            None
        } else {
            Instant::now().checked_add(limit)
        };
        Self {
            limit,
            at,
            cancelled: Arc::default(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn expired(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed) || self.at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

/// Session wrapper refusing every statement once the deadline has passed.
struct GuardedSession<'a, S> {
    inner: S,
    deadline: &'a Deadline,
}

impl<S: Session> Session for GuardedSession<'_, S> {
    fn query(&mut self, statement: &str) -> Result<Vec<Row>, SessionError> {
        if self.deadline.expired() {
            return Err(SessionError::Aborted);
        }
        self.inner.query(statement)
    }

    fn execute(&mut self, statement: &str) -> Result<(), SessionError> {
        if self.deadline.expired() {
            return Err(SessionError::Aborted);
        }
        self.inner.execute(statement)
    }
}

/// Diagnostics gathered for one query on its own session.
struct ProfiledRun {
    status: StatusDelta,
    trace: Vec<TraceStep>,
    explain: Vec<ExplainRow>,
    failures: Vec<CollectorFailure>,
}

/// Runs the collectors for each submitted query.
pub struct Profiler<C> {
    connector: C,
    config: ProfilerConfig,
}

impl<C: Connector> Profiler<C> {
    pub fn new(connector: C, config: ProfilerConfig) -> Self {
        Self { connector, config }
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Profiles the submitted queries sequentially, first query first,
    /// within the configured execution time ceiling.
    pub fn profile(&self, request: &ProfileRequest) -> Result<Report, ProfileError> {
        self.profile_until(request, &Deadline::after(self.config.max_execution_time))
    }

    /// Like [`Profiler::profile`] with a caller-controlled deadline. No
    /// statement is sent once `deadline` has expired; the statement already
    /// running is bounded by the backend's own timeout.
    pub fn profile_until(
        &self,
        request: &ProfileRequest,
        deadline: &Deadline,
    ) -> Result<Report, ProfileError> {
        let Some(queries) = request.queries() else {
            return Ok(Report::empty());
        };

        let runs = queries
            .each_ref()
            .try_map(|run, query| self.profile_query(run, query, deadline))?;

        let status = runs.each_ref().map(|_, r| r.status.clone());
        let explain = runs.each_ref().map(|_, r| r.explain.clone());
        let trace = runs.each_ref().map(|_, r| r.trace.clone());
        let failures = runs.map(|_, r| r.failures);

        Ok(Report {
            generated_at: chrono::Utc::now().timestamp(),
            profile: Some(Profile {
                queries,
                status,
                explain,
                trace,
                failures,
            }),
        })
    }

    fn profile_query(
        &self,
        run: Run,
        query: &str,
        deadline: &Deadline,
    ) -> Result<ProfiledRun, ProfileError> {
        if deadline.expired() {
            return Err(ProfileError::Timeout(deadline.limit()));
        }
        let started = Instant::now();
        let mut session = GuardedSession {
            inner: self.connector.open().map_err(ProfileError::Connection)?,
            deadline,
        };
        let mut failures = Vec::new();

        let status = run_collector(
            &StatusCollector::new(self.config.warm_up_runs),
            &mut session,
            query,
            &mut failures,
        )?;
        let trace = run_collector(&TraceCollector::new(), &mut session, query, &mut failures)?;
        let explain =
            run_collector(&ExplainCollector::new(), &mut session, query, &mut failures)?;

        info!(
            query = run.number(),
            counters = status.len(),
            trace_steps = trace.len(),
            plan_rows = explain.len(),
            failed = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query profiled"
        );

        Ok(ProfiledRun {
            status,
            trace,
            explain,
            failures,
        })
    }
}

fn run_collector<D: DiagnosticCollector, S: Session>(
    collector: &D,
    session: &mut GuardedSession<'_, S>,
    query: &str,
    failures: &mut Vec<CollectorFailure>,
) -> Result<D::Output, ProfileError> {
    match collector.collect(session, query) {
        Ok(output) => Ok(output),
        Err(_) if session.deadline.expired() => {
            warn!(collector = %collector.kind(), "execution time ceiling reached, aborting");
            Err(ProfileError::Timeout(session.deadline.limit()))
        }
        Err(e) => {
            warn!(collector = %collector.kind(), error = %e, "collector failed, reporting no data");
            failures.push(CollectorFailure {
                collector: collector.kind(),
                message: e.to_string(),
            });
            Ok(D::Output::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{SHOW_STATUS, explain_statement, trace_query};
    use crate::model::{CollectorKind, StatusValue};
    use crate::session::mock::{
        const_lookup_explain_row, full_scan_explain_row, profiling_rows, snapshot_log, status_rows,
    };
    use crate::session::{MockConnector, MockSession, Row};

    const SLOW: &str = "SELECT * FROM orders WHERE note LIKE '%x%'";
    const FAST: &str = "SELECT * FROM orders WHERE id = 7";

    fn scripted_session(
        query: &str,
        before: &str,
        after: &str,
        steps: &[(&str, f64)],
        plan: Row,
    ) -> MockSession {
        MockSession::new()
            .on(
                SHOW_STATUS,
                status_rows(&[("Handler_read_rnd_next", before), ("Last_query_cost", "0.0")]),
            )
            .on(
                SHOW_STATUS,
                status_rows(&[("Handler_read_rnd_next", after), ("Last_query_cost", "1.2")]),
            )
            .on(&trace_query(), profiling_rows(steps))
            .on(&explain_statement(query), vec![plan])
    }

    fn full_scan() -> Row {
        full_scan_explain_row("orders", "5000")
    }

    fn config(warm_up_runs: u32) -> ProfilerConfig {
        ProfilerConfig {
            warm_up_runs,
            ..ProfilerConfig::default()
        }
    }

    #[test]
    fn request_normalization() {
        assert_eq!(ProfileRequest::new("", "  ").queries(), None);
        assert_eq!(
            ProfileRequest::new(" SELECT 1 ", "").queries(),
            Some(RunPair::Single("SELECT 1".to_string()))
        );
        assert_eq!(
            ProfileRequest::new("", "SELECT 2").queries(),
            Some(RunPair::Single("SELECT 2".to_string()))
        );
        assert_eq!(
            ProfileRequest::new("SELECT 1", "SELECT 2").queries(),
            Some(RunPair::Pair("SELECT 1".to_string(), "SELECT 2".to_string()))
        );
    }

    #[test]
    fn empty_request_touches_no_database() {
        let profiler = Profiler::new(MockConnector::refusing("must not connect"), config(3));
        let report = profiler.profile(&ProfileRequest::default()).unwrap();
        assert_eq!(report.profile, None);
    }

    #[test]
    fn single_query_collects_all_diagnostics() {
        let session = scripted_session(
            SLOW,
            "10",
            "5010",
            &[("starting", 0.0001), ("executing", 0.02)],
            full_scan(),
        );
        let log = session.log();
        let profiler = Profiler::new(MockConnector::new(vec![session]), config(3));

        let report = profiler.profile(&ProfileRequest::new(SLOW, "")).unwrap();
        let profile = report.profile.unwrap();

        assert!(!profile.is_comparison());
        assert_eq!(
            profile.status.first()["Handler_read_rnd_next"],
            StatusValue::Delta(5000)
        );
        assert_eq!(profile.trace.first().len(), 2);
        assert_eq!(profile.explain.first().len(), 1);
        assert!(profile.failures.first().is_empty());

        let executed = snapshot_log(&log);
        // 3 warm-up + 2 snapshots + measured, then 4 trace statements, then explain.
        assert_eq!(executed.len(), 11);
        assert_eq!(executed[3], SHOW_STATUS);
        assert_eq!(executed[6], "SET profiling = 1");
        assert_eq!(executed[10], explain_statement(SLOW));
    }

    #[test]
    fn comparison_opens_one_session_per_query() {
        let slow = scripted_session(
            SLOW,
            "0",
            "5000",
            &[("starting", 0.0001), ("executing", 0.02)],
            full_scan(),
        );
        let fast = scripted_session(
            FAST,
            "0",
            "1",
            &[("starting", 0.0001)],
            const_lookup_explain_row("orders"),
        );
        let (slow_log, fast_log) = (slow.log(), fast.log());
        let connector = MockConnector::new(vec![slow, fast]);
        let profiler = Profiler::new(connector, config(1));

        let profile = profiler
            .profile(&ProfileRequest::new(SLOW, FAST))
            .unwrap()
            .profile
            .unwrap();

        assert!(profile.is_comparison());
        assert_eq!(profile.queries.second().map(String::as_str), Some(FAST));
        assert!(snapshot_log(&slow_log).iter().all(|s| s != FAST));
        assert!(snapshot_log(&fast_log).iter().all(|s| s != SLOW));

        let rows = profile.status_rows();
        let scan = rows.iter().find(|r| r.name == "Handler_read_rnd_next").unwrap();
        assert_eq!(scan.better(), Some(Run::Second));

        let traces = profile.trace_comparison();
        let flagged: Vec<&str> = traces
            .first()
            .steps
            .iter()
            .filter(|s| s.differs)
            .map(|s| s.step.state.as_str())
            .collect();
        assert_eq!(flagged, vec!["executing"]);
        assert_eq!(
            profile.explain.second().unwrap()[0].access_type.as_deref(),
            Some("const")
        );
    }

    #[test]
    fn connection_failure_aborts_request() {
        let profiler = Profiler::new(MockConnector::refusing("connection refused"), config(3));
        let err = profiler.profile(&ProfileRequest::new(SLOW, "")).unwrap_err();
        assert!(matches!(err, ProfileError::Connection(SessionError::Connection(_))));
        assert_eq!(
            err.to_string(),
            "cannot open session: MySQL: connection refused"
        );
    }

    #[test]
    fn second_session_failure_discards_partial_report() {
        let first = scripted_session(SLOW, "0", "1", &[], full_scan());
        let connector = MockConnector::new(vec![first]);
        let profiler = Profiler::new(connector, config(0));
        assert!(profiler.profile(&ProfileRequest::new(SLOW, FAST)).is_err());
    }

    #[test]
    fn collector_failure_degrades_to_empty_result() {
        let session = MockSession::new()
            .on_error(SHOW_STATUS, "access denied")
            .on(&trace_query(), profiling_rows(&[("starting", 0.001)]))
            .on_error(&explain_statement(SLOW), "explain not allowed");
        let profiler = Profiler::new(MockConnector::new(vec![session]), config(0));

        let profile = profiler
            .profile(&ProfileRequest::new(SLOW, ""))
            .unwrap()
            .profile
            .unwrap();

        assert!(profile.status.first().is_empty());
        assert!(profile.explain.first().is_empty());
        assert_eq!(profile.trace.first().len(), 1);
        assert!(profile.status_rows().is_empty());
        let kinds: Vec<CollectorKind> =
            profile.failures.first().iter().map(|f| f.collector).collect();
        assert_eq!(kinds, vec![CollectorKind::Status, CollectorKind::Explain]);
    }

    #[test]
    fn expired_deadline_opens_no_session() {
        let connector = MockConnector::new(vec![MockSession::new()]);
        let profiler = Profiler::new(connector, config(3));
        let deadline = Deadline::after(Duration::from_secs(60));
        deadline.cancel();

        let err = profiler
            .profile_until(&ProfileRequest::new(SLOW, ""), &deadline)
            .unwrap_err();

        assert!(matches!(err, ProfileError::Timeout(_)));
        assert_eq!(profiler.connector.remaining(), 1);
    }

    #[test]
    fn deadline_stops_statements_mid_request() {
        let session = MockSession::new().with_latency(Duration::from_millis(100));
        let log = session.log();
        let profiler = Profiler::new(MockConnector::new(vec![session]), config(5));
        let deadline = Deadline::after(Duration::from_millis(250));

        let err = profiler
            .profile_until(&ProfileRequest::new(SLOW, ""), &deadline)
            .unwrap_err();

        assert!(matches!(err, ProfileError::Timeout(_)));
        assert_eq!(err.to_string(), "execution time ceiling of 250ms exceeded");
        // Statements start at 0, 100 and 200 ms; the one due at 300 ms is refused.
        assert_eq!(snapshot_log(&log), vec![SLOW, SLOW, SLOW]);
    }

    #[test]
    fn zero_limit_never_expires_on_its_own() {
        let deadline = Deadline::after(Duration::ZERO);
        assert!(!deadline.expired());
        let shared = deadline.clone();
        shared.cancel();
        assert!(deadline.expired());
    }
}
