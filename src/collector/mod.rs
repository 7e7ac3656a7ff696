//! Per-query diagnostic collectors.
//!
//! Each collector runs the profiled query against a session one or more
//! times and returns one kind of diagnostics:
//! - [`StatusCollector`] - `SHOW STATUS` counter deltas around a measured run
//! - [`ExplainCollector`] - `EXPLAIN` plan rows, verbatim
//! - [`TraceCollector`] - `INFORMATION_SCHEMA.PROFILING` timing steps
//!
//! Collectors return `Err` only when one of their own diagnostic statements
//! fails. The profiler degrades such failures to an empty result for that
//! collector alone.

mod explain;
mod status;
mod trace;

pub use explain::{ExplainCollector, explain_statement};
pub use status::{SHOW_STATUS, StatusCollector, compute_delta, parse_snapshot};
pub use trace::{PROFILED_QUERY_ID, TraceCollector, parse_trace, trace_query};

use crate::model::CollectorKind;
use crate::session::{Session, SessionError};

/// Common interface of the status, explain and trace collectors.
pub trait DiagnosticCollector {
    type Output: Default;

    fn kind(&self) -> CollectorKind;

    /// Collects diagnostics for `query` on `session`.
    fn collect(
        &self,
        session: &mut dyn Session,
        query: &str,
    ) -> Result<Self::Output, SessionError>;
}
