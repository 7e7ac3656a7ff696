//! HTTP request handlers.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use serde::Deserialize;
use tracing::{error, info, warn};

use mqprof::profiler::{Deadline, ProfileError, ProfileRequest};
use mqprof::session::Connector;
use mqprof::view::render_json;

use crate::state::SharedProfiler;

// ============================================================
// Health
// ============================================================

pub(crate) async fn handle_health() -> &'static str {
    "ok"
}

// ============================================================
// Profile
// ============================================================

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProfileParams {
    #[serde(default)]
    query: String,
    #[serde(default, rename = "queryCompare")]
    query_compare: String,
}

/// Profiles `query` (and `queryCompare`, when given) and returns the JSON
/// report. An empty request yields a report without profile.
pub(crate) async fn handle_profile<C: Connector + Send + Sync + 'static>(
    State(profiler): State<SharedProfiler<C>>,
    Query(params): Query<ProfileParams>,
) -> Result<Response, StatusCode> {
    let ceiling = profiler.config().max_execution_time;
    let request = ProfileRequest::new(params.query, params.query_compare);
    let deadline = Deadline::after(ceiling);

    // Collection is synchronous and may run for minutes.
    let task_deadline = deadline.clone();
    let task =
        tokio::task::spawn_blocking(move || profiler.profile_until(&request, &task_deadline));
    let joined = if ceiling.is_zero() {
        task.await
    } else {
        match tokio::time::timeout(ceiling, task).await {
            Ok(joined) => joined,
            Err(_) => {
                // Stops the blocking task before its next statement.
                deadline.cancel();
                warn!(?ceiling, "profiling exceeded execution time ceiling");
                return Err(StatusCode::GATEWAY_TIMEOUT);
            }
        }
    };

    let report = match joined {
        Ok(Ok(report)) => report,
        Ok(Err(e @ ProfileError::Timeout(_))) => {
            warn!(error = %e, "profiling aborted");
            return Err(StatusCode::GATEWAY_TIMEOUT);
        }
        Ok(Err(e @ ProfileError::Connection(_))) => {
            warn!(error = %e, "profiling failed");
            return Err(StatusCode::BAD_GATEWAY);
        }
        Err(e) => {
            error!(error = %e, "profiling task panicked");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    info!(
        comparison = report.profile.as_ref().is_some_and(|p| p.is_comparison()),
        "profile served"
    );

    let json = render_json(&report).map_err(|e| {
        error!(error = %e, "failed to serialize report");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Response::builder()
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
