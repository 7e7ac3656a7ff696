//! Caller address allow-list.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use mqprof::session::Connector;

use crate::state::SharedProfiler;

pub(crate) const ACCESS_DENIED: &str = "Access denied.";

/// Rejects callers outside the configured allow-list before any work is done.
pub(crate) async fn allow_list_middleware<C: Connector + Send + Sync + 'static>(
    State(profiler): State<SharedProfiler<C>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    if profiler.config().permits(&addr.ip()) {
        return next.run(req).await;
    }

    warn!(addr = %addr.ip(), path = %req.uri().path(), "request from address outside allow-list");
    (
        StatusCode::FORBIDDEN,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from(ACCESS_DENIED),
    )
        .into_response()
}
