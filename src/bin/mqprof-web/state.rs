//! Shared application state.

use std::sync::Arc;

use mqprof::profiler::Profiler;

/// Profiler shared by all requests. Holds configuration only; every request
/// opens its own sessions.
pub(crate) type SharedProfiler<C> = Arc<Profiler<C>>;
