//! mqprof - MySQL query profiler library.
//!
//! Runs one or two SQL queries against a MySQL server and collects, per query:
//! - `SHOW STATUS` counter deltas around a measured run
//! - the `EXPLAIN` plan rows
//! - the `INFORMATION_SCHEMA.PROFILING` timing trace
//!
//! The outputs of both queries are compared side by side. Shared between:
//! - `mqprof` - one-shot CLI printing a text or JSON report
//! - `mqprof-web` - JSON-over-HTTP profiling endpoint

pub mod collector;
pub mod compare;
pub mod config;
pub mod fmt;
pub mod model;
pub mod profiler;
pub mod session;
pub mod view;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
