//! Report rendering.
//!
//! Each sub-module builds a [`common::TableViewModel`] from report data; the
//! [`text`] renderer turns those into the CLI output. [`ReportDocument`] is
//! the JSON shape shared by the CLI and the web endpoint.

pub mod common;
pub mod explain;
pub mod status;
pub mod text;
pub mod trace;

use serde::Serialize;

use crate::compare::{ComparisonRow, TraceComparison};
use crate::fmt::format_timestamp;
use crate::model::RunPair;
use crate::profiler::{Profile, Report};

/// JSON document: the raw report plus the derived comparison rows.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    #[serde(flatten)]
    pub report: &'a Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_rows: Option<Vec<ComparisonRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_comparison: Option<RunPair<TraceComparison>>,
}

impl<'a> ReportDocument<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self {
            report,
            status_rows: report.profile.as_ref().map(Profile::status_rows),
            trace_comparison: report.profile.as_ref().map(Profile::trace_comparison),
        }
    }
}

/// Serializes a report as pretty-printed JSON.
pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ReportDocument::new(report))
}

/// Renders a report as plain text: queries, status, traces, plan.
pub fn render_text(report: &Report) -> String {
    let mut out = format!("Generated at {} UTC\n", format_timestamp(report.generated_at));

    let Some(profile) = &report.profile else {
        out.push_str("No query submitted.\n");
        return out;
    };
    let comparison = profile.is_comparison();

    for (run, query) in profile.queries.iter() {
        out.push_str(&format!("Query {}: {}\n", run.number(), query));
    }

    let status_rows = profile.status_rows();
    out.push('\n');
    out.push_str(&text::render_table(&status::build_status_view(&status_rows, comparison)));
    if status_rows.is_empty() {
        out.push_str("  (no counters changed)\n");
    }

    for (run, trace) in profile.trace_comparison().iter() {
        out.push('\n');
        out.push_str(&text::render_table(&trace::build_trace_view(run, trace, comparison)));
    }

    out.push('\n');
    out.push_str(&text::render_table(&explain::build_explain_view(&profile.explain)));

    let failures: Vec<String> = profile
        .failures
        .iter()
        .flat_map(|(run, list)| {
            list.iter().map(move |f| {
                format!("  query {}: {} unavailable: {}\n", run.number(), f.collector, f.message)
            })
        })
        .collect();
    if !failures.is_empty() {
        out.push_str("\nMissing diagnostics\n");
        out.extend(failures);
    }

    out.push_str("\n! key counter  * better value  ~ step missing from the other query\n");
    out
}
