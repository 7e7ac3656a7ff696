//! Side-by-side comparison of one or two profiled runs.
//!
//! Turns the per-run collector outputs into rows ready for tabular display:
//! - status counters merged by name, with the lower side of each differing
//!   counter marked better
//! - trace steps flagged when their label does not occur in the other run

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::model::{LAST_QUERY_COST, Run, RunPair, StatusDelta, StatusValue, TraceStep};

const STATUS_DOC_URL: &str =
    "https://dev.mysql.com/doc/refman/en/server-status-variables.html#statvar_";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Values of one counter across the compared runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowValues {
    /// Single run, equal values, or a counter only one run reported.
    Same { value: StatusValue },
    /// Two differing values. `better` is the strictly lower side when both
    /// values are numeric.
    Split {
        first: StatusValue,
        second: StatusValue,
        better: Option<Run>,
    },
}

/// One status counter line of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub name: String,
    pub values: RowValues,
}

impl ComparisonRow {
    /// Highlighted counters: the optimizer's cost estimate.
    pub fn is_important(&self) -> bool {
        self.name == LAST_QUERY_COST
    }

    /// Server manual anchor describing this counter.
    pub fn doc_url(&self) -> String {
        format!("{}{}", STATUS_DOC_URL, self.name)
    }

    pub fn better(&self) -> Option<Run> {
        match self.values {
            RowValues::Same { .. } => None,
            RowValues::Split { better, .. } => better,
        }
    }
}

/// Merges the status deltas of all runs into display rows sorted by name.
///
/// Rows whose visible values are all zero are dropped. Lower is always
/// considered better, whatever the counter measures.
pub fn compare_status(deltas: &RunPair<StatusDelta>) -> Vec<ComparisonRow> {
    let first = deltas.first();
    let second = deltas.second();

    let names: BTreeSet<&String> = first
        .keys()
        .chain(second.into_iter().flat_map(|d| d.keys()))
        .collect();

    names
        .into_iter()
        .filter_map(|name| {
            let a = first.get(name);
            let b = second.and_then(|d| d.get(name));
            compare_counter(a, b).map(|values| ComparisonRow {
                name: name.clone(),
                values,
            })
        })
        .collect()
}

fn compare_counter(a: Option<&StatusValue>, b: Option<&StatusValue>) -> Option<RowValues> {
    match (a, b) {
        (Some(a), Some(b)) if !a.same_as(b) => {
            if a.is_zero() && b.is_zero() {
                return None;
            }
            let better = match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) if x < y => Some(Run::First),
                (Some(x), Some(y)) if y < x => Some(Run::Second),
                _ => None,
            };
            Some(RowValues::Split {
                first: a.clone(),
                second: b.clone(),
                better,
            })
        }
        (Some(v), _) | (None, Some(v)) => {
            (!v.is_zero()).then(|| RowValues::Same { value: v.clone() })
        }
        (None, None) => None,
    }
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// A trace step with its cross-run divergence flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedStep {
    #[serde(flatten)]
    pub step: TraceStep,
    /// The other run has no step with the same normalized label.
    pub differs: bool,
}

/// Trace of one run prepared for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceComparison {
    pub steps: Vec<AnnotatedStep>,
    /// Sum of step durations, in milliseconds.
    pub total_ms: f64,
}

/// Flags the steps of each run whose label the other run lacks.
///
/// Labels are matched trimmed and case-insensitively; step order plays no
/// part. With a single run nothing is flagged.
pub fn compare_traces(traces: &RunPair<Vec<TraceStep>>) -> RunPair<TraceComparison> {
    let labels = traces.each_ref().map(|_, steps| label_set(steps));

    traces.each_ref().map(|run, steps| {
        let other = labels.get(run.other());
        TraceComparison {
            total_ms: total_duration_ms(steps),
            steps: steps
                .iter()
                .map(|step| AnnotatedStep {
                    differs: other.is_some_and(|set| !set.contains(&step.normalized_state())),
                    step: step.clone(),
                })
                .collect(),
        }
    })
}

fn label_set(steps: &[TraceStep]) -> HashSet<String> {
    steps.iter().map(TraceStep::normalized_state).collect()
}

/// Sum of step durations converted to milliseconds. `0.0` when empty.
pub fn total_duration_ms(steps: &[TraceStep]) -> f64 {
    steps.iter().fold(0.0, |acc, step| acc + step.duration_ms())
}
