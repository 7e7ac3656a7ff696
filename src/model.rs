//! Data models shared by collectors, the comparison engine, and views.
//!
//! Everything here is built fresh for one profiling request and dropped with
//! the report. All types serialize with serde so the report can be emitted as
//! JSON by the CLI and the web endpoint.

use std::collections::BTreeMap;

use serde::Serialize;

/// Status counter that holds a static cost estimate rather than a cumulative
/// counter. Carried through as the raw "after" value instead of a delta.
pub const LAST_QUERY_COST: &str = "Last_query_cost";

// ---------------------------------------------------------------------------
// RunPair
// ---------------------------------------------------------------------------

/// Position of a profiled query within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Run {
    First,
    Second,
}

impl Run {
    /// The opposite position.
    pub fn other(self) -> Run {
        match self {
            Run::First => Run::Second,
            Run::Second => Run::First,
        }
    }

    /// 1-based query number as shown to users.
    pub fn number(self) -> usize {
        match self {
            Run::First => 1,
            Run::Second => 2,
        }
    }
}

/// One value per profiled query: a single run, or two runs in comparison mode.
///
/// Never empty, so renderers can always rely on a first run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "Vec<T>")]
#[serde(bound(serialize = "T: Clone + Serialize"))]
pub enum RunPair<T> {
    Single(T),
    Pair(T, T),
}

impl<T> RunPair<T> {
    pub fn first(&self) -> &T {
        match self {
            RunPair::Single(a) | RunPair::Pair(a, _) => a,
        }
    }

    pub fn second(&self) -> Option<&T> {
        match self {
            RunPair::Single(_) => None,
            RunPair::Pair(_, b) => Some(b),
        }
    }

    pub fn get(&self, run: Run) -> Option<&T> {
        match run {
            Run::First => Some(self.first()),
            Run::Second => self.second(),
        }
    }

    /// True when two queries are being compared.
    pub fn is_comparison(&self) -> bool {
        matches!(self, RunPair::Pair(..))
    }

    pub fn len(&self) -> usize {
        match self {
            RunPair::Single(_) => 1,
            RunPair::Pair(..) => 2,
        }
    }

    pub fn each_ref(&self) -> RunPair<&T> {
        match self {
            RunPair::Single(a) => RunPair::Single(a),
            RunPair::Pair(a, b) => RunPair::Pair(a, b),
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Run, T) -> U) -> RunPair<U> {
        match self {
            RunPair::Single(a) => RunPair::Single(f(Run::First, a)),
            RunPair::Pair(a, b) => RunPair::Pair(f(Run::First, a), f(Run::Second, b)),
        }
    }

    /// Like [`RunPair::map`], stopping at the first error in query order.
    pub fn try_map<U, E>(
        self,
        mut f: impl FnMut(Run, T) -> Result<U, E>,
    ) -> Result<RunPair<U>, E> {
        Ok(match self {
            RunPair::Single(a) => RunPair::Single(f(Run::First, a)?),
            RunPair::Pair(a, b) => {
                let a = f(Run::First, a)?;
                RunPair::Pair(a, f(Run::Second, b)?)
            }
        })
    }

    /// Iterates values in query order together with their position.
    pub fn iter(&self) -> impl Iterator<Item = (Run, &T)> {
        [Some((Run::First, self.first())), self.second().map(|b| (Run::Second, b))]
            .into_iter()
            .flatten()
    }
}

impl<T> From<RunPair<T>> for Vec<T> {
    fn from(pair: RunPair<T>) -> Self {
        match pair {
            RunPair::Single(a) => vec![a],
            RunPair::Pair(a, b) => vec![a, b],
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Raw `SHOW STATUS` output: counter name to unparsed value.
pub type StatusSnapshot = BTreeMap<String, String>;

/// One entry of a [`StatusDelta`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusValue {
    /// `after - before` of a cumulative counter.
    Delta(i64),
    /// Raw "after" value of a special-cased counter.
    Raw(String),
}

impl StatusValue {
    /// Numeric view of the value, `None` for non-numeric raw values.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StatusValue::Delta(d) => Some(*d as f64),
            StatusValue::Raw(s) => parse_number(s),
        }
    }

    /// Zero check. Non-numeric raw values are considered non-zero.
    pub fn is_zero(&self) -> bool {
        self.as_number() == Some(0.0)
    }

    /// Loose equality: numeric when both sides parse, textual otherwise.
    pub fn same_as(&self, other: &StatusValue) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

/// Per-counter result of one status collection, ordered by counter name.
pub type StatusDelta = BTreeMap<String, StatusValue>;

/// Parses a status value the way the server prints numbers.
///
/// Accepts integers and decimals with optional sign and surrounding
/// whitespace. Rejects empty strings, `NaN`/`inf` and anything else.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let looks_numeric = !digits.is_empty()
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
        && digits.starts_with(|c: char| c.is_ascii_digit() || c == '.');
    if !looks_numeric {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Explain
// ---------------------------------------------------------------------------

/// One row of `EXPLAIN` output, passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExplainRow {
    pub id: Option<String>,
    pub select_type: Option<String>,
    pub table: Option<String>,
    #[serde(rename = "type")]
    pub access_type: Option<String>,
    pub possible_keys: Option<String>,
    pub key: Option<String>,
    pub key_len: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub rows: Option<String>,
    pub filtered: Option<String>,
    pub extra: Option<String>,
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// One execution phase reported by the profiling instrumentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStep {
    pub state: String,
    /// Seconds.
    pub duration: f64,
}

impl TraceStep {
    pub fn new(state: impl Into<String>, duration: f64) -> Self {
        Self {
            state: state.into(),
            duration,
        }
    }

    /// Label used to match steps across runs: trimmed and lower-cased.
    pub fn normalized_state(&self) -> String {
        self.state.trim().to_lowercase()
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration * 1000.0
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Which collector produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    Status,
    Explain,
    Trace,
}

impl std::fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorKind::Status => write!(f, "status"),
            CollectorKind::Explain => write!(f, "explain"),
            CollectorKind::Trace => write!(f, "trace"),
        }
    }
}

/// A collector that degraded to an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorFailure {
    pub collector: CollectorKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_accepts_server_formats() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("-7"), Some(-7.0));
        assert_eq!(parse_number("10.499000"), Some(10.499));
        assert_eq!(parse_number(" 3 "), Some(3.0));
        assert_eq!(parse_number(".5"), Some(0.5));
    }

    #[test]
    fn parse_number_rejects_text() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("ON"), None);
        assert_eq!(parse_number("TLSv1.2"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn status_value_loose_equality() {
        assert!(StatusValue::Delta(0).same_as(&StatusValue::Raw("0.000000".into())));
        assert!(StatusValue::Raw("abc".into()).same_as(&StatusValue::Raw("abc".into())));
        assert!(!StatusValue::Delta(1).same_as(&StatusValue::Delta(2)));
        assert!(!StatusValue::Raw("abc".into()).is_zero());
    }

    #[test]
    fn run_pair_accessors() {
        let single = RunPair::Single(1);
        assert_eq!(single.len(), 1);
        assert!(!single.is_comparison());
        assert_eq!(single.get(Run::Second), None);

        let pair = RunPair::Pair(1, 2).map(|run, v| v * 10 + run.number());
        assert_eq!(pair, RunPair::Pair(11, 22));
        let runs: Vec<Run> = pair.iter().map(|(run, _)| run).collect();
        assert_eq!(runs, vec![Run::First, Run::Second]);
    }

    #[test]
    fn run_pair_serializes_as_sequence() {
        let json = serde_json::to_string(&RunPair::Pair("a", "b")).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
    }

    #[test]
    fn status_value_serializes_untagged() {
        let mut delta = StatusDelta::new();
        delta.insert("Queries".into(), StatusValue::Delta(1));
        delta.insert(LAST_QUERY_COST.into(), StatusValue::Raw("1.5".into()));
        let json = serde_json::to_string(&delta).unwrap();
        assert_eq!(json, r#"{"Last_query_cost":"1.5","Queries":1}"#);
    }
}
