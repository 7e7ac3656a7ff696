//! Per-run execution trace tables.

use crate::compare::TraceComparison;
use crate::fmt::{capitalize, format_ms};
use crate::model::Run;
use crate::view::common::{RowStyleClass, TableViewModel, ViewCell, ViewRow};

const HEADERS: &[&str] = &["STATE", "DURATION (ms)"];

/// Builds the trace table of one run, closed by a total line.
///
/// Steps the other run does not have are styled as different. An empty
/// trace still yields the total line.
pub fn build_trace_view(run: Run, trace: &TraceComparison, comparison: bool) -> TableViewModel {
    let title = if comparison {
        format!("Trace: query {}", run.number())
    } else {
        "Trace".to_string()
    };
    let mut view = TableViewModel::new(title, HEADERS, &[false, true]);

    for annotated in &trace.steps {
        let style = if annotated.differs {
            RowStyleClass::Different
        } else {
            RowStyleClass::Normal
        };
        view.rows.push(
            ViewRow::new(vec![
                ViewCell::plain(capitalize(annotated.step.state.trim())),
                ViewCell::plain(format_ms(annotated.step.duration_ms())),
            ])
            .with_style(style),
        );
    }

    view.rows.push(
        ViewRow::new(vec![
            ViewCell::plain("Total".to_string()),
            ViewCell::plain(format_ms(trace.total_ms)),
        ])
        .with_style(RowStyleClass::Summary),
    );
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_traces;
    use crate::model::{RunPair, TraceStep};

    #[test]
    fn steps_are_capitalized_with_total() {
        let traces = compare_traces(&RunPair::Single(vec![
            TraceStep::new("starting", 0.000047),
            TraceStep::new("sending data", 0.0125),
        ]));

        let view = build_trace_view(Run::First, traces.first(), false);

        assert_eq!(view.title, "Trace");
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.rows[0].cells[0].text, "Starting");
        assert_eq!(view.rows[0].cells[1].text, "0.047");
        assert_eq!(view.rows[1].cells[0].text, "Sending data");
        assert_eq!(view.rows[2].cells[0].text, "Total");
        assert_eq!(view.rows[2].cells[1].text, "12.547");
        assert_eq!(view.rows[2].style, RowStyleClass::Summary);
    }

    #[test]
    fn divergent_step_is_styled() {
        let traces = compare_traces(&RunPair::Pair(
            vec![TraceStep::new("init", 0.001), TraceStep::new("optimizing", 0.001)],
            vec![TraceStep::new("init", 0.001)],
        ));

        let view = build_trace_view(Run::First, traces.first(), true);

        assert_eq!(view.title, "Trace: query 1");
        assert_eq!(view.rows[0].style, RowStyleClass::Normal);
        assert_eq!(view.rows[1].style, RowStyleClass::Different);
    }

    #[test]
    fn empty_trace_renders_zero_total() {
        let traces = compare_traces(&RunPair::Single(Vec::new()));
        let view = build_trace_view(Run::First, traces.first(), false);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].cells[1].text, "0.000");
    }
}
