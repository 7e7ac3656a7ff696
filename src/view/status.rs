//! Status counter comparison table.

use crate::compare::{ComparisonRow, RowValues};
use crate::fmt::format_status_value;
use crate::model::{Run, StatusValue};
use crate::view::common::{RowStyleClass, TableViewModel, ViewCell, ViewRow};

const SINGLE_HEADERS: &[&str] = &["COUNTER", "VALUE"];
const PAIR_HEADERS: &[&str] = &["COUNTER", "QUERY 1", "QUERY 2"];

/// Builds the status table from merged comparison rows.
///
/// Equal values in comparison mode span both value columns.
pub fn build_status_view(rows: &[ComparisonRow], comparison: bool) -> TableViewModel {
    let mut view = if comparison {
        TableViewModel::new("Status", PAIR_HEADERS, &[false, true, true])
    } else {
        TableViewModel::new("Status", SINGLE_HEADERS, &[false, true])
    };

    for row in rows {
        let mut cells = vec![ViewCell::plain(row.name.clone())];
        match &row.values {
            RowValues::Same { value } => {
                let cell = ViewCell::plain(format_status_value(value));
                cells.push(if comparison { cell.spanning() } else { cell });
            }
            RowValues::Split {
                first,
                second,
                better,
            } => {
                cells.push(value_cell(first, *better == Some(Run::First)));
                cells.push(value_cell(second, *better == Some(Run::Second)));
            }
        }

        let style = if row.is_important() {
            RowStyleClass::Important
        } else {
            RowStyleClass::Normal
        };
        view.rows.push(ViewRow::new(cells).with_style(style));
    }
    view
}

fn value_cell(value: &StatusValue, better: bool) -> ViewCell {
    let text = format_status_value(value);
    if better {
        ViewCell::styled(text, RowStyleClass::Better)
    } else {
        ViewCell::plain(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(name: &str, a: i64, b: i64, better: Option<Run>) -> ComparisonRow {
        ComparisonRow {
            name: name.to_string(),
            values: RowValues::Split {
                first: StatusValue::Delta(a),
                second: StatusValue::Delta(b),
                better,
            },
        }
    }

    #[test]
    fn single_run_has_two_columns() {
        let rows = vec![ComparisonRow {
            name: "Queries".into(),
            values: RowValues::Same {
                value: StatusValue::Delta(1),
            },
        }];

        let view = build_status_view(&rows, false);

        assert_eq!(view.headers, vec!["COUNTER", "VALUE"]);
        assert_eq!(view.rows[0].cells[1].text, "1");
        assert!(!view.rows[0].cells[1].span_rest);
    }

    #[test]
    fn better_side_is_styled() {
        let rows = [split("Handler_read_next", 1000, 1, Some(Run::Second))];
        let view = build_status_view(&rows, true);

        let cells = &view.rows[0].cells;
        assert_eq!(cells[1].style, None);
        assert_eq!(cells[2].style, Some(RowStyleClass::Better));
    }

    #[test]
    fn same_value_spans_in_comparison() {
        let rows = vec![ComparisonRow {
            name: "Queries".into(),
            values: RowValues::Same {
                value: StatusValue::Delta(1),
            },
        }];
        let view = build_status_view(&rows, true);
        assert_eq!(view.rows[0].cells.len(), 2);
        assert!(view.rows[0].cells[1].span_rest);
    }

    #[test]
    fn cost_row_is_important() {
        let rows = vec![ComparisonRow {
            name: "Last_query_cost".into(),
            values: RowValues::Same {
                value: StatusValue::Raw("10.499000".into()),
            },
        }];
        let view = build_status_view(&rows, false);
        assert_eq!(view.rows[0].style, RowStyleClass::Important);
        assert_eq!(view.rows[0].cells[1].text, "10");
    }
}
