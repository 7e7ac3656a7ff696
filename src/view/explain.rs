//! `EXPLAIN` plan table.

use crate::fmt::{format_filtered, format_key_list};
use crate::model::{ExplainRow, RunPair};
use crate::view::common::{RowStyleClass, TableViewModel, ViewCell, ViewRow};

const HEADERS: &[&str] = &[
    "ID",
    "SELECT_TYPE",
    "TABLE",
    "TYPE",
    "POSSIBLE_KEYS",
    "KEY",
    "KEY_LEN",
    "REF",
    "ROWS",
    "FILTERED",
    "EXTRA",
];
const NUMERIC: &[bool] = &[
    true, false, false, false, false, false, true, false, true, true, false,
];

/// Builds one plan table holding every run's rows.
///
/// In comparison mode each run's rows follow a `Query N` separator line.
pub fn build_explain_view(plans: &RunPair<Vec<ExplainRow>>) -> TableViewModel {
    let mut view = TableViewModel::new("Explain", HEADERS, NUMERIC);

    for (run, rows) in plans.iter() {
        if plans.is_comparison() {
            view.rows.push(
                ViewRow::new(vec![
                    ViewCell::plain(format!("Query {}", run.number())).spanning(),
                ])
                .with_style(RowStyleClass::Summary),
            );
        }
        view.rows.extend(rows.iter().map(plan_row));
    }
    view
}

fn plan_row(row: &ExplainRow) -> ViewRow {
    let text = |v: &Option<String>| ViewCell::plain(v.clone().unwrap_or_default());
    ViewRow::new(vec![
        text(&row.id),
        text(&row.select_type),
        text(&row.table),
        text(&row.access_type),
        ViewCell::plain(format_key_list(row.possible_keys.as_deref())),
        text(&row.key),
        text(&row.key_len),
        text(&row.reference),
        text(&row.rows),
        ViewCell::plain(format_filtered(row.filtered.as_deref())),
        text(&row.extra),
    ])
}
