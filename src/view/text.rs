//! Plain-text table renderer used by the CLI.
//!
//! Row markers: `!` key counter, `~` step missing from the other run.
//! Cell marker: `*` after the better value.

use crate::view::common::{RowStyleClass, TableViewModel, ViewCell};

const COLUMN_GAP: &str = "  ";

fn row_marker(style: RowStyleClass) -> &'static str {
    match style {
        RowStyleClass::Important => "! ",
        RowStyleClass::Different => "~ ",
        RowStyleClass::Normal | RowStyleClass::Better | RowStyleClass::Summary => "  ",
    }
}

fn cell_text(cell: &ViewCell, row: RowStyleClass) -> String {
    match cell.effective_style(row) {
        RowStyleClass::Better => format!("{} *", cell.text),
        _ => cell.text.clone(),
    }
}

fn column_widths(view: &TableViewModel) -> Vec<usize> {
    let mut widths: Vec<usize> = view.headers.iter().map(|h| h.chars().count()).collect();
    for row in &view.rows {
        for (i, cell) in row.cells.iter().enumerate() {
            if cell.span_rest {
                break;
            }
            let len = cell_text(cell, row.style).chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }
    widths
}

fn pad(text: &str, width: usize, right: bool) -> String {
    if right {
        format!("{:>width$}", text, width = width)
    } else {
        format!("{:<width$}", text, width = width)
    }
}

/// Renders a table with a title line, a header line and aligned columns.
pub fn render_table(view: &TableViewModel) -> String {
    let widths = column_widths(view);
    let mut out = String::new();
    out.push_str(&view.title);
    out.push('\n');

    let header: Vec<String> = view
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad(h, widths[i], view.is_numeric(i)))
        .collect();
    push_line(&mut out, "  ", &header.join(COLUMN_GAP));

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, "  ", &rule.join(COLUMN_GAP));

    for row in &view.rows {
        let mut parts = Vec::with_capacity(row.cells.len());
        for (i, cell) in row.cells.iter().enumerate() {
            let text = cell_text(cell, row.style);
            if cell.span_rest {
                parts.push(text);
                break;
            }
            let width = widths.get(i).copied().unwrap_or(0);
            parts.push(pad(&text, width, view.is_numeric(i)));
        }
        push_line(&mut out, row_marker(row.style), &parts.join(COLUMN_GAP));
    }
    out
}

fn push_line(out: &mut String, marker: &str, body: &str) {
    out.push_str(marker);
    out.push_str(body.trim_end());
    out.push('\n');
}
