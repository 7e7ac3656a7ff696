//! Renderer-agnostic table types.
//!
//! Views build these from report data; the text renderer (or any other
//! frontend) maps the style classes to its own highlighting.

/// Row- or cell-level highlight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowStyleClass {
    #[default]
    Normal,
    /// Key counter such as the optimizer cost (text: `!` marker).
    Important,
    /// Strictly lower side of a differing counter (text: `*` marker).
    Better,
    /// Trace step missing from the other run (text: `~` marker).
    Different,
    /// Table-level summary line (totals).
    Summary,
}

/// A single table cell with optional per-cell style override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewCell {
    pub text: String,
    /// `None` = inherit row style.
    pub style: Option<RowStyleClass>,
    /// Cell covers every remaining column.
    pub span_rest: bool,
}

impl ViewCell {
    pub fn plain(text: String) -> Self {
        Self {
            text,
            style: None,
            span_rest: false,
        }
    }

    pub fn styled(text: String, style: RowStyleClass) -> Self {
        Self {
            text,
            style: Some(style),
            span_rest: false,
        }
    }

    pub fn spanning(mut self) -> Self {
        self.span_rest = true;
        self
    }

    pub fn effective_style(&self, row: RowStyleClass) -> RowStyleClass {
        self.style.unwrap_or(row)
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub cells: Vec<ViewCell>,
    pub style: RowStyleClass,
}

impl ViewRow {
    pub fn new(cells: Vec<ViewCell>) -> Self {
        Self {
            cells,
            style: RowStyleClass::Normal,
        }
    }

    pub fn with_style(mut self, style: RowStyleClass) -> Self {
        self.style = style;
        self
    }
}

/// Complete table ready to be rendered by any frontend.
#[derive(Debug, Clone, PartialEq)]
pub struct TableViewModel {
    pub title: String,
    pub headers: Vec<String>,
    /// Columns rendered right-aligned.
    pub numeric: Vec<bool>,
    pub rows: Vec<ViewRow>,
}

impl TableViewModel {
    pub fn new(title: impl Into<String>, headers: &[&str], numeric: &[bool]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            numeric: numeric.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn is_numeric(&self, column: usize) -> bool {
        self.numeric.get(column).copied().unwrap_or(false)
    }
}
