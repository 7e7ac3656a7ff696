//! Database session abstraction.
//!
//! Collectors only need two capabilities from the server: run a statement and
//! read back its rows, or run a statement and discard whatever it returns.
//! The `Session` trait captures exactly that so collectors can run against a
//! real MySQL connection or a scripted [`MockSession`] in tests.
//!
//! A [`Connector`] opens independent sessions on demand. The profiler opens a
//! fresh one per profiled query (see [`crate::collector::TraceCollector`]).

pub mod mock;
mod mysql;

pub use self::mysql::{MysqlConnector, MysqlSession};
pub use mock::{MockConnector, MockSession, StatementLog};

/// Error type for session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session could not be established.
    Connection(String),
    /// A statement failed on an established session.
    Statement { statement: String, message: String },
    /// Statement refused because the request ran out of time.
    Aborted,
}

impl SessionError {
    pub(crate) fn statement(statement: &str, message: impl Into<String>) -> Self {
        SessionError::Statement {
            statement: statement.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Connection(msg) => write!(f, "MySQL: {}", msg),
            SessionError::Statement { statement, message } => {
                write!(f, "MySQL statement error ({}): {}", statement, message)
            }
            SessionError::Aborted => write!(f, "aborted: execution time ceiling reached"),
        }
    }
}

impl std::error::Error for SessionError {}

/// One result row: column names paired with values in column order.
///
/// Values are kept as text the way the server's text protocol delivers them.
/// `None` is SQL `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Option<String>)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append.
    pub fn with(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.push(name, value.map(str::to_string));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.columns.push((name.into(), value));
    }

    /// Value of the first column named `name`. Outer `None` means no such
    /// column, inner `None` means `NULL`.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    /// Like [`Row::get`], matching the column name case-insensitively.
    pub fn get_ignore_case(&self, name: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref())
    }

    /// Non-NULL text value of column `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).flatten()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A single exclusive connection to the database server.
pub trait Session {
    /// Runs `statement` and returns all rows of its first result set.
    fn query(&mut self, statement: &str) -> Result<Vec<Row>, SessionError>;

    /// Runs `statement`, discarding any result sets.
    fn execute(&mut self, statement: &str) -> Result<(), SessionError>;
}

/// Opens new, independent sessions.
pub trait Connector {
    type Session: Session;

    fn open(&self) -> Result<Self::Session, SessionError>;
}
