//! Scripted in-memory sessions for testing collectors without a MySQL server.
//!
//! A `MockSession` answers statements from a script keyed by the exact
//! statement text. Unscripted statements succeed with no rows. Every
//! statement is appended to a shared [`StatementLog`] so tests can assert
//! what was sent and in which order, even after the session was moved into
//! the code under test.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Connector, Row, Session, SessionError};

/// Shared, ordered record of statements a mock session received.
pub type StatementLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone)]
enum Reply {
    Rows(Vec<Row>),
    Fail(String),
}

/// In-memory session driven by a statement script.
///
/// Replies queued for the same statement are consumed in order; the last
/// one keeps answering once the queue is down to a single entry.
#[derive(Debug, Default)]
pub struct MockSession {
    script: HashMap<String, VecDeque<Reply>>,
    log: StatementLog,
    latency: Duration,
}

impl MockSession {
    /// Creates a session where every statement succeeds with no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `rows` as the next answer to `statement`.
    pub fn on(mut self, statement: &str, rows: Vec<Row>) -> Self {
        self.push(statement, Reply::Rows(rows));
        self
    }

    /// Queues a failure as the next answer to `statement`.
    pub fn on_error(mut self, statement: &str, message: &str) -> Self {
        self.push(statement, Reply::Fail(message.to_string()));
        self
    }

    /// Makes every statement take `latency` after it is logged.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Handle to the statement log, valid after the session is moved.
    pub fn log(&self) -> StatementLog {
        Arc::clone(&self.log)
    }

    /// Statements received so far.
    pub fn executed(&self) -> Vec<String> {
        snapshot_log(&self.log)
    }

    fn push(&mut self, statement: &str, reply: Reply) {
        self.script
            .entry(statement.to_string())
            .or_default()
            .push_back(reply);
    }

    fn reply(&mut self, statement: &str) -> Reply {
        if let Ok(mut log) = self.log.lock() {
            log.push(statement.to_string());
        }
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        match self.script.get_mut(statement) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Reply::Rows(Vec::new())),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::Rows(Vec::new())),
            None => Reply::Rows(Vec::new()),
        }
    }
}

impl Session for MockSession {
    fn query(&mut self, statement: &str) -> Result<Vec<Row>, SessionError> {
        match self.reply(statement) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Fail(msg) => Err(SessionError::statement(statement, msg)),
        }
    }

    fn execute(&mut self, statement: &str) -> Result<(), SessionError> {
        self.query(statement).map(|_| ())
    }
}

/// Copies the current contents of a statement log.
pub fn snapshot_log(log: &StatementLog) -> Vec<String> {
    log.lock().map(|l| l.clone()).unwrap_or_default()
}

/// Hands out pre-built mock sessions in order.
///
/// Opening more sessions than were queued fails with a connection error.
#[derive(Debug, Default)]
pub struct MockConnector {
    sessions: Mutex<VecDeque<MockSession>>,
    refuse: Option<String>,
}

impl MockConnector {
    pub fn new(sessions: Vec<MockSession>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            refuse: None,
        }
    }

    /// Connector whose every `open` fails like an unreachable server.
    pub fn refusing(message: &str) -> Self {
        Self {
            sessions: Mutex::default(),
            refuse: Some(message.to_string()),
        }
    }

    /// Number of sessions not yet handed out.
    pub fn remaining(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl Connector for MockConnector {
    type Session = MockSession;

    fn open(&self) -> Result<MockSession, SessionError> {
        if let Some(ref msg) = self.refuse {
            return Err(SessionError::Connection(msg.clone()));
        }
        self.sessions
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .ok_or_else(|| SessionError::Connection("no mock session left".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Server scenarios
// ---------------------------------------------------------------------------

/// `SHOW STATUS` result rows.
pub fn status_rows(counters: &[(&str, &str)]) -> Vec<Row> {
    counters
        .iter()
        .map(|&(name, value)| {
            Row::new()
                .with("Variable_name", Some(name))
                .with("Value", Some(value))
        })
        .collect()
}

/// `INFORMATION_SCHEMA.PROFILING` result rows.
pub fn profiling_rows(steps: &[(&str, f64)]) -> Vec<Row> {
    steps
        .iter()
        .map(|&(state, duration)| {
            let duration = format!("{:.6}", duration);
            Row::new()
                .with("STATE", Some(state))
                .with("DURATION", Some(duration.as_str()))
        })
        .collect()
}

/// An `EXPLAIN` row for a full scan of `table`.
pub fn full_scan_explain_row(table: &str, rows: &str) -> Row {
    Row::new()
        .with("id", Some("1"))
        .with("select_type", Some("SIMPLE"))
        .with("table", Some(table))
        .with("partitions", None)
        .with("type", Some("ALL"))
        .with("possible_keys", None)
        .with("key", None)
        .with("key_len", None)
        .with("ref", None)
        .with("rows", Some(rows))
        .with("filtered", Some("100.00"))
        .with("Extra", Some("Using where"))
}

/// An `EXPLAIN` row for a primary key lookup on `table`.
pub fn const_lookup_explain_row(table: &str) -> Row {
    Row::new()
        .with("id", Some("1"))
        .with("select_type", Some("SIMPLE"))
        .with("table", Some(table))
        .with("partitions", None)
        .with("type", Some("const"))
        .with("possible_keys", Some("PRIMARY,idx_email"))
        .with("key", Some("PRIMARY"))
        .with("key_len", Some("4"))
        .with("ref", Some("const"))
        .with("rows", Some("1"))
        .with("filtered", Some("100.00"))
        .with("Extra", None)
}
