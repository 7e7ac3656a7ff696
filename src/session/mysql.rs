//! MySQL session backed by the `mysql` crate.

use std::time::Duration;

use ::mysql::prelude::Queryable;
use ::mysql::{Conn, OptsBuilder, Value};
use tracing::debug;

use super::{Connector, Row, Session, SessionError};
use crate::config::ConnectionConfig;

/// Opens one `MysqlSession` per call with the configured credentials.
///
/// `statement_timeout` is applied as socket read/write timeout.
#[derive(Debug, Clone)]
pub struct MysqlConnector {
    config: ConnectionConfig,
    statement_timeout: Option<Duration>,
}

impl MysqlConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            statement_timeout: None,
        }
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    fn opts(&self) -> OptsBuilder {
        let c = &self.config;
        OptsBuilder::new()
            .ip_or_hostname(Some(c.host.clone()))
            .tcp_port(c.port)
            .user(c.user.clone())
            .pass(c.password.clone())
            .db_name(c.database.clone())
            .read_timeout(self.statement_timeout)
            .write_timeout(self.statement_timeout)
    }
}

impl Connector for MysqlConnector {
    type Session = MysqlSession;

    fn open(&self) -> Result<MysqlSession, SessionError> {
        let conn = Conn::new(self.opts())
            .map_err(|e| SessionError::Connection(format_mysql_error(&e)))?;
        debug!(host = %self.config.host, port = self.config.port, "mysql session opened");
        Ok(MysqlSession { conn })
    }
}

/// One exclusive MySQL connection.
pub struct MysqlSession {
    conn: Conn,
}

impl Session for MysqlSession {
    fn query(&mut self, statement: &str) -> Result<Vec<Row>, SessionError> {
        let rows: Vec<::mysql::Row> = self
            .conn
            .query(statement)
            .map_err(|e| SessionError::statement(statement, format_mysql_error(&e)))?;
        Ok(rows.into_iter().map(convert_row).collect())
    }

    fn execute(&mut self, statement: &str) -> Result<(), SessionError> {
        self.conn
            .query_drop(statement)
            .map_err(|e| SessionError::statement(statement, format_mysql_error(&e)))
    }
}

fn convert_row(row: ::mysql::Row) -> Row {
    let columns = row.columns();
    let values = row.unwrap();
    let mut out = Row::new();
    for (column, value) in columns.iter().zip(values) {
        out.push(column.name_str().into_owned(), value_to_text(value));
    }
    out
}

/// Renders a protocol value the way the `mysql` command-line client prints it.
fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Value::Int(v) => Some(v.to_string()),
        Value::UInt(v) => Some(v.to_string()),
        Value::Float(v) => Some(v.to_string()),
        Value::Double(v) => Some(v.to_string()),
        Value::Date(y, mo, d, h, mi, s, us) => Some(if us > 0 {
            format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}.{us:06}")
        } else {
            format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")
        }),
        Value::Time(neg, days, h, mi, s, us) => {
            let sign = if neg { "-" } else { "" };
            let hours = days * 24 + u32::from(h);
            Some(if us > 0 {
                format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}")
            } else {
                format!("{sign}{hours:02}:{mi:02}:{s:02}")
            })
        }
    }
}

/// Formats MySQL error message for display.
pub(crate) fn format_mysql_error(e: &::mysql::Error) -> String {
    match e {
        ::mysql::Error::MySqlError(server) => {
            format!("{} ({}): {}", server.code, server.state, server.message)
        }
        other => {
            let msg = other.to_string();
            if msg.contains("Connection refused") {
                "connection refused".to_string()
            } else {
                msg
            }
        }
    }
}
