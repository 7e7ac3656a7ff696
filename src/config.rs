//! Runtime configuration passed explicitly into the profiler and backends.

use std::net::IpAddr;
use std::time::Duration;

/// Warm-up runs before the measured status run.
pub const DEFAULT_WARM_UP_RUNS: u32 = 3;

/// Ceiling for one profiling request. Generous because heavy queries run
/// `warm_up_runs + 3` times.
pub const DEFAULT_MAX_EXECUTION_TIME: Duration = Duration::from_secs(600);

/// Profiling behavior, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilerConfig {
    pub warm_up_runs: u32,
    pub max_execution_time: Duration,
    /// Caller addresses allowed to profile. Empty admits everyone.
    pub allowed_ips: Vec<IpAddr>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            warm_up_runs: DEFAULT_WARM_UP_RUNS,
            max_execution_time: DEFAULT_MAX_EXECUTION_TIME,
            allowed_ips: Vec::new(),
        }
    }
}

impl ProfilerConfig {
    /// Whether a request from `addr` may be processed at all.
    pub fn permits(&self, addr: &IpAddr) -> bool {
        if self.allowed_ips.is_empty() {
            return true;
        }
        let addr = canonical(addr);
        self.allowed_ips.iter().any(|allowed| canonical(allowed) == addr)
    }
}

/// IPv4-mapped IPv6 addresses (`::ffff:10.0.0.1`) compare as their IPv4 form.
fn canonical(addr: &IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(*v6)),
        v4 => *v4,
    }
}

/// Error type for configuration loading.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable holds a value that cannot be used.
    InvalidEnv { var: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidEnv { var, value } => {
                write!(f, "invalid value for {}: '{}'", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// MySQL connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: None,
            password: None,
            database: None,
        }
    }
}

impl ConnectionConfig {
    /// Reads the environment variables understood by the `mysql` client:
    /// - MYSQL_HOST (default: localhost)
    /// - MYSQL_TCP_PORT (default: 3306)
    /// - MYSQL_USER (default: $USER)
    /// - MYSQL_PWD (default: none)
    /// - MYSQL_DATABASE (default: none)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = match lookup("MYSQL_TCP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnv {
                var: "MYSQL_TCP_PORT".to_string(),
                value: raw.clone(),
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host: lookup("MYSQL_HOST")
                .filter(|h| !h.is_empty())
                .unwrap_or(defaults.host),
            port,
            user: lookup("MYSQL_USER").or_else(|| lookup("USER")),
            password: lookup("MYSQL_PWD"),
            database: lookup("MYSQL_DATABASE").filter(|d| !d.is_empty()),
        })
    }
}

/// Connection flags shared by both binaries. Unset flags keep the value
/// read by [`ConnectionConfig::from_env`].
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConnectionArgs {
    /// MySQL server host.
    #[arg(long)]
    pub host: Option<String>,

    /// MySQL server TCP port.
    #[arg(long)]
    pub port: Option<u16>,

    /// MySQL user name.
    #[arg(long)]
    pub user: Option<String>,

    /// MySQL password.
    #[arg(long)]
    pub password: Option<String>,

    /// Default database for unqualified table names.
    #[arg(long)]
    pub database: Option<String>,
}

impl ConnectionArgs {
    pub fn into_config(self) -> Result<ConnectionConfig, ConfigError> {
        Ok(self.apply(ConnectionConfig::from_env()?))
    }

    fn apply(self, base: ConnectionConfig) -> ConnectionConfig {
        ConnectionConfig {
            host: self.host.unwrap_or(base.host),
            port: self.port.unwrap_or(base.port),
            user: self.user.or(base.user),
            password: self.password.or(base.password),
            database: self.database.or(base.database),
        }
    }
}
