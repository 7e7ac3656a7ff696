//! mqprof - one-shot MySQL query profiler.
//!
//! Usage:
//!   mqprof --query "SELECT ..."                         # profile one query
//!   mqprof --query "SELECT ..." --compare "SELECT ..."  # compare two queries
//!   mqprof --query "SELECT ..." --json                  # machine-readable report

use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use mqprof::config::{ConnectionArgs, DEFAULT_WARM_UP_RUNS, ProfilerConfig};
use mqprof::profiler::{ProfileRequest, Profiler};
use mqprof::session::MysqlConnector;
use mqprof::view::{render_json, render_text};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Profiles one query, or compares two, on a MySQL server.
#[derive(Parser)]
#[command(name = "mqprof", about = "MySQL query profiler", version = mqprof::VERSION)]
struct Args {
    /// Query to profile.
    #[arg(long, short = 'e', default_value = "")]
    query: String,

    /// Second query to compare against the first.
    #[arg(long, short = 'c', default_value = "")]
    compare: String,

    /// Print the report as JSON instead of text tables.
    #[arg(long)]
    json: bool,

    /// Unmeasured runs before the status measurement.
    #[arg(long, default_value_t = DEFAULT_WARM_UP_RUNS, env = "MQP_WARM_UP_RUNS")]
    warm_up_runs: u32,

    /// Execution time ceiling per request, in seconds (0 = none).
    #[arg(long, default_value = "600", env = "MQP_MAX_EXECUTION_TIME")]
    max_execution_time: u64,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Increase verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let connection = match args.connection.into_config() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid connection settings");
            process::exit(1);
        }
    };

    let config = ProfilerConfig {
        warm_up_runs: args.warm_up_runs,
        max_execution_time: Duration::from_secs(args.max_execution_time),
        ..ProfilerConfig::default()
    };
    info!(
        version = mqprof::VERSION,
        host = %connection.host,
        port = connection.port,
        warm_up_runs = config.warm_up_runs,
        "starting"
    );

    let connector =
        MysqlConnector::new(connection).with_statement_timeout(config.max_execution_time);
    let profiler = Profiler::new(connector, config);

    let report = match profiler.profile(&ProfileRequest::new(args.query, args.compare)) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "profiling failed");
            process::exit(1);
        }
    };

    if args.json {
        match render_json(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!(error = %e, "failed to serialize report");
                process::exit(1);
            }
        }
    } else {
        print!("{}", render_text(&report));
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = match format!("mqprof={}", level).parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
