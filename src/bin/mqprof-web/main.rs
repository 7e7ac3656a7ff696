mod auth;
mod handlers;
mod state;

use std::net::{IpAddr, SocketAddr};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, header};
use axum::routing::get;
use clap::Parser;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mqprof::config::{ConnectionArgs, DEFAULT_WARM_UP_RUNS, ProfilerConfig};
use mqprof::profiler::Profiler;
use mqprof::session::{Connector, MysqlConnector};

use state::SharedProfiler;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(name = "mqprof-web", about = "mqprof HTTP profiling endpoint", version = mqprof::VERSION)]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:8080", env = "MQP_LISTEN")]
    listen: String,

    /// Comma-separated list of caller addresses allowed to profile.
    /// Empty admits everyone.
    #[arg(long = "allowed-ip", env = "MQP_ALLOWED_IPS", value_delimiter = ',')]
    allowed_ips: Vec<IpAddr>,

    /// Unmeasured runs before the status measurement.
    #[arg(long, default_value_t = DEFAULT_WARM_UP_RUNS, env = "MQP_WARM_UP_RUNS")]
    warm_up_runs: u32,

    /// Execution time ceiling per request, in seconds (0 = none).
    #[arg(long, default_value = "600", env = "MQP_MAX_EXECUTION_TIME")]
    max_execution_time: u64,

    #[command(flatten)]
    connection: ConnectionArgs,
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mqprof=info,mqprof_web=info")),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };
    runtime.block_on(async_main(args));
}

async fn async_main(args: Args) {
    let connection = match args.connection.into_config() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid connection settings");
            process::exit(1);
        }
    };
    let addr: SocketAddr = match args.listen.parse() {
        Ok(a) => a,
        Err(e) => {
            error!(listen = %args.listen, error = %e, "invalid listen address");
            process::exit(1);
        }
    };

    let config = ProfilerConfig {
        warm_up_runs: args.warm_up_runs,
        max_execution_time: Duration::from_secs(args.max_execution_time),
        allowed_ips: args.allowed_ips,
    };
    info!(
        version = mqprof::VERSION,
        mysql_host = %connection.host,
        mysql_port = connection.port,
        allowed_ips = config.allowed_ips.len(),
        "starting"
    );

    let connector =
        MysqlConnector::new(connection).with_statement_timeout(config.max_execution_time);
    let app = router(Arc::new(Profiler::new(connector, config)))
        .into_make_service_with_connect_info::<SocketAddr>();

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };
    info!(%addr, "listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        process::exit(1);
    }
}

fn router<C: Connector + Send + Sync + 'static>(profiler: SharedProfiler<C>) -> Router {
    let gated = Router::new()
        .route("/api/v1/profile", get(handlers::handle_profile::<C>))
        .route_layer(axum::middleware::from_fn_with_state(
            profiler.clone(),
            auth::allow_list_middleware::<C>,
        ));

    Router::new()
        .route("/api/v1/health", get(handlers::handle_health))
        .merge(gated)
        .with_state(profiler)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}
