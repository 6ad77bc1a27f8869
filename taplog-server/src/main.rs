// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Taplog — request-log capture & delivery pipeline
//
//  Host:      axum demo endpoint with capture middleware
//  Delivery:  fire-and-forget publish onto the message bus
//  Consumer:  optional embedded listener rendering entries
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use axum::Router;
use axum::extract::{ConnectInfo, MatchedPath, Path, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use clap::Parser;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;
use taplog_bus::{MemoryBus, MessageBus};
use taplog_capture::{BusRequestLogger, EntryBuilder, RequestContext, RequestLogger, ResponseOutcome};
use taplog_consumer::{LogListener, console_handler};
use taplog_core::{MetricsCollector, TaplogConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "taplog", version, about = "Taplog — request-log capture & delivery pipeline")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/taplog/taplog.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone)]
struct AppState {
    logger: Arc<dyn RequestLogger>,
    metrics: Arc<MetricsCollector>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Taplog starting"
    );

    // ── Config ──
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        TaplogConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        TaplogConfig::default()
    };

    // ── Metrics ──
    let metrics = Arc::new(MetricsCollector::new(config.metrics.enabled)?);

    // ── Message bus ──
    let bus: Arc<dyn MessageBus> = Arc::new(MemoryBus::new(config.bus.capacity));
    info!(
        endpoint = %config.bus.endpoint,
        capacity = config.bus.capacity,
        "Message bus ready"
    );

    // ── Capture pipeline ──
    // One id counter for the whole process, shared by every capture call.
    let counter = Arc::new(AtomicU64::new(0));
    let builder = EntryBuilder::new(config.capture.policy(), counter);
    let logger: Arc<dyn RequestLogger> = Arc::new(BusRequestLogger::new(
        builder,
        Arc::clone(&bus),
        config.component.clone(),
        Arc::clone(&metrics),
    ));

    // ── Embedded reference consumer ──
    let listener = if config.consumer.enabled {
        let handle =
            LogListener::spawn(Arc::clone(&bus), console_handler(), Arc::clone(&metrics)).await?;
        info!("Embedded log listener started");
        Some(handle)
    } else {
        None
    };

    // ── Demo host ──
    let state = AppState {
        logger,
        metrics,
    };
    let app = Router::new()
        .route("/hello/{name}", get(hello))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn_with_state(state.clone(), capture))
        .with_state(state);

    let tcp = tokio::net::TcpListener::bind(&config.host.addr).await?;
    info!(addr = %config.host.addr, component = %config.component, "Demo host started");

    axum::serve(
        tcp,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Shutdown signal received, stopping...");

    // The listener finishes any in-flight handler before releasing its
    // subscription.
    if let Some(handle) = listener {
        handle.stop().await;
    }

    info!("Taplog stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// The single demo endpoint.
async fn hello(Path(name): Path<String>) -> String {
    format!("Hello {name}")
}

/// Prometheus metrics endpoint handler.
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// Capture middleware: time the request, assemble the context from what
/// the host knows, and hand off to the logger without touching the
/// response path.
async fn capture(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let path = request.uri().path().to_string();
    let kind = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| route_kind(m.as_str()));
    let headers = header_map(request.headers());

    let response = next.run(request).await;
    let duration = started.elapsed();

    let mut ctx = RequestContext::new(method, uri, path, peer.to_string());
    ctx.kind = kind;
    ctx.headers = headers;
    ctx.user_auth_id = ctx.header("x-user-auth-id").map(str::to_owned);
    ctx.session_id = ctx.header("x-session-id").map(str::to_owned);
    let status = response.status();
    let outcome = if status.is_client_error() || status.is_server_error() {
        ResponseOutcome::Failure(serde_json::json!({ "status": status.as_u16() }))
    } else {
        ResponseOutcome::Success(None)
    };

    // Fire and forget — the response goes out regardless of what the
    // logging path does.
    let logger = Arc::clone(&state.logger);
    tokio::spawn(async move {
        logger.log(Some(&ctx), Some(&outcome), duration).await;
    });

    response
}

/// Stable request-kind tag for a matched route: the first path segment of
/// the route pattern (`/hello/{name}` → `hello`).
fn route_kind(matched: &str) -> String {
    matched
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or("")
        .to_string()
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
