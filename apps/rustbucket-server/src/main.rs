//! Rustbucket Server - S3 tools over a JSON-RPC SSE transport.
//!
//! This binary wires the S3 storage adapter from `rustbucket-s3` into the
//! SSE transport from `rustbucket-mcp`. Clients connect with `GET /sse`,
//! post JSON-RPC frames to the announced message endpoint, and invoke the
//! bucket and object tools remotely.
//!
//! # Usage
//!
//! ```text
//! MCP_LISTEN=0.0.0.0:9999 rustbucket-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MCP_LISTEN` | `0.0.0.0:9999` | Bind address |
//! | `MCP_KEEPALIVE_SECS` | `15` | Seconds between keepalive comments (0 disables) |
//! | `AWS_REGION` | `us-east-1` | Default region for bucket operations |
//! | `S3_ENDPOINT_URL` | *(unset)* | Endpoint override for S3-compatible backends |
//! | `AWS_ACCESS_KEY_ID` | *(unset)* | Static access key id |
//! | `AWS_SECRET_ACCESS_KEY` | *(unset)* | Static secret access key |
//! | `S3_MAX_BUCKETS` | `5` | Cap on bucket listings |
//! | `S3_OPERATION_TIMEOUT_SECS` | `30` | Per-operation backend timeout |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod resources;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rustbucket_mcp::{McpServerConfig, McpSseService, ResourceReader};
use rustbucket_s3::{ObjectStore, S3Config, S3ObjectStore, S3ResourceRouter, build_registry};

use crate::resources::ServerResources;

/// Server version, logged at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Guidance reported to clients during the initialize handshake.
const INSTRUCTIONS: &str = "An MCP server for interacting with S3 storage.";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `LOG_LEVEL`.
fn init_tracing() -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
        EnvFilter::try_new(&log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the transport configuration, attaching the server's instructions.
fn build_server_config() -> McpServerConfig {
    let mut config = McpServerConfig::from_env();
    config.instructions = Some(INSTRUCTIONS.to_owned());
    config
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<R: ResourceReader>(
    listener: TcpListener,
    service: McpSseService<R>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Event streams never end on their own; close every session so the
    // held-open responses can complete and connections can drain.
    service.sessions().close_all();
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the server and requesting the
/// health endpoint.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = McpServerConfig::from_env();
        let addr = config.listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing()?;

    let s3_config = S3Config::from_env();
    let server_config = build_server_config();

    info!(
        listen = %server_config.listen,
        keepalive_secs = server_config.keepalive_secs,
        region = %s3_config.region,
        endpoint_url = ?s3_config.endpoint_url,
        version = VERSION,
        "starting rustbucket server",
    );

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::connect(s3_config).await);
    let registry = build_registry(Arc::clone(&store))?;
    let router = S3ResourceRouter::new(store);

    let addr: SocketAddr = server_config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", server_config.listen))?;

    let service = McpSseService::new(registry, ServerResources(router), server_config);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
