//! File Share Control Plane
//!
//! Service entrypoint: wires the catalog, backend dispatcher, and
//! orchestrator together and hosts the REST API alongside health and
//! metrics endpoints.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fileshare_control_plane::{
    ApiServer, ApiServerConfig, CatalogRef, DeleteFailurePolicy, DispatcherRef, Error,
    HttpDriverConfig, HttpDriverDispatcher, LoopbackDispatcher, MemoryCatalog, Orchestrator,
    OrchestratorConfig, Profile, Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// File Share Control Plane - lifecycle orchestration for shares, snapshots, and ACLs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// REST API bind address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8090")]
    api_addr: String,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
    health_addr: String,

    /// Metrics server bind address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: String,

    /// Backend driver endpoint
    #[arg(long, env = "DRIVER_ENDPOINT", default_value = "http://fileshare-driver:50049")]
    driver_endpoint: String,

    /// What to do with a record whose backend delete fails: leave, revert
    #[arg(long, env = "DELETE_FAILURE_POLICY", default_value = "leave")]
    delete_failure_policy: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Run in standalone mode (in-memory catalog, loopback driver)
    #[arg(long, env = "STANDALONE")]
    standalone: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    info!("Starting File Share Control Plane");
    info!("  Version: {}", fileshare_control_plane::VERSION);
    info!("  REST API: {}", args.api_addr);
    info!("  Driver endpoint: {}", args.driver_endpoint);
    info!("  Standalone mode: {}", args.standalone);

    let delete_failure_policy = match args.delete_failure_policy.to_lowercase().as_str() {
        "leave" => DeleteFailurePolicy::LeaveForOperator,
        "revert" => DeleteFailurePolicy::Revert,
        other => {
            return Err(Error::Configuration(format!(
                "Invalid delete failure policy: {} (expected leave or revert)",
                other
            )))
        }
    };

    // Catalog. The in-memory adapter backs both standalone deployments and
    // tests; a persistent adapter plugs in through the same port.
    let catalog: CatalogRef = {
        let memory = Arc::new(MemoryCatalog::new());
        memory
            .register_profile(
                Profile {
                    id: fileshare_control_plane::model::new_resource_id(),
                    name: "default".into(),
                    description: "default file share profile".into(),
                    storage_type: "file".into(),
                    ..Default::default()
                },
                true,
            )
            .await;
        info!("In-memory catalog initialized with default profile");
        memory
    };

    // Backend dispatcher
    let dispatcher: DispatcherRef = if args.standalone {
        info!("Using loopback dispatcher");
        Arc::new(LoopbackDispatcher::default())
    } else {
        let driver_config = HttpDriverConfig {
            endpoint: args.driver_endpoint.clone(),
            ..Default::default()
        };
        Arc::new(HttpDriverDispatcher::new(driver_config)?)
    };

    // Orchestrator
    let orch_config = OrchestratorConfig {
        delete_failure_policy,
    };
    let orchestrator = Orchestrator::new(orch_config, catalog, dispatcher);
    info!("Orchestrator initialized");

    // Start health server
    let health_addr = args.health_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_health_server(&health_addr).await {
            error!("Health server error: {}", e);
        }
    });

    // Start metrics server
    let metrics_addr = args.metrics_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(&metrics_addr).await {
            error!("Metrics server error: {}", e);
        }
    });

    // Create and run API server
    let api_config = ApiServerConfig {
        rest_addr: args
            .api_addr
            .parse()
            .map_err(|e| Error::Configuration(format!("Invalid REST API address: {}", e)))?,
    };

    let api_server = ApiServer::new(api_config, orchestrator);

    info!("Starting API server");
    api_server.run().await?;

    info!("Control plane shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap())
        .add_directive("axum=info".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// Health Server
// =============================================================================

async fn run_health_server(addr: &str) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};

    let make_svc = make_service_fn(|_conn| async {
        Ok::<_, std::convert::Infallible>(service_fn(|req: Request<Body>| async move {
            let response = match req.uri().path() {
                "/healthz" | "/livez" => Response::builder()
                    .status(StatusCode::OK)
                    .body(Body::from("ok"))
                    .unwrap(),
                "/readyz" => Response::builder()
                    .status(StatusCode::OK)
                    .body(Body::from("ok"))
                    .unwrap(),
                _ => Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Body::from("not found"))
                    .unwrap(),
            };
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid health server address: {}", e)))?;

    info!("Health server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Health server error: {}", e)))?;

    Ok(())
}

// =============================================================================
// Metrics Server
// =============================================================================

async fn run_metrics_server(addr: &str) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};
    use prometheus::{Encoder, TextEncoder};

    // Register control-plane metrics
    let _ = prometheus::register_counter_vec!(
        "fileshare_control_plane_requests_total",
        "API requests by resource and operation",
        &["resource", "operation"]
    );
    let _ = prometheus::register_counter_vec!(
        "fileshare_control_plane_dispatch_failures_total",
        "Backend dispatch failures by operation",
        &["operation"]
    );
    let _ = prometheus::register_gauge!(
        "fileshare_control_plane_shares_total",
        "Number of file shares in the catalog"
    );
    let _ = prometheus::register_histogram!(
        "fileshare_control_plane_dispatch_duration_seconds",
        "Duration of backend dispatch operations"
    );

    let make_svc = make_service_fn(|_conn| async {
        Ok::<_, std::convert::Infallible>(service_fn(|req: Request<Body>| async move {
            let response = match req.uri().path() {
                "/metrics" => {
                    let encoder = TextEncoder::new();
                    let metric_families = prometheus::gather();
                    let mut buffer = Vec::new();
                    encoder.encode(&metric_families, &mut buffer).unwrap();

                    Response::builder()
                        .status(StatusCode::OK)
                        .header("Content-Type", encoder.format_type())
                        .body(Body::from(buffer))
                        .unwrap()
                }
                _ => Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Body::from("not found"))
                    .unwrap(),
            };
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid metrics server address: {}", e)))?;

    info!("Metrics server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Metrics server error: {}", e)))?;

    Ok(())
}
