//! Storage Profiles
//!
//! Command line entry point: resolves single requests, serves the
//! resolution API, or prints the configuration schema.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storage_profiles::controlplane::registry;
use storage_profiles::domain::units::parse_capacity;
use storage_profiles::{
    ApiServer, ApiServerConfig, Error, Profile, ResolutionEngine, ResolutionMetrics,
    ResolverConfig, Result, VolumeRequest,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Storage Profiles - map gold/silver/bronze onto backend storage parameters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (YAML)
    #[arg(long, env = "STORAGE_PROFILES_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one request and print the parameters as JSON
    Resolve {
        /// Target backend name
        #[arg(long)]
        backend: String,

        /// Profile: gold, silver or bronze
        #[arg(long)]
        profile: Option<String>,

        /// Volume size (e.g. "100Gi")
        #[arg(long)]
        size: Option<String>,
    },

    /// Serve the REST API
    Serve {
        /// REST API bind address
        #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8090")]
        api_addr: String,

        /// Health server bind address
        #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
        health_addr: String,

        /// Metrics server bind address
        #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
        metrics_addr: String,

        /// Allow cross-origin requests
        #[arg(long, env = "CORS_PERMISSIVE")]
        cors_permissive: bool,
    },

    /// Print the configuration file JSON schema
    Schema,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    if let Command::Schema = args.command {
        println!("{}", ResolverConfig::json_schema()?);
        return Ok(());
    }

    let config = ResolverConfig::load(args.config.as_deref())?;
    let registry = registry::install_global(config.build_registry()?)?;
    let engine = Arc::new(ResolutionEngine::new(config.engine_config()?, registry));

    match args.command {
        Command::Resolve {
            backend,
            profile,
            size,
        } => {
            let mut request = VolumeRequest::new(backend);
            if let Some(name) = profile {
                request = request.with_profile(name.parse::<Profile>()?);
            }
            if let Some(size) = size {
                request = request.with_size(parse_capacity(&size)?);
            }

            let params = engine.resolve(&request)?;
            println!("{}", serde_json::to_string_pretty(&params)?);
            Ok(())
        }
        Command::Serve {
            api_addr,
            health_addr,
            metrics_addr,
            cors_permissive,
        } => serve(engine, api_addr, health_addr, metrics_addr, cors_permissive).await,
        Command::Schema => Ok(()),
    }
}

async fn serve(
    engine: Arc<ResolutionEngine>,
    api_addr: String,
    health_addr: String,
    metrics_addr: String,
    cors_permissive: bool,
) -> Result<()> {
    info!("Starting Storage Profiles resolver");
    info!("  Version: {}", storage_profiles::VERSION);
    info!("  REST API: {}", api_addr);
    info!("  Backends: {}", engine.registry().names().join(", "));
    info!("  Fallback policy: {}", engine.fallback_policy());
    info!("  Default volume size: {} bytes", engine.config().default_size_bytes);

    // Start health server
    tokio::spawn(async move {
        if let Err(e) = run_health_server(&health_addr).await {
            error!("Health server error: {}", e);
        }
    });

    // Start metrics server
    let metrics = engine.metrics().clone();
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(&metrics_addr, metrics).await {
            error!("Metrics server error: {}", e);
        }
    });

    let api_config = ApiServerConfig {
        rest_addr: api_addr.parse().map_err(|e| {
            Error::Configuration(format!("Invalid REST API address: {}", e))
        })?,
        cors_permissive,
    };

    let api_server = ApiServer::new(api_config, engine);

    let shutdown = api_server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, shutting down");
            let _ = shutdown.send(());
        }
    });

    api_server.run().await?;

    info!("Resolver shutdown complete");
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

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "tower=warn", "axum=info"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }

    // Logs go to stderr so `resolve` output stays machine-readable
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
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
            let (status, body) = match req.uri().path() {
                "/healthz" | "/livez" => (StatusCode::OK, "ok"),
                "/readyz" => match registry::global() {
                    Ok(r) if !r.is_empty() => (StatusCode::OK, "ok"),
                    _ => (StatusCode::SERVICE_UNAVAILABLE, "no backends registered"),
                },
                _ => (StatusCode::NOT_FOUND, "not found"),
            };
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    let addr: SocketAddr = addr.parse().map_err(|e| {
        Error::Configuration(format!("Invalid health server address: {}", e))
    })?;

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

async fn run_metrics_server(addr: &str, metrics: Arc<ResolutionMetrics>) -> Result<()> {
    use hyper::header::{HeaderValue, CONTENT_TYPE};
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};

    let make_svc = make_service_fn(move |_conn| {
        let metrics = metrics.clone();
        async move {
            Ok::<_, std::convert::Infallible>(service_fn(move |req: Request<Body>| {
                let metrics = metrics.clone();
                async move {
                    let (status, body) = match req.uri().path() {
                        "/metrics" => match metrics.encode_prometheus() {
                            Ok(text) => (StatusCode::OK, text),
                            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
                        },
                        _ => (StatusCode::NOT_FOUND, "not found".to_string()),
                    };
                    let mut response = Response::new(Body::from(body));
                    *response.status_mut() = status;
                    response.headers_mut().insert(
                        CONTENT_TYPE,
                        HeaderValue::from_static("text/plain; version=0.0.4"),
                    );
                    Ok::<_, std::convert::Infallible>(response)
                }
            }))
        }
    });

    let addr: SocketAddr = addr.parse().map_err(|e| {
        Error::Configuration(format!("Invalid metrics server address: {}", e))
    })?;

    info!("Metrics server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Metrics server error: {}", e)))?;

    Ok(())
}
