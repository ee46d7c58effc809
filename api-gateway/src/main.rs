//! Swap desk API server

use std::sync::Arc;

use api_gateway::{config::AppConfig, router, AppState};
use clap::Parser;
use common::error::{Error, IntoError, Result};
use dotenv::dotenv;
use quote_store::{open_store, StoreType, SwapStoreConfig};
use swap_engine::{RoutingTable, SwapEngine, SwapEngineConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};
use venue_gateway::{MarketDataGateway, OkxClient, OkxConfig, OrderGateway, SimulatedVenue};

/// Swap desk API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address, defaults to 127.0.0.1:$PORT
    #[clap(short, long)]
    addr: Option<String>,

    /// Trade against an in-process simulated venue instead of OKX
    #[clap(long)]
    simulated: bool,

    /// Keep quotes and executions in memory instead of PostgreSQL
    #[clap(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::CLOSE)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    debug!("Debug logging enabled");

    if let Err(e) = run(args, log_level).await {
        error!("Swap server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args, log_level: Level) -> Result<()> {
    let config = AppConfig::from_env();

    let store_type = if args.in_memory {
        StoreType::InMemory
    } else {
        StoreType::Postgres(SwapStoreConfig::from_env())
    };
    let store = open_store(store_type).await?;

    let (market_data, orders): (Arc<dyn MarketDataGateway>, Arc<dyn OrderGateway>) =
        if args.simulated {
            warn!("Trading against the simulated venue");
            let venue = Arc::new(SimulatedVenue::with_demo_market());
            let market_data: Arc<dyn MarketDataGateway> = venue.clone();
            let orders: Arc<dyn OrderGateway> = venue;
            (market_data, orders)
        } else {
            let client = Arc::new(OkxClient::new(&OkxConfig::from_env()?)?);
            info!("Trading against OKX");
            let market_data: Arc<dyn MarketDataGateway> = client.clone();
            let orders: Arc<dyn OrderGateway> = client;
            (market_data, orders)
        };

    let engine = SwapEngine::build(
        market_data,
        orders,
        store,
        RoutingTable::default_listing(),
        SwapEngineConfig::from_env(),
    )
    .await?;

    let dangling = engine.executions.dangling_legs().await?;
    if !dangling.is_empty() {
        warn!(count = dangling.len(), "Dangling execution legs need reconciliation");
    }

    let state = Arc::new(AppState { engine });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(log_level))
            .on_request(DefaultOnRequest::new().level(log_level))
            .on_response(DefaultOnResponse::new().level(log_level)),
    );

    // Start the server
    let addr = args.addr.unwrap_or_else(|| config.listen_addr());
    let addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| Error::ConfigurationError(format!("Invalid address {}: {}", addr, e)))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| e.into_error("Failed to bind listener"))?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| e.into_error("Server error"))?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
