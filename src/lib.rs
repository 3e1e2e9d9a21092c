pub mod api;
pub mod backend;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        return cmd_init();
    }

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    match cli.command {
        Some(Commands::Serve) => run_server(config, prometheus_handle).await,
        Some(Commands::Init) => cmd_init(),
        Some(Commands::Categories) => cli::cmd_categories(config).await,
        Some(Commands::Models { category }) => cli::cmd_models(config, &category).await,
        Some(Commands::Products { category }) => cli::cmd_products(config, &category).await,
        Some(Commands::Search { query }) => cli::cmd_search(config, &query.join(" ")).await,
        None => {
            print_help();
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "voltshop")?
            .extra_field("backend", format!("{:?}", config.backend.kind).to_lowercase())?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

fn print_help() {
    println!("voltshop v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: voltshop <command>");
    println!();
    println!("Commands:");
    println!("  serve, daemon, -d       Run the HTTP server");
    println!("  init                    Create default config.toml");
    println!("  categories              List categories");
    println!("  models <category>       List the models of a category");
    println!("  products <category>     Show a category's products by model");
    println!("  search <query>          Search the catalog");
    println!();
    println!("Run 'voltshop help' for details.");
}

fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created config.toml with default settings.");
    } else {
        println!("config.toml already exists, leaving it untouched.");
    }
    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("voltshop v{} starting...", env!("CARGO_PKG_VERSION"));

    if !config.server.enabled {
        warn!("server.enabled is false, nothing to do");
        return Ok(());
    }

    let shared = Arc::new(SharedState::new(config.clone()).await?);

    if config.catalog.preload_categories {
        match shared.catalog_store.fetch_categories().await {
            Ok(categories) => info!(count = categories.len(), "Catalog store populated"),
            Err(e) => warn!("Initial category fetch failed: {}", e),
        }
    }

    let api_state = api::create_app_state(shared, prometheus_handle);

    let port = config.server.port;
    let app = api::router(api_state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    let server_handle = tokio::spawn(async move {
        info!("Web server running at http://0.0.0.0:{}", port);
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    info!("Server running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}
