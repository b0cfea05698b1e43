//! recyclo-sv - disposal advisor service
//!
//! Startup order: command line, bootstrap TOML, tracing, policy, database,
//! optional classifier client, then the HTTP server. Any configuration
//! error aborts startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use recyclo_common::classifier::LabelSet;
use recyclo_common::config::{resolve_config_path, ConfigOverrides, PolicyConfig, TomlConfig};
use recyclo_common::db::init_database;
use recyclo_common::{ConfidenceGate, DecisionEngine};
use recyclo_sv::services::HttpClassifier;
use recyclo_sv::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for recyclo-sv
#[derive(Parser, Debug)]
#[command(name = "recyclo-sv")]
#[command(about = "Recycling disposal advisor service")]
#[command(version)]
struct Args {
    /// Bootstrap TOML file
    #[arg(short, long, env = "RECYCLO_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "RECYCLO_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "RECYCLO_HOST")]
    host: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "RECYCLO_DATABASE")]
    database: Option<PathBuf>,

    /// Disposal policy TOML replacing the built-in rules
    #[arg(long, env = "RECYCLO_RULES")]
    rules: Option<PathBuf>,

    /// JSON array of model class names
    #[arg(long, env = "RECYCLO_CLASS_NAMES")]
    class_names: Option<PathBuf>,

    /// Inference endpoint for /api/classify
    #[arg(long, env = "RECYCLO_CLASSIFIER_URL")]
    classifier_url: Option<String>,

    /// Abstain below this confidence
    #[arg(long, env = "RECYCLO_THRESHOLD")]
    threshold: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let settings = TomlConfig::load(config_path.as_deref())
        .await
        .context("Failed to load configuration")?
        .resolve(ConfigOverrides {
            database_path: args.database,
            host: args.host,
            port: args.port,
            confidence_threshold: args.threshold,
            class_names_path: args.class_names,
            rules_path: args.rules,
            classifier_url: args.classifier_url,
        });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "recyclo_sv={level},recyclo_common={level},tower_http={level}",
                    level = settings.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recyclo service v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => info!("No configuration file, using defaults"),
    }

    let gate = ConfidenceGate::new(settings.confidence_threshold).context("Invalid confidence threshold")?;
    let policy = PolicyConfig::load(settings.rules_path.as_deref())
        .await
        .context("Failed to load disposal rules")?;
    let labels = LabelSet::load_or_default(settings.class_names_path.as_deref());
    info!(
        "Confidence threshold {:.2}, {} classes",
        gate.threshold(),
        labels.len()
    );

    info!("Database path: {}", settings.database_path.display());
    let pool = init_database(&settings.database_path)
        .await
        .context("Failed to initialize database")?;

    let mut state = AppState::new(pool, DecisionEngine::new(policy, gate), labels);
    match &settings.classifier_url {
        Some(url) => {
            let classifier = HttpClassifier::new(url.clone()).context("Failed to create classifier client")?;
            info!("Classifier endpoint: {}", classifier.url());
            state = state.with_classifier(Arc::new(classifier));
        }
        None => info!("No classifier configured; /api/classify disabled"),
    }

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", settings.host, settings.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("recyclo-sv listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
