//! jokes-submit - joke submission service
//!
//! Loads the TOML bootstrap config, resolves the submission root and serves
//! the submission endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use jokes_common::config::{resolve_submission_root, ConfigResolver};
use jokes_submit::config::SubmissionConfig;
use jokes_submit::{build_router, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "jokes-submit", version, about = "Joke submission service")]
struct Args {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory submissions are stored in
    #[arg(long)]
    submission_root: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(long, env = "JOKES_BIND_ADDRESS")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone());
    let (toml_config, config_source) = resolver.load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml_config.logging.level)),
        )
        .init();

    info!("Starting jokes-submit v{}", env!("CARGO_PKG_VERSION"));
    match config_source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => warn!(
            "No config file found{}, using built-in defaults",
            resolver
                .config_path()
                .map(|p| format!(" at {}", p.display()))
                .unwrap_or_default()
        ),
    }

    let submission_root = resolve_submission_root(args.submission_root.as_deref(), &toml_config);
    std::fs::create_dir_all(&submission_root).with_context(|| {
        format!("Failed to create submission root {}", submission_root.display())
    })?;
    info!("Submission root: {}", submission_root.display());

    let config = Arc::new(SubmissionConfig::from_toml(&toml_config, submission_root)?);
    info!(
        "Accepting format version {} in languages: {}",
        config.format_version,
        config.supported_languages.join(", ")
    );

    let state = AppState::from_config(config, toml_config.trust_proxy, toml_config.max_body_bytes);
    let app = build_router(state);

    let bind = args.bind.unwrap_or(toml_config.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("jokes-submit listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
