// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Main Entry Point
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Entry point of the relay binary: loads configuration (TOML + env),
//   initializes structured logging, wires the production collaborators
//   (PostgreSQL sink and preference store when a database is configured,
//   HTTP translation backend when an inference endpoint is configured),
//   and serves the websocket/history API until shutdown.
//
// Architecture:
//   • Tokio multi-threaded runtime
//   • Axum web framework with websocket upgrade
//   • Explicitly constructed service container, no global state
//   • Structured logging with tracing
//   • Configuration via figment (TOML + environment variables)
//
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use babelon::auth::JwtAuth;
use babelon::backend::{HttpTranslationBackend, IdentityBackend};
use babelon::core::traits::{AuthProvider, MessageSink, PreferenceStore, TranslationBackend};
use babelon::core::Config;
use babelon::database::{MemoryMessageSink, MemoryPreferenceStore, PgMessageSink, PgPreferenceStore};
use babelon::service::Services;

mod cli;

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(e) = run(args).await {
        // Startup can fail before tracing is initialized.
        eprintln!("babelon: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: cli::Args) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref()).context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log.clone())),
        )
        .init();
    info!("🚀 Starting Babelon relay {}", cli::version());

    // Persistence collaborators: PostgreSQL when configured, in-memory
    // otherwise (development and single-process trials).
    let (sink, preferences): (Arc<dyn MessageSink>, Arc<dyn PreferenceStore>) =
        match &config.database_url {
            Some(url) => {
                let sink = PgMessageSink::connect(url)
                    .await
                    .context("connecting message sink")?;
                let preferences = PgPreferenceStore::with_pool(sink.pool().clone());
                info!("✅ PostgreSQL persistence attached");
                (Arc::new(sink), Arc::new(preferences))
            }
            None => {
                info!("🔧 No database configured, using in-memory persistence");
                (
                    Arc::new(MemoryMessageSink::new()),
                    Arc::new(MemoryPreferenceStore::new()),
                )
            }
        };

    let backend: Arc<dyn TranslationBackend> = match &config.translation_endpoint {
        Some(endpoint) => Arc::new(
            HttpTranslationBackend::new(endpoint.clone()).context("building translation client")?,
        ),
        None => Arc::new(IdentityBackend::announced()),
    };

    let auth = Arc::new(JwtAuth::new(&config.jwt_secret));
    let addr = config.socket_addr();
    let services = Services::build(config, backend, sink, auth, preferences);

    let app = babelon::api::router(Arc::clone(&services));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("✅ Relay listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving relay")?;

    services.shutdown().await;
    info!("🛑 Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("❌ Failed to listen for shutdown signal: {e}");
    } else {
        info!("⏳ Shutdown signal received, draining connections");
    }
}
