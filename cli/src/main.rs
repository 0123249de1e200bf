//! CLI entrypoint for braid
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use braid_application::{
    ChatEventBus, ConversationController, ModelCatalog, TelemetryPoller,
};
use braid_infrastructure::{
    ConfigLoader, FilePreferences, OllamaGateway, SqliteStore, SysinfoProbe,
};
use braid_presentation::{ChatRepl, Cli};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting braid");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };

    // === Dependency Injection ===
    let db_path = config
        .storage
        .resolved_db_path()
        .context("could not resolve a database location")?;
    let store = Arc::new(SqliteStore::open(&db_path).map_err(|e| anyhow::anyhow!(e))?);
    info!(path = %db_path.display(), "opened conversation store");

    let bus = Arc::new(ChatEventBus::new());
    let gateway = Arc::new(OllamaGateway::new(
        config.ollama.base_url.clone(),
        bus.clone(),
    ));

    let preferences = Arc::new(
        FilePreferences::default_location()
            .context("could not resolve a config location for preferences")?,
    );

    let mut catalog = ModelCatalog::new(gateway.clone(), preferences).await;
    // An offline backend at startup is not fatal; the catalog can be
    // refreshed later from the REPL.
    if let Err(e) = catalog.refresh().await {
        eprintln!("Warning: could not reach the model service: {e}");
    }
    if let Some(model) = &cli.model {
        catalog.select(model).await;
    }

    let mut controller = ConversationController::new(store, gateway, bus.clone());
    controller.refresh_conversations().await;

    let probe = Arc::new(SysinfoProbe::new(&config.ollama.base_url));
    let telemetry = TelemetryPoller::new(
        probe,
        Duration::from_secs(config.telemetry.interval_seconds),
    )
    .spawn();

    let mut repl = ChatRepl::new(controller, catalog, bus, telemetry);

    match cli.message {
        Some(message) => {
            let message = message.trim().to_string();
            if message.is_empty() {
                bail!("Message is empty. Run without arguments for interactive mode.");
            }
            repl.one_shot(&message).await;
        }
        None => repl.run().await?,
    }

    Ok(())
}
