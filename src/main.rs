//! trpg-dice - tabletop RPG dice bot for Discord
//!
//! Rolls dice expressions, judges Call of Cthulhu checks, runs sanity
//! checks and keeps per-user character sheets on disk.

mod commands;
mod common;
mod config;
mod dice;
mod discord;
mod rules;
mod sheet;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use commands::{CommandParser, Dispatcher};
use common::error::{AppError, SheetError};
use common::ResourceTables;
use config::{env::get_config_path, load_and_validate};
use dice::{Dice, LocalDice};
use discord::{CommandHandler, DiscordBotBuilder};
use sheet::SheetStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("trpg-dice v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        AppError::from(e)
    })?;

    info!("Configuration loaded successfully");
    info!("  Prefixes: {:?}", config.discord.prefixes);
    info!("  Data directory: {}", config.storage.data_dir);
    info!("  Default die: d{}", config.dice.default_faces);
    info!("  True random: {}", config.true_random.enabled);
    info!("  Flavor text: {}", config.flavor.enabled);

    let tables = Arc::new(ResourceTables::load(
        &config.storage.phobias,
        &config.storage.manias,
    ));
    let store = open_store(&config.storage.data_dir).await?;

    let dice: Arc<dyn Dice> = if config.true_random.enabled {
        Arc::new(dice::entropy::start(&config.true_random))
    } else {
        Arc::new(LocalDice)
    };

    let dispatcher = Dispatcher::new(store, dice, tables, &config);
    let handler = CommandHandler::new(CommandParser::new(&config.discord.prefixes), dispatcher);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let discord_bot = DiscordBotBuilder::new(config.discord.token.clone(), handler, shutdown_rx)
        .build()
        .await?;

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(discord_bot.run());

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - disconnecting...");
            true
        }
        _ = &mut discord_task => false,
    };

    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (Discord task already exited): {}", e);
        }
        match tokio::time::timeout(Duration::from_secs(5), discord_task).await {
            Ok(Ok(())) => info!("Discord disconnected gracefully"),
            Ok(Err(e)) => warn!("Discord task panicked: {}", e),
            Err(_) => warn!("Discord shutdown timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
}

/// Open the sheet store, creating its root directory if needed.
async fn open_store(data_dir: &str) -> Result<SheetStore, AppError> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|source| SheetError::Io {
            path: data_dir.to_string(),
            source,
        })?;
    let store = SheetStore::new(data_dir)?;
    info!("Character sheets stored under {}", store.root().display());
    Ok(store)
}

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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
