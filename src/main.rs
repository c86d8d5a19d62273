mod config;
mod cors;
mod error;
mod payload;
mod relay;
mod server;
mod telegram;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AllowedOrigins, Config};
use crate::relay::Relay;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,contact_relay=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Telegram API: {}", config.telegram.api_base);
    match &config.cors.allowed_origins {
        AllowedOrigins::Any => info!("  Allowed origins: *"),
        AllowedOrigins::List(list) => info!("  Allowed origins: {:?}", list),
    }
    if config.telegram.credentials().is_none() {
        warn!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set; submissions will be refused");
    }

    let messenger = Arc::new(TelegramClient::new(config.telegram.api_base.clone()));
    let relay = Arc::new(Relay::new(config, messenger));

    server::run(relay).await
}
