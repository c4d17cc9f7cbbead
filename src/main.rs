//! Signal Router - Main Entry Point
//!
//! Loads bot configuration, wires each bot to its strategy and a paper
//! exchange, and serves the alert webhook.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use signal_router::adapters::{InMemoryPositionsStore, LogNotifier, PaperExchange, WebhookNotifier};
use signal_router::config::{load_config, AppConfig, StrategyTag};
use signal_router::router::{AlertRouter, Bot, BotRegistry, LoggingDominationHandler};
use signal_router::strategy::{PartialCloseStrategy, SharedStrategy};
use signal_router::{Notifier, WebhookServer};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Address to listen on; overrides server.bind_addr
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(&args.config))?;

    // Initialize logging
    let level_name = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    let level = match level_name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting signal router");
    info!("Configuration file: {}", args.config);

    let strategy = Arc::new(
        PartialCloseStrategy::new(Arc::new(InMemoryPositionsStore::new()))
            .with_entry_block_window(config.strategy.entry_block_window()),
    );
    let registry = Arc::new(build_registry(&config, strategy.clone())?);
    info!("Registered {} bots", registry.len());

    let sweep_every = config
        .strategy
        .entry_block_window()
        .to_std()
        .unwrap_or(Duration::from_secs(3600));
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        interval.tick().await;
        loop {
            interval.tick().await;
            strategy.purge_idle_state();
        }
    });

    let router = Arc::new(AlertRouter::new(registry, Arc::new(LoggingDominationHandler)));
    let bind_addr = args.bind.unwrap_or_else(|| config.server.bind_addr.clone());

    WebhookServer::new(router)
        .serve(&bind_addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal, cleaning up...");
        })
        .await?;

    sweeper.abort();
    Ok(())
}

fn build_registry(config: &AppConfig, strategy: SharedStrategy) -> Result<BotRegistry> {
    let notifier: Arc<dyn Notifier> = match &config.notifier {
        Some(settings) => Arc::new(WebhookNotifier::with_timeout(
            &settings.webhook_url,
            Duration::from_secs(settings.request_timeout_seconds),
        )?),
        None => Arc::new(LogNotifier),
    };

    let mut registry = BotRegistry::new();
    for bot_config in &config.bots {
        // Each bot trades on its own paper account.
        let exchange = Arc::new(PaperExchange::with_allowed_symbols(
            config.exchange.allowed_symbols.iter().cloned(),
        ));
        let tag = bot_config.strategy;
        let bot = Bot::new(bot_config.clone(), exchange, notifier.clone());
        let bot = match tag {
            StrategyTag::PartialClose => bot.with_strategy(strategy.clone()),
            StrategyTag::Domination => bot,
        };
        info!(bot = %bot.name(), strategy = %tag, "Bot registered");
        registry.register(bot);
    }

    Ok(registry)
}
