//! jikoku-gateway: 時刻表ボットのメインバイナリ
//!
//! Usage:
//!   jikoku-gateway           - Start the LINE webhook server
//!   jikoku-gateway --help    - Show help
//!   jikoku-gateway --version - Show version

use std::sync::Arc;

use jikoku_core::{CardTemplate, Config, IconMap, ScheduleClient, SqliteUserRouteStore};
use jikoku_line::{LineBot, LineBotConfig};
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// Webhook server
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("jikoku-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting jikoku-gateway...");
    tracing::info!("Reply style: {:?}", config.reply.style);

    run_server(config).await
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("jikoku-gateway - LINE time-table bot");
    println!();
    println!("Usage:");
    println!("  jikoku-gateway           Start the webhook server");
    println!("  jikoku-gateway --help    Show this help message");
    println!("  jikoku-gateway --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  LINE_CHANNEL_SECRET        Channel secret (required)");
    println!("  LINE_CHANNEL_ACCESS_TOKEN  Channel access token (required)");
    println!("  WEB_SCRAPER_BASE_URL       Scraping server base URL (required)");
    println!("  WEB_SCRAPER_PATH           Scraping server path (default: time_table)");
    println!("  WEB_SCRAPER_TIMEOUT_SECS   Scraping request timeout (default: 10)");
    println!("  PORT                       Webhook port (default: 8000)");
    println!("  LINE_WEBHOOK_PATH          Webhook path (default: /callback)");
    println!("  DESIGN_DIR                 Card template directory (default: bundled)");
    println!("  ICONS_PATH                 Icon map JSON file (default: bundled)");
    println!("  DB_PATH                    SQLite database path (default: data/jikoku.db)");
    println!("  REPLY_STYLE                card or text (default: card)");
}

/// Wire up the services and serve until Ctrl+C
async fn run_server(config: Config) -> anyhow::Result<()> {
    let schedules = ScheduleClient::new(&config.scraper)
        .map_err(|e| anyhow::anyhow!("Failed to create scraper client: {}", e))?;
    tracing::info!("Scraping endpoint: {}", schedules.endpoint());

    let routes = SqliteUserRouteStore::new(&config.store.db_path)
        .map_err(|e| anyhow::anyhow!("Failed to open route store: {}", e))?;

    let template = CardTemplate::load(&config.design)
        .map_err(|e| anyhow::anyhow!("Failed to load card templates: {}", e))?;
    let icons = IconMap::load(&config.design)
        .map_err(|e| anyhow::anyhow!("Failed to load icon map: {}", e))?;

    let bot = LineBot::new(
        LineBotConfig::from(&config),
        Arc::new(schedules),
        Arc::new(routes),
        Arc::new(template),
        Arc::new(icons),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create LINE bot: {}", e))?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let mut handle = tokio::spawn(async move { bot.run(shutdown_rx).await });

    tracing::info!("Press Ctrl+C to exit");
    let result = tokio::select! {
        result = &mut handle => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutting down...");
            let _ = shutdown_tx.send(());
            handle.await
        }
    };

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(anyhow::anyhow!("LINE bot error: {}", e)),
        Err(e) => return Err(anyhow::anyhow!("LINE bot task failed: {}", e)),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
