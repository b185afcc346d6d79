//! Fihris bot — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config and secrets
//!   3. Init logger at the configured level (`RUST_LOG` wins when set)
//!   4. Refuse to start without a Telegram token when Telegram is enabled
//!   5. Open the catalog, build the agent
//!   6. Start channels and run until Ctrl-C or a channel fails

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fihris_bot::catalog::Catalog;
use fihris_bot::error::AppError;
use fihris_bot::library::LibraryAgent;
use fihris_bot::{comms, config, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level, false)?;

    info!(
        bot_name = %config.bot_name,
        db_path = %config.db_path.display(),
        log_level = %config.log_level,
        llm_provider = %config.llm.provider,
        "config loaded"
    );

    if config.comms_telegram_should_load() && config.telegram_token.is_none() {
        println!("❌ TELEGRAM_BOT_TOKEN is not set.");
        println!("Export it or add it to .env, or disable [comms.telegram] in the config.");
        std::process::exit(1);
    }

    let catalog = Catalog::open(&config.db_path)?;
    let agent = Arc::new(LibraryAgent::from_config(&config, catalog)?);

    let shutdown = CancellationToken::new();
    let channels = comms::start(&config, agent, shutdown.clone()).join();
    tokio::pin!(channels);

    println!("🤖 {} is running", config.bot_name);

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!("failed to listen for ctrl-c: {e}");
            }
            info!("shutdown requested");
            shutdown.cancel();
            (&mut channels).await
        }
        res = &mut channels => res,
    }
}
