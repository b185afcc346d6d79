//! Console comms channel — reads lines from stdin, prints replies to stdout.
//!
//! Meant for local runs against a catalog file without a Telegram token.
//! Runs until the `shutdown` token is cancelled (Ctrl-C) or stdin closes.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::CommsState;
use crate::error::AppError;

/// Read lines from stdin until `shutdown` is cancelled or stdin closes.
pub async fn run(
    channel_id: &'static str,
    state: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!(channel_id, "pty channel started");
    println!("─────────────────────────────────");
    println!(" Fihris console  (Ctrl-C to quit)");
    println!("─────────────────────────────────");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("pty channel shutting down");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!("pty read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("pty stdin closed");
                        break;
                    }
                    Ok(Some(input)) => {
                        let input = input.trim();
                        if input.is_empty() { continue; }

                        debug!(input, "pty received line");
                        for reply in state.handle_message(channel_id, input).await {
                            println!("{}\n", reply.text);
                        }
                    }
                }
            }
        }
    }

    info!(channel_id, "pty channel stopped");
    Ok(())
}
