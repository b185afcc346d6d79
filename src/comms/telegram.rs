//! Telegram comms channel — long-polls the Bot API, hands each text message
//! to the agent and sends the replies back in order.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{BotCommand, ParseMode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::CommsState;
use crate::error::AppError;
use crate::library::{Reply, router};

// ── Constants ────────────────────────────────────────────────────────────────

/// Telegram has a 4096 character limit per message.
/// Agent replies are already chunked smaller; this is the last guard.
const MAX_MESSAGE_LENGTH: usize = 4000;

// ── run ──────────────────────────────────────────────────────────────────────

/// Long-poll the Bot API until `shutdown` is cancelled.
pub async fn run(
    channel_id: &'static str,
    token: String,
    state: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!(channel_id, "telegram channel starting");

    let bot = Bot::new(token);

    let commands: Vec<BotCommand> = router::COMMANDS
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect();
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!(channel_id, "failed to register bot commands: {e}");
    }

    let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let state = state.clone();
        async move {
            if let Some(text) = msg.text() {
                debug!(
                    channel_id,
                    chat_id = ?msg.chat.id,
                    from = ?msg.from.as_ref().and_then(|u| u.username.as_ref()),
                    "telegram received message"
                );
                for reply in state.handle_message(channel_id, text).await {
                    send_reply(&bot, msg.chat.id, &reply).await;
                }
            }
            respond(())
        }
    });

    let mut dispatcher = Dispatcher::builder(bot, handler).build();
    info!(channel_id, "telegram channel polling");

    tokio::select! {
        biased;

        _ = shutdown.cancelled() => {
            info!(channel_id, "shutdown signal received, closing telegram channel");
        }
        _ = dispatcher.dispatch() => {
            warn!(channel_id, "telegram dispatcher exited unexpectedly");
        }
    }

    info!(channel_id, "telegram channel stopped");
    Ok(())
}

/// Send one agent reply, splitting at the platform limit.
///
/// Markdown replies that Telegram refuses to parse (stray `*` or `_` in a
/// catalog title) are re-sent as plain text.
async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply) {
    for chunk in platform_chunks(&reply.text) {
        if reply.markdown {
            #[allow(deprecated)]
            let sent = bot.send_message(chat_id, chunk.clone()).parse_mode(ParseMode::Markdown).await;
            match sent {
                Ok(_) => continue,
                Err(e) => debug!(?chat_id, "markdown reply rejected, resending as plain text: {e}"),
            }
        }
        if let Err(e) = bot.send_message(chat_id, chunk).await {
            warn!(?chat_id, "failed to send telegram reply: {e}");
        }
    }
}

fn platform_chunks(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(MAX_MESSAGE_LENGTH).map(|c| c.iter().collect()).collect()
}
