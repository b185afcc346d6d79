//! Comms subsystem — the chat transports.
//!
//! Each channel (Telegram, console) is a plain async run-loop that shares an
//! [`Arc<CommsState>`] and stops when the shutdown token is cancelled.
//! [`start`] spawns the configured channels into one [`ChannelSet`]; the
//! first channel to fail cancels the token so the others wind down too.

mod state;
#[cfg(feature = "channel-pty")]
pub mod pty;
#[cfg(feature = "channel-telegram")]
pub mod telegram;

pub use state::CommsState;

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::library::LibraryAgent;

/// Running chat channels.
pub struct ChannelSet {
    tasks: JoinSet<(String, Result<(), AppError>)>,
    shutdown: CancellationToken,
}

impl ChannelSet {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { tasks: JoinSet::new(), shutdown }
    }

    /// Spawn one channel run-loop under `channel_id`.
    pub fn spawn<F>(&mut self, channel_id: &str, run: F)
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        debug!(channel_id, "spawning channel");
        let id = channel_id.to_string();
        self.tasks.spawn(async move { (id, run.await) });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every channel to exit and return the first error.
    ///
    /// A failing or panicking channel cancels the shared token.
    pub async fn join(mut self) -> Result<(), AppError> {
        let mut first_err: Option<AppError> = None;

        while let Some(res) = self.tasks.join_next().await {
            match res {
                Ok((channel_id, Ok(()))) => debug!(%channel_id, "channel exited"),
                Ok((channel_id, Err(e))) => {
                    error!(%channel_id, "channel failed: {e}");
                    self.shutdown.cancel();
                    first_err.get_or_insert(e);
                }
                Err(e) => {
                    error!("channel task panicked: {e}");
                    self.shutdown.cancel();
                    first_err.get_or_insert_with(|| AppError::Comms(format!("channel task panicked: {e}")));
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Spawn all configured channels.
///
/// Synchronous: returns as soon as the tasks are spawned.
pub fn start(config: &Config, agent: Arc<LibraryAgent>, shutdown: CancellationToken) -> ChannelSet {
    let state = Arc::new(CommsState::new(agent));
    let mut channels = ChannelSet::new(shutdown.clone());

    #[cfg(feature = "channel-telegram")]
    {
        if config.comms_telegram_should_load() {
            match &config.telegram_token {
                Some(token) => {
                    info!("loading telegram channel");
                    channels.spawn(
                        "telegram0",
                        telegram::run("telegram0", token.clone(), state.clone(), shutdown.clone()),
                    );
                }
                None => warn!("telegram channel enabled but TELEGRAM_BOT_TOKEN is not set"),
            }
        }
    }

    #[cfg(feature = "channel-pty")]
    {
        if config.comms_pty_should_load() {
            info!("loading pty channel");
            channels.spawn("pty0", pty::run("pty0", state.clone(), shutdown.clone()));
        }
    }

    if channels.is_empty() {
        warn!("no comms channels configured");
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clean_channels_join_ok() {
        let mut channels = ChannelSet::new(CancellationToken::new());
        channels.spawn("a", async { Ok::<(), AppError>(()) });
        channels.spawn("b", async { Ok::<(), AppError>(()) });
        assert_eq!(channels.len(), 2);
        assert!(channels.join().await.is_ok());
    }

    #[tokio::test]
    async fn failing_channel_stops_the_others() {
        let shutdown = CancellationToken::new();
        let mut channels = ChannelSet::new(shutdown.clone());

        let waiter = shutdown.clone();
        channels.spawn("console", async move {
            waiter.cancelled().await;
            Ok::<(), AppError>(())
        });
        channels.spawn("telegram", async { Err::<(), _>(AppError::Comms("bad token".into())) });

        let err = channels.join().await.unwrap_err();
        assert!(err.to_string().contains("bad token"));
        assert!(shutdown.is_cancelled());
    }

    fn explode() -> Result<(), AppError> {
        panic!("boom")
    }

    #[tokio::test]
    async fn panicking_channel_is_reported() {
        let shutdown = CancellationToken::new();
        let mut channels = ChannelSet::new(shutdown.clone());
        channels.spawn("broken", async { explode() });
        assert!(matches!(channels.join().await, Err(AppError::Comms(_))));
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn no_channels_when_both_disabled() {
        let mut cfg = Config::test_default(std::path::Path::new("/nonexistent/library.db"));
        cfg.comms.pty.enabled = false;
        cfg.comms.telegram.enabled = false;
        let catalog = crate::catalog::Catalog::unchecked(&cfg.db_path);
        let agent = Arc::new(LibraryAgent::from_config(&cfg, catalog).unwrap());
        let channels = start(&cfg, agent, CancellationToken::new());
        assert!(channels.is_empty());
        assert!(channels.join().await.is_ok());
    }
}
