//! Shared state for the comms channels — their only way into the agent.

use std::sync::Arc;

use tracing::debug;

use crate::library::{LibraryAgent, Reply};

pub struct CommsState {
    agent: Arc<LibraryAgent>,
}

impl CommsState {
    pub fn new(agent: Arc<LibraryAgent>) -> Self {
        Self { agent }
    }

    /// Hand `content` received on `channel_id` to the agent and return the
    /// replies to send back, in order.
    pub async fn handle_message(&self, channel_id: &str, content: &str) -> Vec<Reply> {
        let replies = self.agent.handle(content).await;
        debug!(channel_id, replies = replies.len(), "message handled");
        replies
    }
}
