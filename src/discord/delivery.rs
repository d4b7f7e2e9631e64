use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

use crate::core::tracking::{DeliveryError, StatsSink};

/// Sends tick output through Discord. Lives behind the `StatsSink` trait so
/// the scheduler never touches serenity types and can be tested without a
/// gateway connection.
pub struct DiscordStatsSink {
    http: Arc<serenity::Http>,
}

impl DiscordStatsSink {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl StatsSink for DiscordStatsSink {
    async fn deliver(&self, channel_id: u64, message: &str) -> Result<(), DeliveryError> {
        serenity::ChannelId::new(channel_id)
            .say(&self.http, message)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError(e.to_string()))
    }
}
