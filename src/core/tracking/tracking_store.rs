use async_trait::async_trait;

use super::tracking_models::{GuildTrackingConfig, TrackingConfigPatch};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable storage for per-guild tracking records.
///
/// Implementations must flush after every mutation with atomic-replace
/// semantics: a crash between mutation and flush loses the mutation, it
/// never leaves a half-written document behind. The scheduler only reads;
/// commands are the single writer.
#[async_trait]
pub trait TrackingConfigStore: Send + Sync {
    async fn get(&self, guild_id: u64) -> Result<Option<GuildTrackingConfig>, StoreError>;

    /// Merge `patch` into the guild's record, creating it with defaults if
    /// absent. Returns the merged record.
    async fn upsert(
        &self,
        guild_id: u64,
        patch: TrackingConfigPatch,
    ) -> Result<GuildTrackingConfig, StoreError>;

    async fn set_active(&self, guild_id: u64, active: bool) -> Result<(), StoreError>;

    async fn all(&self) -> Result<Vec<GuildTrackingConfig>, StoreError>;
}
