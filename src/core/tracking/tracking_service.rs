use super::tracking_models::{GuildTrackingConfig, TrackingConfigPatch, MIN_INTERVAL_SECS};
use super::tracking_store::{StoreError, TrackingConfigStore};

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("interval must be at least {floor} seconds (got {requested})")]
    IntervalTooLow { requested: u64, floor: u64 },
    #[error("milestone step must be greater than zero")]
    InvalidStep,
}

/// Owns all authoritative per-guild tracking state. Commands mutate through
/// here; the scheduler only reads (`config`), so no write coordination
/// beyond the store's single-writer discipline is needed.
pub struct TrackingService<S: TrackingConfigStore> {
    store: S,
}

impl<S: TrackingConfigStore> TrackingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn config(&self, guild_id: u64) -> Result<Option<GuildTrackingConfig>, TrackingError> {
        Ok(self.store.get(guild_id).await?)
    }

    pub async fn all_configs(&self) -> Result<Vec<GuildTrackingConfig>, TrackingError> {
        Ok(self.store.all().await?)
    }

    pub async fn set_game(
        &self,
        guild_id: u64,
        game_id: u64,
    ) -> Result<GuildTrackingConfig, TrackingError> {
        let patch = TrackingConfigPatch {
            game_id: Some(game_id),
            ..Default::default()
        };
        Ok(self.store.upsert(guild_id, patch).await?)
    }

    pub async fn set_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<GuildTrackingConfig, TrackingError> {
        let patch = TrackingConfigPatch {
            channel_id: Some(channel_id),
            ..Default::default()
        };
        Ok(self.store.upsert(guild_id, patch).await?)
    }

    /// Validate and persist a new polling interval. A rejected interval
    /// leaves the stored value untouched.
    pub async fn set_interval(
        &self,
        guild_id: u64,
        interval_secs: u64,
    ) -> Result<GuildTrackingConfig, TrackingError> {
        if interval_secs < MIN_INTERVAL_SECS {
            return Err(TrackingError::IntervalTooLow {
                requested: interval_secs,
                floor: MIN_INTERVAL_SECS,
            });
        }

        let patch = TrackingConfigPatch {
            interval_secs: Some(interval_secs),
            ..Default::default()
        };
        Ok(self.store.upsert(guild_id, patch).await?)
    }

    pub async fn set_step(
        &self,
        guild_id: u64,
        step: u64,
    ) -> Result<GuildTrackingConfig, TrackingError> {
        if step == 0 {
            return Err(TrackingError::InvalidStep);
        }

        let patch = TrackingConfigPatch {
            milestone_step: Some(step),
            ..Default::default()
        };
        Ok(self.store.upsert(guild_id, patch).await?)
    }

    pub async fn set_active(&self, guild_id: u64, active: bool) -> Result<(), TrackingError> {
        Ok(self.store.set_active(guild_id, active).await?)
    }
}
