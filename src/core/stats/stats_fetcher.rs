use async_trait::async_trait;

use super::stats_models::GameStats;

/// Ways a stats lookup can fail. The scheduler treats every variant as the
/// same "no data this tick" signal; the variants only exist for logging.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("stats endpoint returned status {0}")]
    Status(u16),
    #[error("malformed stats response: {0}")]
    MalformedResponse(String),
}

/// Trait describing the one lookup the tracking loop needs. The production
/// implementation calls the Roblox games API; tests substitute their own.
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    async fn fetch(&self, universe_id: u64) -> Result<GameStats, FetchError>;
}
