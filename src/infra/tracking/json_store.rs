use crate::core::tracking::{
    GuildTrackingConfig, StoreError, TrackingConfigPatch, TrackingConfigStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// JSON-file tracking store. Keeps the whole document cached in memory and
/// rewrites the file after every mutation via a temp file + rename, so a
/// crash mid-write can lose the last mutation but never corrupt the file.
pub struct JsonTrackingStore {
    path: PathBuf,
    cache: RwLock<HashMap<u64, GuildTrackingConfig>>,
}

impl JsonTrackingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache: HashMap<u64, GuildTrackingConfig> = if path.exists() {
            let file = File::open(&path).expect("Failed to open tracking config file");
            serde_json::from_reader(BufReader::new(file)).unwrap_or_default()
        } else {
            HashMap::new()
        };

        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let cache = self.cache.read().await;
        let tmp = self.path.with_extension("tmp");
        let file = File::create(&tmp)?;
        serde_json::to_writer_pretty(&file, &*cache)?;
        file.sync_all()?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl TrackingConfigStore for JsonTrackingStore {
    async fn get(&self, guild_id: u64) -> Result<Option<GuildTrackingConfig>, StoreError> {
        let cache = self.cache.read().await;
        Ok(cache.get(&guild_id).cloned())
    }

    async fn upsert(
        &self,
        guild_id: u64,
        patch: TrackingConfigPatch,
    ) -> Result<GuildTrackingConfig, StoreError> {
        let merged = {
            let mut cache = self.cache.write().await;
            let entry = cache
                .entry(guild_id)
                .or_insert_with(|| GuildTrackingConfig::new(guild_id));
            entry.apply(&patch);
            entry.clone()
        };
        self.persist().await?;
        Ok(merged)
    }

    async fn set_active(&self, guild_id: u64, active: bool) -> Result<(), StoreError> {
        {
            let mut cache = self.cache.write().await;
            cache
                .entry(guild_id)
                .or_insert_with(|| GuildTrackingConfig::new(guild_id))
                .active = active;
        }
        self.persist().await
    }

    async fn all(&self) -> Result<Vec<GuildTrackingConfig>, StoreError> {
        let cache = self.cache.read().await;
        Ok(cache.values().cloned().collect())
    }
}
