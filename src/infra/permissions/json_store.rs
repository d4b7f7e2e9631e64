use crate::core::permissions::{WhitelistError, WhitelistStore};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// JSON-file whitelist: a flat array of user ids, rewritten atomically
/// after every mutation like the tracking store.
pub struct JsonWhitelistStore {
    path: PathBuf,
    cache: RwLock<HashSet<u64>>,
}

impl JsonWhitelistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache: HashSet<u64> = if path.exists() {
            let file = File::open(&path).expect("Failed to open whitelist file");
            serde_json::from_reader(BufReader::new(file)).unwrap_or_default()
        } else {
            HashSet::new()
        };

        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    async fn persist(&self) -> Result<(), WhitelistError> {
        let cache = self.cache.read().await;
        // Stable output keeps diffs of the data file readable.
        let mut users: Vec<u64> = cache.iter().copied().collect();
        users.sort_unstable();

        let tmp = self.path.with_extension("tmp");
        let write = || -> std::io::Result<()> {
            let file = File::create(&tmp)?;
            serde_json::to_writer_pretty(&file, &users)?;
            file.sync_all()?;
            std::fs::rename(&tmp, &self.path)
        };
        write().map_err(|e| WhitelistError::Store(e.to_string()))
    }
}

#[async_trait]
impl WhitelistStore for JsonWhitelistStore {
    async fn contains(&self, user_id: u64) -> Result<bool, WhitelistError> {
        Ok(self.cache.read().await.contains(&user_id))
    }

    async fn add(&self, user_id: u64) -> Result<bool, WhitelistError> {
        let inserted = self.cache.write().await.insert(user_id);
        if inserted {
            self.persist().await?;
        }
        Ok(inserted)
    }

    async fn remove(&self, user_id: u64) -> Result<bool, WhitelistError> {
        let removed = self.cache.write().await.remove(&user_id);
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    async fn all(&self) -> Result<Vec<u64>, WhitelistError> {
        let mut users: Vec<u64> = self.cache.read().await.iter().copied().collect();
        users.sort_unstable();
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn persistence_roundtrip() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonWhitelistStore::new(path.clone());
        assert!(store.add(200).await.unwrap());
        assert!(store.add(300).await.unwrap());
        assert!(store.remove(300).await.unwrap());

        let store2 = JsonWhitelistStore::new(path);
        assert!(store2.contains(200).await.unwrap());
        assert!(!store2.contains(300).await.unwrap());
        assert_eq!(store2.all().await.unwrap(), vec![200]);
    }
}
