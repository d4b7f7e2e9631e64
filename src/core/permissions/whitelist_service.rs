use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum WhitelistError {
    #[error("Store error: {0}")]
    Store(String),
    #[error("the owner is always whitelisted")]
    OwnerAlwaysAllowed,
    #[error("the owner cannot be removed from the whitelist")]
    CannotRemoveOwner,
    #[error("user is not on the whitelist")]
    NotWhitelisted,
}

/// Storage for the set of user ids allowed to run control commands.
#[async_trait]
pub trait WhitelistStore: Send + Sync {
    async fn contains(&self, user_id: u64) -> Result<bool, WhitelistError>;
    /// Returns false if the id was already present.
    async fn add(&self, user_id: u64) -> Result<bool, WhitelistError>;
    /// Returns false if the id was not present.
    async fn remove(&self, user_id: u64) -> Result<bool, WhitelistError>;
    async fn all(&self) -> Result<Vec<u64>, WhitelistError>;
}

/// Whitelist gate for every control command. The owner id is implicitly a
/// member and can never be added or removed, so a misfired `unwhitelist`
/// cannot lock everyone out.
pub struct WhitelistService<S: WhitelistStore> {
    store: S,
    owner_id: u64,
}

impl<S: WhitelistStore> WhitelistService<S> {
    pub fn new(store: S, owner_id: u64) -> Self {
        Self { store, owner_id }
    }

    pub fn owner_id(&self) -> u64 {
        self.owner_id
    }

    pub async fn is_allowed(&self, user_id: u64) -> Result<bool, WhitelistError> {
        if user_id == self.owner_id {
            return Ok(true);
        }
        self.store.contains(user_id).await
    }

    /// Add a user. Returns false when they were already whitelisted.
    pub async fn add(&self, user_id: u64) -> Result<bool, WhitelistError> {
        if user_id == self.owner_id {
            return Err(WhitelistError::OwnerAlwaysAllowed);
        }
        self.store.add(user_id).await
    }

    pub async fn remove(&self, user_id: u64) -> Result<(), WhitelistError> {
        if user_id == self.owner_id {
            return Err(WhitelistError::CannotRemoveOwner);
        }
        if !self.store.remove(user_id).await? {
            return Err(WhitelistError::NotWhitelisted);
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<u64>, WhitelistError> {
        self.store.all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct MemoryWhitelist {
        users: RwLock<HashSet<u64>>,
    }

    #[async_trait]
    impl WhitelistStore for MemoryWhitelist {
        async fn contains(&self, user_id: u64) -> Result<bool, WhitelistError> {
            Ok(self.users.read().await.contains(&user_id))
        }

        async fn add(&self, user_id: u64) -> Result<bool, WhitelistError> {
            Ok(self.users.write().await.insert(user_id))
        }

        async fn remove(&self, user_id: u64) -> Result<bool, WhitelistError> {
            Ok(self.users.write().await.remove(&user_id))
        }

        async fn all(&self) -> Result<Vec<u64>, WhitelistError> {
            Ok(self.users.read().await.iter().copied().collect())
        }
    }

    const OWNER: u64 = 100;

    #[tokio::test]
    async fn owner_is_implicitly_allowed() {
        let service = WhitelistService::new(MemoryWhitelist::default(), OWNER);
        assert!(service.is_allowed(OWNER).await.unwrap());
        assert!(!service.is_allowed(200).await.unwrap());
    }

    #[tokio::test]
    async fn add_and_remove_roundtrip() {
        let service = WhitelistService::new(MemoryWhitelist::default(), OWNER);
        assert!(service.add(200).await.unwrap());
        assert!(!service.add(200).await.unwrap(), "second add reports duplicate");
        assert!(service.is_allowed(200).await.unwrap());

        service.remove(200).await.unwrap();
        assert!(!service.is_allowed(200).await.unwrap());
        assert!(matches!(
            service.remove(200).await,
            Err(WhitelistError::NotWhitelisted)
        ));
    }

    #[tokio::test]
    async fn owner_cannot_be_added_or_removed() {
        let service = WhitelistService::new(MemoryWhitelist::default(), OWNER);
        assert!(matches!(
            service.add(OWNER).await,
            Err(WhitelistError::OwnerAlwaysAllowed)
        ));
        assert!(matches!(
            service.remove(OWNER).await,
            Err(WhitelistError::CannotRemoveOwner)
        ));
        assert!(service.is_allowed(OWNER).await.unwrap());
    }
}
