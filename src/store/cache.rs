// src/store/cache.rs - Durable local mirror of the people list
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

use super::{PeopleFeed, PeopleStore};
use crate::auth::Caller;
use crate::errors::DedupeError;
use crate::models::{CandidatePerson, Person, PersonUpdate};
use crate::utils::detection_config::DetectionConfig;

const DEFAULT_CACHE_PATH: &str = "family_tree_cache.json";

/// JSON file holding the last people list the backing store returned.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache location from `DEDUPE_CACHE_PATH`.
    pub fn from_env() -> Self {
        let path = std::env::var("DEDUPE_CACHE_PATH")
            .unwrap_or_else(|_| DEFAULT_CACHE_PATH.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been cached yet.
    pub async fn load(&self) -> Result<Option<Vec<Person>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).context(format!("Failed to read cache {}", self.path.display()))
            }
        };
        let people: Vec<Person> = serde_json::from_slice(&bytes)
            .context(format!("Failed to parse cache {}", self.path.display()))?;
        Ok(Some(people))
    }

    /// Writes to a sibling temp file first so a crash never leaves a torn cache.
    pub async fn save(&self, people: &[Person]) -> Result<()> {
        let json = serde_json::to_vec(people).context("Failed to serialize people for cache")?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .context(format!("Failed to write cache {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .context(format!("Failed to replace cache {}", self.path.display()))?;
        debug!("Cached {} people at {}", people.len(), self.path.display());
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(format!("Failed to remove cache {}", self.path.display())),
        }
    }
}

/// Wraps a store with the local mirror. Reads fall back to the mirror when
/// the store is unavailable; writes never do, since the duplicate check must
/// see the authoritative list.
pub struct CachedPeopleStore<S> {
    inner: S,
    cache: LocalCache,
    updates: watch::Sender<Vec<Person>>,
}

impl<S: PeopleStore> CachedPeopleStore<S> {
    pub fn new(inner: S, cache: LocalCache) -> Self {
        let (updates, _) = watch::channel(Vec::new());
        Self {
            inner,
            cache,
            updates,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn remember(&self, people: &[Person]) {
        if let Err(e) = self.cache.save(people).await {
            warn!("⚠️ Could not update local cache: {:#}", e);
        }
        self.updates.send_replace(people.to_vec());
    }

    /// Re-reads after a write so the mirror and subscribers stay current.
    async fn refresh(&self) {
        match self.inner.list_people().await {
            Ok(people) => self.remember(&people).await,
            Err(e) => warn!("⚠️ Could not refresh people after write: {}", e),
        }
    }
}

impl<S: PeopleStore> PeopleStore for CachedPeopleStore<S> {
    fn detection_config(&self) -> &DetectionConfig {
        self.inner.detection_config()
    }

    async fn list_people(&self) -> Result<Vec<Person>, DedupeError> {
        match self.inner.list_people().await {
            Ok(people) => {
                self.remember(&people).await;
                Ok(people)
            }
            Err(DedupeError::StoreUnavailable(e)) => match self.cache.load().await {
                Ok(Some(people)) => {
                    warn!(
                        "⚠️ Store unavailable ({:#}); serving {} cached people from {}",
                        e,
                        people.len(),
                        self.cache.path().display()
                    );
                    self.updates.send_replace(people.clone());
                    Ok(people)
                }
                Ok(None) => Err(DedupeError::StoreUnavailable(e)),
                Err(cache_err) => {
                    warn!("⚠️ Local cache unreadable: {:#}", cache_err);
                    Err(DedupeError::StoreUnavailable(e))
                }
            },
            Err(other) => Err(other),
        }
    }

    async fn add_person_checked(
        &self,
        caller: &Caller,
        candidate: CandidatePerson,
    ) -> Result<String, DedupeError> {
        let id = self.inner.add_person_checked(caller, candidate).await?;
        self.refresh().await;
        Ok(id)
    }

    async fn add_person_with_override(
        &self,
        caller: &Caller,
        candidate: CandidatePerson,
    ) -> Result<String, DedupeError> {
        let id = self.inner.add_person_with_override(caller, candidate).await?;
        self.refresh().await;
        Ok(id)
    }

    async fn update_person(
        &self,
        caller: &Caller,
        id: &str,
        update: PersonUpdate,
    ) -> Result<(), DedupeError> {
        self.inner.update_person(caller, id, update).await?;
        self.refresh().await;
        Ok(())
    }

    async fn delete_person(&self, caller: &Caller, id: &str) -> Result<(), DedupeError> {
        self.inner.delete_person(caller, id).await?;
        self.refresh().await;
        Ok(())
    }

    async fn clear_all(&self, caller: &Caller) -> Result<u64, DedupeError> {
        let removed = self.inner.clear_all(caller).await?;
        if let Err(e) = self.cache.clear().await {
            warn!("⚠️ Could not remove local cache: {:#}", e);
        }
        self.updates.send_replace(Vec::new());
        info!("Local cache cleared");
        Ok(removed)
    }
}

impl<S: PeopleStore> PeopleFeed for CachedPeopleStore<S> {
    fn subscribe(&self) -> watch::Receiver<Vec<Person>> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPeopleStore;
    use anyhow::anyhow;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store that can be switched offline.
    struct FlakyStore {
        inner: MemoryPeopleStore,
        offline: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryPeopleStore::default(),
                offline: AtomicBool::new(false),
            }
        }

        fn check_online(&self) -> Result<(), DedupeError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(DedupeError::StoreUnavailable(anyhow!("network down")));
            }
            Ok(())
        }
    }

    impl PeopleStore for FlakyStore {
        fn detection_config(&self) -> &DetectionConfig {
            self.inner.detection_config()
        }

        async fn list_people(&self) -> Result<Vec<Person>, DedupeError> {
            self.check_online()?;
            self.inner.list_people().await
        }

        async fn add_person_checked(
            &self,
            caller: &Caller,
            candidate: CandidatePerson,
        ) -> Result<String, DedupeError> {
            self.check_online()?;
            self.inner.add_person_checked(caller, candidate).await
        }

        async fn add_person_with_override(
            &self,
            caller: &Caller,
            candidate: CandidatePerson,
        ) -> Result<String, DedupeError> {
            self.check_online()?;
            self.inner.add_person_with_override(caller, candidate).await
        }

        async fn update_person(
            &self,
            caller: &Caller,
            id: &str,
            update: PersonUpdate,
        ) -> Result<(), DedupeError> {
            self.check_online()?;
            self.inner.update_person(caller, id, update).await
        }

        async fn delete_person(&self, caller: &Caller, id: &str) -> Result<(), DedupeError> {
            self.check_online()?;
            self.inner.delete_person(caller, id).await
        }

        async fn clear_all(&self, caller: &Caller) -> Result<u64, DedupeError> {
            self.check_online()?;
            self.inner.clear_all(caller).await
        }
    }

    #[tokio::test]
    async fn test_cache_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("people.json"));
        assert_eq!(cache.load().await.unwrap(), None);

        let people = vec![Person {
            id: "1".to_string(),
            name: "محمد امیری".to_string(),
            father_name: Some("علی امیری".to_string()),
            father_id: None,
            created_at: Utc::now(),
        }];
        cache.save(&people).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(people));

        cache.clear().await.unwrap();
        assert_eq!(cache.load().await.unwrap(), None);
        cache.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_reads_fall_back_to_cache_but_writes_do_not() {
        let dir = tempfile::tempdir().unwrap();
        let store = CachedPeopleStore::new(
            FlakyStore::new(),
            LocalCache::new(dir.path().join("people.json")),
        );
        let caller = Caller::user("u1");

        store
            .add_person_checked(&caller, CandidatePerson::named("John Smith"))
            .await
            .unwrap();

        store.inner().offline.store(true, Ordering::SeqCst);
        let people = store.list_people().await.unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "John Smith");

        // previews may use the stale mirror
        let preview = store
            .preview_duplicates(&CandidatePerson::named("John Smith"))
            .await
            .unwrap();
        assert!(preview.is_duplicate);

        let err = store
            .add_person_checked(&caller, CandidatePerson::named("Sara Amiri"))
            .await
            .unwrap_err();
        assert!(matches!(err, DedupeError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_offline_without_cache_reports_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CachedPeopleStore::new(
            FlakyStore::new(),
            LocalCache::new(dir.path().join("people.json")),
        );
        store.inner().offline.store(true, Ordering::SeqCst);
        let err = store.list_people().await.unwrap_err();
        assert!(matches!(err, DedupeError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_subscribers_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("people.json");
        let store = CachedPeopleStore::new(FlakyStore::new(), LocalCache::new(&cache_path));
        let mut rx = store.subscribe();

        store
            .add_person_checked(&Caller::user("u1"), CandidatePerson::named("Reza Karimi"))
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
        assert!(cache_path.exists());

        let removed = store.clear_all(&Caller::admin("a1")).await.unwrap();
        assert_eq!(removed, 1);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
        assert!(!cache_path.exists());
    }
}
