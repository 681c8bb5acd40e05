// src/store/memory.rs - In-process single-writer store
use chrono::Utc;
use log::info;
use tokio::sync::{watch, Mutex};

use super::{guard_candidate, new_person_id, prepare_override, PeopleFeed, PeopleStore};
use crate::auth::Caller;
use crate::errors::DedupeError;
use crate::models::{CandidatePerson, Person, PersonUpdate};
use crate::utils::detection_config::DetectionConfig;
use crate::utils::logging::DetectionLogger;

/// Keeps people newest first. The mutex is held from detection through
/// insert, which makes check-then-write atomic for every caller sharing the
/// store.
pub struct MemoryPeopleStore {
    people: Mutex<Vec<Person>>,
    updates: watch::Sender<Vec<Person>>,
    config: DetectionConfig,
}

impl Default for MemoryPeopleStore {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl MemoryPeopleStore {
    pub fn new(config: DetectionConfig) -> Self {
        let (updates, _) = watch::channel(Vec::new());
        Self {
            people: Mutex::new(Vec::new()),
            updates,
            config,
        }
    }

    /// Seeds the store, e.g. from a local cache. Input order is kept.
    pub fn with_people(config: DetectionConfig, people: Vec<Person>) -> Self {
        let (updates, _) = watch::channel(people.clone());
        Self {
            people: Mutex::new(people),
            updates,
            config,
        }
    }

    fn publish(&self, people: &[Person]) {
        self.updates.send_replace(people.to_vec());
    }

    fn insert(&self, people: &mut Vec<Person>, candidate: CandidatePerson) -> Person {
        let person = candidate.into_person(new_person_id(), Utc::now());
        people.insert(0, person.clone());
        self.publish(people);
        person
    }
}

impl PeopleStore for MemoryPeopleStore {
    fn detection_config(&self) -> &DetectionConfig {
        &self.config
    }

    async fn list_people(&self) -> Result<Vec<Person>, DedupeError> {
        Ok(self.people.lock().await.clone())
    }

    async fn add_person_checked(
        &self,
        caller: &Caller,
        candidate: CandidatePerson,
    ) -> Result<String, DedupeError> {
        caller.require_writer()?;
        let logger = DetectionLogger::new("add_person_checked");
        logger.log_start(&candidate.name);

        let mut people = self.people.lock().await;
        let candidate = guard_candidate(candidate, &people, &self.config, &logger)?;
        let person = self.insert(&mut people, candidate);
        logger.log_written(&person.id, &person.name);
        Ok(person.id)
    }

    async fn add_person_with_override(
        &self,
        caller: &Caller,
        candidate: CandidatePerson,
    ) -> Result<String, DedupeError> {
        caller.require_writer()?;
        let logger = DetectionLogger::new("add_person_with_override");
        logger.log_override(&candidate.name);

        let mut people = self.people.lock().await;
        let candidate = prepare_override(candidate, &people)?;
        let person = self.insert(&mut people, candidate);
        logger.log_written(&person.id, &person.name);
        Ok(person.id)
    }

    async fn update_person(
        &self,
        caller: &Caller,
        id: &str,
        update: PersonUpdate,
    ) -> Result<(), DedupeError> {
        caller.require_admin()?;
        let mut people = self.people.lock().await;
        let person = people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DedupeError::PersonNotFound(id.to_string()))?;
        update.apply_to(person)?;
        self.publish(&people);
        info!("Updated person {}", id);
        Ok(())
    }

    async fn delete_person(&self, caller: &Caller, id: &str) -> Result<(), DedupeError> {
        caller.require_admin()?;
        let mut people = self.people.lock().await;
        let before = people.len();
        people.retain(|p| p.id != id);
        if people.len() == before {
            return Err(DedupeError::PersonNotFound(id.to_string()));
        }
        self.publish(&people);
        info!("Deleted person {}", id);
        Ok(())
    }

    async fn clear_all(&self, caller: &Caller) -> Result<u64, DedupeError> {
        caller.require_admin()?;
        let mut people = self.people.lock().await;
        let removed = people.len() as u64;
        people.clear();
        self.publish(&people);
        info!("Cleared {} people from the tree", removed);
        Ok(removed)
    }
}

impl PeopleFeed for MemoryPeopleStore {
    fn subscribe(&self) -> watch::Receiver<Vec<Person>> {
        self.updates.subscribe()
    }
}
