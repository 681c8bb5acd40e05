// src/store/postgres.rs - PostgreSQL-backed people store
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio_postgres::error::SqlState;
use tokio_postgres::{GenericClient, IsolationLevel, Row};

use super::{guard_candidate, new_person_id, prepare_override, PeopleStore};
use crate::auth::Caller;
use crate::errors::DedupeError;
use crate::models::{CandidatePerson, Person, PersonUpdate};
use crate::utils::db_connect::PgPool;
use crate::utils::detection_config::DetectionConfig;
use crate::utils::logging::DetectionLogger;

pub const DEFAULT_TX_MAX_RETRIES: u32 = 5;

const CREATE_SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS public.person (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        father_name TEXT,
        father_id TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_person_created_at ON public.person (created_at DESC);
    CREATE INDEX IF NOT EXISTS idx_person_father_id ON public.person (father_id);";

const SELECT_PEOPLE_SQL: &str = "
    SELECT id, name, father_name, father_id, created_at
    FROM public.person
    ORDER BY created_at DESC";

const INSERT_PERSON_SQL: &str = "
    INSERT INTO public.person (id, name, father_name, father_id, created_at)
    VALUES ($1, $2, $3, $4, $5)";

/// Duplicate checks and inserts share one SERIALIZABLE transaction, so two
/// concurrent submissions of the same name cannot both commit. A
/// serialization failure re-runs the whole read-check-write on a fresh
/// snapshot.
pub struct PgPeopleStore {
    pool: PgPool,
    config: DetectionConfig,
    max_retries: u32,
}

fn row_to_person(row: &Row) -> Person {
    Person {
        id: row.get("id"),
        name: row.get("name"),
        father_name: row.get("father_name"),
        father_id: row.get("father_id"),
        created_at: row.get::<_, DateTime<Utc>>("created_at"),
    }
}

async fn fetch_people<C: GenericClient>(client: &C) -> Result<Vec<Person>> {
    let rows = client
        .query(SELECT_PEOPLE_SQL, &[])
        .await
        .context("Failed to query people")?;
    Ok(rows.iter().map(row_to_person).collect())
}

async fn insert_person<C: GenericClient>(client: &C, person: &Person) -> Result<()> {
    client
        .execute(
            INSERT_PERSON_SQL,
            &[
                &person.id,
                &person.name,
                &person.father_name,
                &person.father_id,
                &person.created_at,
            ],
        )
        .await
        .context(format!("Failed to insert person {}", person.id))?;
    Ok(())
}

/// True when PostgreSQL aborted the transaction to keep it serializable.
fn is_serialization_failure(err: &DedupeError) -> bool {
    match err {
        DedupeError::StoreUnavailable(e) => e
            .chain()
            .filter_map(|cause| cause.downcast_ref::<tokio_postgres::Error>())
            .any(|pg| {
                matches!(
                    pg.code(),
                    Some(code) if *code == SqlState::T_R_SERIALIZATION_FAILURE
                        || *code == SqlState::T_R_DEADLOCK_DETECTED
                )
            }),
        _ => false,
    }
}

impl PgPeopleStore {
    pub fn new(pool: PgPool, config: DetectionConfig) -> Self {
        Self {
            pool,
            config,
            max_retries: DEFAULT_TX_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Transaction retry budget from `DEDUPE_TX_MAX_RETRIES`.
    pub fn max_retries_from_env() -> u32 {
        std::env::var("DEDUPE_TX_MAX_RETRIES")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_TX_MAX_RETRIES)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for ensure_schema")?;
        conn.batch_execute(CREATE_SCHEMA_SQL)
            .await
            .context("Failed to create person table")?;
        info!("Person table is ready");
        Ok(())
    }

    async fn try_add_checked(
        &self,
        candidate: CandidatePerson,
        logger: &DetectionLogger,
    ) -> Result<Person, DedupeError> {
        let mut conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for add_person_checked")?;
        let tx = conn
            .build_transaction()
            .isolation_level(IsolationLevel::Serializable)
            .start()
            .await
            .context("Failed to start serializable transaction")?;

        let people = fetch_people(&tx).await?;
        // an Err here drops the transaction, which rolls it back
        let candidate = guard_candidate(candidate, &people, &self.config, logger)?;
        let person = candidate.into_person(new_person_id(), Utc::now());
        insert_person(&tx, &person).await?;
        tx.commit()
            .await
            .context("Failed to commit add_person_checked")?;
        Ok(person)
    }
}

impl PeopleStore for PgPeopleStore {
    fn detection_config(&self) -> &DetectionConfig {
        &self.config
    }

    async fn list_people(&self) -> Result<Vec<Person>, DedupeError> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for list_people")?;
        let people = fetch_people(&*conn).await?;
        debug!("Fetched {} people", people.len());
        Ok(people)
    }

    async fn add_person_checked(
        &self,
        caller: &Caller,
        candidate: CandidatePerson,
    ) -> Result<String, DedupeError> {
        caller.require_writer()?;
        let logger = DetectionLogger::new("add_person_checked");
        logger.log_start(&candidate.name);

        let mut attempt = 1;
        loop {
            match self.try_add_checked(candidate.clone(), &logger).await {
                Ok(person) => {
                    logger.log_written(&person.id, &person.name);
                    return Ok(person.id);
                }
                Err(err) if is_serialization_failure(&err) && attempt < self.max_retries => {
                    logger.log_retry(attempt, self.max_retries);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn add_person_with_override(
        &self,
        caller: &Caller,
        candidate: CandidatePerson,
    ) -> Result<String, DedupeError> {
        caller.require_writer()?;
        let logger = DetectionLogger::new("add_person_with_override");
        logger.log_override(&candidate.name);

        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for add_person_with_override")?;
        let people = fetch_people(&*conn).await?;
        let candidate = prepare_override(candidate, &people)?;
        let person = candidate.into_person(new_person_id(), Utc::now());
        insert_person(&*conn, &person).await?;
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
        let mut conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for update_person")?;
        let tx = conn
            .transaction()
            .await
            .context("Failed to start update transaction")?;

        let row = tx
            .query_opt(
                "SELECT id, name, father_name, father_id, created_at
                 FROM public.person WHERE id = $1 FOR UPDATE",
                &[&id],
            )
            .await
            .context(format!("Failed to load person {}", id))?
            .ok_or_else(|| DedupeError::PersonNotFound(id.to_string()))?;

        let mut person = row_to_person(&row);
        update.apply_to(&mut person)?;

        tx.execute(
            "UPDATE public.person SET name = $1, father_name = $2, father_id = $3 WHERE id = $4",
            &[&person.name, &person.father_name, &person.father_id, &person.id],
        )
        .await
        .context(format!("Failed to update person {}", id))?;
        tx.commit()
            .await
            .context("Failed to commit update_person")?;
        info!("Updated person {}", id);
        Ok(())
    }

    async fn delete_person(&self, caller: &Caller, id: &str) -> Result<(), DedupeError> {
        caller.require_admin()?;
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for delete_person")?;
        let deleted = conn
            .execute("DELETE FROM public.person WHERE id = $1", &[&id])
            .await
            .context(format!("Failed to delete person {}", id))?;
        if deleted == 0 {
            return Err(DedupeError::PersonNotFound(id.to_string()));
        }
        info!("Deleted person {}", id);
        Ok(())
    }

    async fn clear_all(&self, caller: &Caller) -> Result<u64, DedupeError> {
        caller.require_admin()?;
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection for clear_all")?;
        let deleted = conn
            .execute("DELETE FROM public.person", &[])
            .await
            .context("Failed to clear people")?;
        info!("Cleared {} people from the tree", deleted);
        Ok(deleted)
    }
}
