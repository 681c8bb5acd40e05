// src/utils/db_connect.rs
use anyhow::{Context, Result};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::{info, warn};
use std::env;
use std::time::Duration;
use tokio_postgres::{Config, NoTls};

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

const DEFAULT_POOL_SIZE: u32 = 10;

/// Where the people table lives and how many connections to keep open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub pool_size: u32,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            dbname: "family_tree".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl DbSettings {
    /// Reads `POSTGRES_*` variables and `DEDUPE_DB_POOL_SIZE`. Unset or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("POSTGRES_HOST").unwrap_or(defaults.host),
            port: parsed_var("POSTGRES_PORT").unwrap_or(defaults.port),
            dbname: env::var("POSTGRES_DB").unwrap_or(defaults.dbname),
            user: env::var("POSTGRES_USER").unwrap_or(defaults.user),
            password: env::var("POSTGRES_PASSWORD").unwrap_or(defaults.password),
            pool_size: parsed_var::<u32>("DEDUPE_DB_POOL_SIZE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.pool_size),
        }
    }

    pub fn log_config(&self) {
        info!("🗄️ Database: {}@{}:{}/{}", self.user, self.host, self.port, self.dbname);
        info!("   Pool size: {}", self.pool_size);
    }

    fn pg_config(&self) -> Config {
        let mut config = Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password)
            .application_name("family_dedupe")
            .connect_timeout(Duration::from_secs(10));
        config
    }
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("⚠️ Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}

/// Opens the pool and checks one connection before handing it out.
pub async fn connect(settings: &DbSettings) -> Result<PgPool> {
    settings.log_config();
    let manager = PostgresConnectionManager::new(settings.pg_config(), NoTls);

    let pool = Pool::builder()
        .max_size(settings.pool_size)
        .connection_timeout(Duration::from_secs(15))
        .build(manager)
        .await
        .context(format!(
            "Failed to open connection pool to {}:{}",
            settings.host, settings.port
        ))?;

    {
        let conn = pool
            .get()
            .await
            .context("Failed to check out a connection")?;
        conn.simple_query("SELECT 1")
            .await
            .context("Database did not answer the health check")?;
    }
    info!("Connected to database {}", settings.dbname);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_var_ignores_bad_numbers() {
        env::set_var("DEDUPE_TEST_PARSED_PORT", " 6543 ");
        assert_eq!(parsed_var::<u16>("DEDUPE_TEST_PARSED_PORT"), Some(6543));
        env::set_var("DEDUPE_TEST_PARSED_PORT", "not-a-port");
        assert_eq!(parsed_var::<u16>("DEDUPE_TEST_PARSED_PORT"), None);
        env::remove_var("DEDUPE_TEST_PARSED_PORT");
        assert_eq!(parsed_var::<u16>("DEDUPE_TEST_PARSED_PORT"), None);
    }

    #[test]
    fn test_pool_size_must_be_positive() {
        env::set_var("DEDUPE_DB_POOL_SIZE", "0");
        assert_eq!(DbSettings::from_env().pool_size, DEFAULT_POOL_SIZE);
        env::set_var("DEDUPE_DB_POOL_SIZE", "12");
        assert_eq!(DbSettings::from_env().pool_size, 12);
        env::remove_var("DEDUPE_DB_POOL_SIZE");
    }
}
