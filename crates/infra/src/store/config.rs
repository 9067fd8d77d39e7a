use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Postgres,
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(BackendKind::Postgres),
            "memory" | "in-memory" => Ok(BackendKind::Memory),
            other => bail!("unknown STORE_BACKEND `{other}` (expected `postgres` or `memory`)"),
        }
    }
}

/// Connection settings for the document store.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub database: String,
    pub max_connections: u32,
}

impl StoreConfig {
    pub fn postgres(host: impl Into<String>, user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Postgres,
            host: host.into(),
            port: 5432,
            user: user.into(),
            pass: pass.into(),
            database: "lacrosse".to_string(),
            max_connections: 30,
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            host: String::new(),
            port: 0,
            user: String::new(),
            pass: String::new(),
            database: String::new(),
            max_connections: 0,
        }
    }

    pub fn from_env() -> Result<Self> {
        let backend: BackendKind = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        if backend == BackendKind::Memory {
            return Ok(Self::memory());
        }

        let user = env::var("DB_USER").context("DB_USER must be set")?;
        let pass = env::var("DB_PASS").context("DB_PASS must be set")?;
        if user.is_empty() || pass.is_empty() {
            bail!("DB_USER and DB_PASS must not be empty");
        }

        Ok(Self {
            backend,
            host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            user,
            pass,
            database: env::var("DB_NAME").unwrap_or_else(|_| "lacrosse".to_string()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}
