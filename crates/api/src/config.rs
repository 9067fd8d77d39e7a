use anyhow::Result;
use std::env;

use infra::StoreConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub seed_sample_player: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            store: StoreConfig::from_env()?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            seed_sample_player: env::var("SEED_SAMPLE_PLAYER")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
        })
    }
}
