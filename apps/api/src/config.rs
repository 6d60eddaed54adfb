use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};

use crate::matching::recommender::DEFAULT_TOP_K;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Csv,
    /// Nothing survives a restart. Local development only.
    Memory,
}

/// Application configuration loaded from environment variables.
/// Every variable has a default, so a bare `cargo run` serves `./mentors.csv`.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub data_path: PathBuf,
    pub port: u16,
    pub rust_log: String,
    /// Number of mentors returned by a recommendation when the request omits `k`.
    pub top_k: usize,
    pub lock_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let top_k = env_or("RECOMMEND_TOP_K", &DEFAULT_TOP_K.to_string())
            .parse::<usize>()
            .context("RECOMMEND_TOP_K must be a positive integer")?;
        ensure!(top_k >= 1, "RECOMMEND_TOP_K must be at least 1");

        let store_backend = match env_or("MENTOR_STORE", "csv").to_lowercase().as_str() {
            "csv" => StoreBackend::Csv,
            "memory" => StoreBackend::Memory,
            other => bail!("MENTOR_STORE must be 'csv' or 'memory', got '{other}'"),
        };

        Ok(Config {
            store_backend,
            data_path: PathBuf::from(env_or("MENTOR_DATA_PATH", "mentors.csv")),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            top_k,
            lock_timeout: Duration::from_millis(
                env_or("STORE_LOCK_TIMEOUT_MS", "5000")
                    .parse::<u64>()
                    .context("STORE_LOCK_TIMEOUT_MS must be a number of milliseconds")?,
            ),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
