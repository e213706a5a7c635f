//! Service-level settings.
//!
//! - `OPERATION_TIMEOUT_MS`: deadline applied to every class/member operation,
//!   including any open transaction (default: 5000)
//! - `STORAGE_BACKEND`: `postgres` (default) or `memory`

use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub operation_timeout: Duration,
    pub storage_backend: StorageBackend,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|err| {
                tracing::warn!(%err, "falling back to postgres storage");
                StorageBackend::Postgres
            }),
            Err(_) => StorageBackend::Postgres,
        };

        Self {
            operation_timeout: Duration::from_millis(
                env::var("OPERATION_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
            ),
            storage_backend,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(5),
            storage_backend: StorageBackend::Postgres,
        }
    }
}
