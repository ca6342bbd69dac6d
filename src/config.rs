use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use tracing::warn;

use crate::store::{DocumentStore, FileStore, MemoryStore, UnavailableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File,
    None,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "file" | "jsonl" => Ok(Self::File),
            "none" | "off" | "disabled" => Ok(Self::None),
            other => Err(format!("unknown store backend {other:?}")),
        }
    }
}

/// Process configuration read from the environment.
///
/// | Env var            | Default  |
/// |--------------------|----------|
/// | `PORT`             | `8000`   |
/// | `STORE_BACKEND`    | `memory` |
/// | `STORE_DIR`        | `data`   |
/// | `STORE_TIMEOUT_MS` | `2000`   |
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub store_dir: PathBuf,
    pub store_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            store_backend: StoreBackend::Memory,
            store_dir: PathBuf::from("data"),
            store_timeout: Duration::from_millis(2000),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; bad values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = parse_or(&lookup, "PORT", defaults.port);
        let store_backend = parse_or(&lookup, "STORE_BACKEND", defaults.store_backend);
        let store_dir = lookup("STORE_DIR").filter(|v| !v.trim().is_empty()).map(PathBuf::from).unwrap_or(defaults.store_dir);
        let timeout_ms = parse_or(&lookup, "STORE_TIMEOUT_MS", defaults.store_timeout.as_millis() as u64);
        Self { port, store_backend, store_dir, store_timeout: Duration::from_millis(timeout_ms) }
    }

    pub fn build_store(&self) -> Arc<dyn DocumentStore> {
        match self.store_backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::File => Arc::new(FileStore::new(self.store_dir.clone())),
            StoreBackend::None => Arc::new(UnavailableStore),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("⚠️ Ignoring {}={:?} ({}), using {:?}", key, raw, e, default);
            default
        }),
    }
}
