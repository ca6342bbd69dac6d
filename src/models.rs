use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

pub const DEFAULT_DIMENSION: i64 = 1024;
pub const DEFAULT_LIST_LIMIT: usize = 12;

/// Identifier reported when a generation could not be persisted.
pub const UNSAVED_ID: &str = "no-db";

fn default_dimension() -> i64 { DEFAULT_DIMENSION }
fn default_list_limit() -> usize { DEFAULT_LIST_LIMIT }

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String, // missing is treated like empty
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default = "default_dimension")]
    pub width: i64,
    #[serde(default = "default_dimension")]
    pub height: i64,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), style: None, seed: None, width: DEFAULT_DIMENSION, height: DEFAULT_DIMENSION }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationRecord {
    #[serde(default)]
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub seed: Option<i64>, // as requested, not the resolved one
    #[serde(default)]
    pub resolved_seed: Option<u32>,
    pub width: u32,
    pub height: u32,
    pub image_data_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl GenerationRecord {
    pub fn is_persisted(&self) -> bool { self.id != UNSAVED_ID }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub items: Vec<GenerationRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Service and storage health, reported by `GET /test`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub backend: String,
    pub store_backend: String,
    pub database: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}
