//! Generation lifecycle: validate, synthesize, persist best-effort, list.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    composer,
    error::{GenerationError, StoreError},
    models::{GenerateRequest, GenerationRecord, UNSAVED_ID},
    seed, svg,
    store::{DocumentStore, Filter},
};

pub const COLLECTION: &str = "generation";
pub const MAX_LIST_LIMIT: usize = 100;

/// Output of the pure synthesis pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub resolved_seed: u32,
    pub scene: composer::Scene,
    pub image_data_url: String,
}

/// Resolve the seed, compose and encode. No I/O, no shared state.
pub fn synthesize(prompt: &str, explicit_seed: Option<i64>, width: u32, height: u32) -> Result<Synthesis, GenerationError> {
    let prompt = prompt.trim();
    let resolved_seed = seed::resolve(prompt, explicit_seed);
    let scene = composer::compose(prompt, resolved_seed, width, height)?;
    let image_data_url = svg::encode(&scene, width, height);
    Ok(Synthesis { resolved_seed, scene, image_data_url })
}

fn validate_dimension(name: &str, value: i64) -> Result<u32, GenerationError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| GenerationError::InvalidRequest(format!("{name} must be a positive integer, got {value}")))
}

fn head(s: &str, max_chars: usize) -> &str {
    s.char_indices().nth(max_chars).map_or(s, |(i, _)| &s[..i])
}

fn preview(data_url: &str) -> String {
    if data_url.len() > 50 {
        format!("{}...[{} chars total]", &data_url[..50], data_url.len())
    } else {
        data_url.to_string()
    }
}

pub struct GenerationService {
    store: Arc<dyn DocumentStore>,
    store_timeout: Duration,
}

impl GenerationService {
    pub fn new(store: Arc<dyn DocumentStore>, store_timeout: Duration) -> Self {
        Self { store, store_timeout }
    }

    pub fn store_backend(&self) -> &'static str { self.store.backend() }

    /// Collection names, for status reporting. Bounded like every store call.
    pub async fn store_collections(&self) -> Result<Vec<String>, StoreError> {
        self.bounded(self.store.collections()).await
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .unwrap_or(Err(StoreError::Timeout(self.store_timeout)))
    }

    /// Synthesize an image for `req` and try to record it.
    ///
    /// Only validation errors are returned. A failed or slow store leaves the
    /// record's id as [`UNSAVED_ID`] and the image is returned anyway.
    pub async fn generate(&self, req: GenerateRequest) -> Result<GenerationRecord, GenerationError> {
        let prompt = req.prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::InvalidRequest("Prompt is required".into()));
        }
        let width = validate_dimension("width", req.width)?;
        let height = validate_dimension("height", req.height)?;

        info!("🎨 Generating {}x{} image for prompt: {}", width, height, head(prompt, 80));
        let synthesis = synthesize(prompt, req.seed, width, height)?;
        debug!(seed = synthesis.resolved_seed, background = synthesis.scene.background, "scene composed");

        let mut record = GenerationRecord {
            id: UNSAVED_ID.to_string(),
            prompt: prompt.to_string(),
            style: req.style,
            seed: req.seed,
            resolved_seed: Some(synthesis.resolved_seed),
            width,
            height,
            image_data_url: synthesis.image_data_url,
            created_at: Some(Utc::now()),
        };

        match self.persist(&record).await {
            Ok(id) => {
                info!("✅ Stored generation {} ({}): {}", id, self.store.backend(), preview(&record.image_data_url));
                record.id = id;
            }
            Err(e) => warn!("⚠️ Generation not stored, returning image anyway: {}", e),
        }
        Ok(record)
    }

    async fn persist(&self, record: &GenerationRecord) -> Result<String, StoreError> {
        let mut fields = match serde_json::to_value(record) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(StoreError::WriteFailed("record did not serialize to an object".into())),
            Err(e) => return Err(StoreError::WriteFailed(e.to_string())),
        };
        fields.remove("id");
        self.bounded(self.store.insert(COLLECTION, fields)).await
    }

    /// Most recent generations, newest first. Never fails: storage problems
    /// yield an empty list.
    pub async fn list(&self, limit: usize) -> Vec<GenerationRecord> {
        let limit = limit.min(MAX_LIST_LIMIT);
        if limit == 0 {
            return Vec::new();
        }

        let docs = match self.bounded(self.store.query(COLLECTION, &Filter::new(), limit)).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!("⚠️ Could not list generations: {}", e);
                return Vec::new();
            }
        };

        let mut records: Vec<GenerationRecord> = docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<GenerationRecord>(Value::Object(doc.fields)) {
                Ok(mut record) => {
                    record.id = doc.id;
                    Some(record)
                }
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "skipping malformed generation document");
                    None
                }
            })
            .collect();
        // stable: store order breaks created_at ties; undated records go last
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }
}
