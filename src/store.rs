//! Document storage behind the generation history.
//!
//! The service only needs two calls from a store: append a document to a
//! collection and read back the newest matches. Backends are swappable at
//! startup through [`DocumentStore`].

use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;

/// Field holding the store-assigned identifier in serialized documents.
pub const ID_FIELD: &str = "_id";

/// Equality filter over top-level document fields. Empty matches everything.
pub type Filter = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    fn matches(&self, filter: &Filter) -> bool {
        filter.iter().all(|(k, v)| self.fields.get(k) == Some(v))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for status reporting.
    fn backend(&self) -> &'static str;

    /// Append `fields` to `collection`, returning the new document id.
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<String, StoreError>;

    /// Up to `limit` documents matching `filter`, most recently inserted first.
    async fn query(&self, collection: &str, filter: &Filter, limit: usize) -> Result<Vec<Document>, StoreError>;

    async fn collections(&self) -> Result<Vec<String>, StoreError>;
}

fn newest_matching<'a>(docs: impl DoubleEndedIterator<Item = &'a Document>, filter: &Filter, limit: usize) -> Vec<Document> {
    docs.rev().filter(|d| d.matches(filter)).take(limit).cloned().collect()
}

// --- In-memory ---

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str { "memory" }

    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(Document { id: id.clone(), fields });
        Ok(id)
    }

    async fn query(&self, collection: &str, filter: &Filter, limit: usize) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.read();
        Ok(guard.get(collection).map(|docs| newest_matching(docs.iter(), filter, limit)).unwrap_or_default())
    }

    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

// --- JSON lines on disk ---

/// One `<collection>.jsonl` file per collection under `dir`.
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), write_lock: Mutex::new(()) }
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let valid = !collection.is_empty()
            && collection.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Unavailable(format!("invalid collection name {collection:?}")));
        }
        Ok(self.dir.join(format!("{collection}.jsonl")))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    fn backend(&self) -> &'static str { "file" }

    async fn insert(&self, collection: &str, mut fields: Map<String, Value>) -> Result<String, StoreError> {
        let path = self.collection_path(collection)?;
        let id = Uuid::new_v4().to_string();
        fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        let mut line = serde_json::to_string(&fields).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", self.dir.display(), e)))?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("{}: {}", path.display(), e)))?;
        file.write_all(line.as_bytes()).await.map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        file.flush().await.map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        debug!(%id, path = %path.display(), "appended document");
        Ok(id)
    }

    async fn query(&self, collection: &str, filter: &Filter, limit: usize) -> Result<Vec<Document>, StoreError> {
        let path = self.collection_path(collection)?;
        let content = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::ReadFailed(format!("{}: {}", path.display(), e))),
        };

        let docs: Vec<Document> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str::<Map<String, Value>>(line) {
                Ok(mut fields) => match fields.remove(ID_FIELD) {
                    Some(Value::String(id)) => Some(Document { id, fields }),
                    _ => {
                        warn!(path = %path.display(), line = n + 1, "skipping document without id");
                        None
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), line = n + 1, error = %e, "skipping unreadable document");
                    None
                }
            })
            .collect();
        Ok(newest_matching(docs.iter(), filter, limit))
    }

    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::ReadFailed(e.to_string())),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| StoreError::ReadFailed(e.to_string()))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

// --- No backend ---

/// Stand-in used when storage is switched off. Every call fails.
#[derive(Default)]
pub struct UnavailableStore;

#[async_trait]
impl DocumentStore for UnavailableStore {
    fn backend(&self) -> &'static str { "none" }

    async fn insert(&self, _collection: &str, _fields: Map<String, Value>) -> Result<String, StoreError> {
        Err(StoreError::Unavailable("no store configured".into()))
    }

    async fn query(&self, _collection: &str, _filter: &Filter, _limit: usize) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Unavailable("no store configured".into()))
    }

    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("no store configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    async fn seed_store(store: &dyn DocumentStore) -> Vec<String> {
        let mut ids = Vec::new();
        for (n, kind) in ["a", "b", "a", "b", "a"].iter().enumerate() {
            ids.push(store.insert("things", fields(json!({ "n": n, "kind": kind }))).await.unwrap());
        }
        ids
    }

    #[tokio::test]
    async fn memory_query_returns_newest_first() {
        let store = MemoryStore::new();
        let ids = seed_store(&store).await;
        let docs = store.query("things", &Filter::new(), 3).await.unwrap();
        let got: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(got, vec![ids[4].as_str(), ids[3].as_str(), ids[2].as_str()]);
    }

    #[tokio::test]
    async fn memory_query_applies_filter() {
        let store = MemoryStore::new();
        seed_store(&store).await;
        let docs = store.query("things", &fields(json!({ "kind": "b" })), 10).await.unwrap();
        let ns: Vec<i64> = docs.iter().map(|d| d.fields["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![3, 1]);
    }

    #[tokio::test]
    async fn memory_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.query("nothing", &Filter::new(), 5).await.unwrap().is_empty());
        assert!(store.collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let ids = seed_store(&FileStore::new(dir.path())).await;

        let reopened = FileStore::new(dir.path());
        let docs = reopened.query("things", &Filter::new(), 2).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, ids[4]);
        assert_eq!(docs[0].fields.get(ID_FIELD), None);
        assert_eq!(docs[1].fields["n"], json!(3));
        assert_eq!(reopened.collections().await.unwrap(), vec!["things".to_string()]);
    }

    #[tokio::test]
    async fn file_store_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.insert("things", fields(json!({ "ok": true }))).await.unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join("things.jsonl"))
            .and_then(|mut f| std::io::Write::write_all(&mut f, b"{not json\n{\"no_id\":1}\n"))
            .unwrap();
        store.insert("things", fields(json!({ "ok": false }))).await.unwrap();

        let docs = store.query("things", &Filter::new(), 10).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].fields["ok"], json!(false));
    }

    #[tokio::test]
    async fn file_store_missing_dir_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent"));
        assert!(store.query("things", &Filter::new(), 5).await.unwrap().is_empty());
        assert!(store.collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.insert("../escape", Map::new()).await.is_err());
    }

    #[tokio::test]
    async fn unavailable_store_always_fails() {
        let store = UnavailableStore;
        assert!(matches!(store.insert("x", Map::new()).await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.query("x", &Filter::new(), 1).await, Err(StoreError::Unavailable(_))));
        assert!(store.collections().await.is_err());
    }
}
