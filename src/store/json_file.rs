// src/store/json_file.rs
//! In-memory collection mirrored to a JSON file after every upsert.
//! Writes go to `<path>.tmp` and are renamed into place. A document reaches
//! memory only after the file holding it was written.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::EnrichedDocument;
use crate::store::{DocumentStore, FallbackQuery, InMemoryStore};

pub struct JsonFileStore {
    mem: InMemoryStore,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Load the collection from `path`. A missing file is an empty store;
    /// an unreadable or corrupt file is a `StoreFailure`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let docs: Vec<EnrichedDocument> = match tokio::fs::read_to_string(&path).await {
            Ok(s) if s.trim().is_empty() => Vec::new(),
            Ok(s) => serde_json::from_str(&s)
                .map_err(|e| Error::store(format!("parsing {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::store(format!("reading {}: {e}", path.display()))),
        };
        tracing::info!(target: "store", path = %path.display(), docs = docs.len(), "json store opened");
        Ok(Self {
            mem: InMemoryStore::from_docs(docs),
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.mem.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.mem.is_empty().await
    }

    async fn persist(&self, all: &[EnrichedDocument]) -> Result<()> {
        let json = serde_json::to_string_pretty(all).map_err(Error::store)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(Error::store)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(Error::store)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(Error::store)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn get_by_keys(&self, keys: &HashSet<String>) -> Result<Vec<EnrichedDocument>> {
        self.mem.get_by_keys(keys).await
    }

    async fn query_fallback(&self, query: &FallbackQuery) -> Result<Vec<EnrichedDocument>> {
        self.mem.query_fallback(query).await
    }

    async fn upsert(&self, doc: EnrichedDocument) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.mem.snapshot().await;
        next.retain(|d| d.natural_key != doc.natural_key);
        next.push(doc.clone());
        self.persist(&next).await?;
        self.mem.upsert(doc).await
    }
}
