//! File-backed key-value store for timeline items and media records.
//!
//! One JSON document per key under `items/` and `media/`. Writes go to a
//! temporary sibling that is renamed into place, so readers never see a
//! half-written document.

use std::path::{Path, PathBuf};

use redact_models::{MediaId, TimelineItem};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

const ITEMS_DIR: &str = "items";
const MEDIA_DIR: &str = "media";

/// A media file known to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: MediaId,
    pub path: PathBuf,
    pub duration: f64,
    pub sample_rate: u32,
}

/// Store rooted at one directory.
#[derive(Debug, Clone)]
pub struct TimelineStore {
    root: PathBuf,
}

impl TimelineStore {
    /// Open (and create if needed) a store.
    pub async fn open(root: impl Into<PathBuf>) -> WorkerResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(ITEMS_DIR)).await?;
        fs::create_dir_all(root.join(MEDIA_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn put_item(&self, item: &TimelineItem) -> WorkerResult<()> {
        let path = self.doc_path(ITEMS_DIR, item.id.as_str())?;
        write_json(&path, item).await
    }

    pub async fn get_item(&self, id: &str) -> WorkerResult<TimelineItem> {
        let path = self.doc_path(ITEMS_DIR, id)?;
        read_json(&path)
            .await?
            .ok_or_else(|| WorkerError::ItemNotFound(id.to_string()))
    }

    pub async fn delete_item(&self, id: &str) -> WorkerResult<()> {
        let path = self.doc_path(ITEMS_DIR, id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(WorkerError::ItemNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All items ordered by timeline position, then ID.
    pub async fn list_items(&self) -> WorkerResult<Vec<TimelineItem>> {
        let mut items: Vec<TimelineItem> = self.read_all(ITEMS_DIR).await?;
        items.sort_by(|a, b| {
            a.start_time
                .total_cmp(&b.start_time)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        Ok(items)
    }

    pub async fn put_media(&self, media: &MediaRecord) -> WorkerResult<()> {
        let path = self.doc_path(MEDIA_DIR, media.id.as_str())?;
        write_json(&path, media).await
    }

    pub async fn get_media(&self, id: &MediaId) -> WorkerResult<MediaRecord> {
        let path = self.doc_path(MEDIA_DIR, id.as_str())?;
        read_json(&path)
            .await?
            .ok_or_else(|| WorkerError::MediaNotFound(id.to_string()))
    }

    fn doc_path(&self, collection: &str, key: &str) -> WorkerResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(WorkerError::invalid_input(format!("invalid key: {:?}", key)));
        }
        Ok(self.root.join(collection).join(format!("{}.json", key)))
    }

    async fn read_all<T: DeserializeOwned>(&self, collection: &str) -> WorkerResult<Vec<T>> {
        let mut entries = fs::read_dir(self.root.join(collection)).await?;
        let mut docs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(doc) = read_json(&path).await? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> WorkerResult<Option<T>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> WorkerResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes).await?;
    fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "Stored document");
    Ok(())
}
