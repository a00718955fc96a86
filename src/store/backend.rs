//! Key-value persistence collaborator.
//!
//! The store only ever needs whole-value read/write under a fixed namespace
//! key — no field-level primitives. Keeping the contract this narrow lets
//! tests swap in a temp-dir backend and keeps serialization plain JSON.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Read the JSON value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;

    /// Overwrite the JSON value stored under `key`.
    async fn set(&self, key: &str, value: &Value) -> anyhow::Result<()>;

    /// Remove `key` if present.
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// File-per-key JSON backend. Writes go through a temp file + rename so a
/// failed write never corrupts the previously committed value.
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Namespace keys contain ':' which some filesystems dislike.
        let file = key.replace(':', "_");
        self.dir.join(format!("{file}.json"))
    }
}

#[async_trait]
impl KvBackend for JsonFileBackend {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(value)?;
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_roundtrip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path());

        assert!(backend.get("calltrack:positions").await.unwrap().is_none());

        let value = json!([{"ticker": "AAPL"}]);
        backend.set("calltrack:positions", &value).await.unwrap();
        assert_eq!(backend.get("calltrack:positions").await.unwrap(), Some(value));

        backend.remove("calltrack:positions").await.unwrap();
        assert!(backend.get("calltrack:positions").await.unwrap().is_none());
        // removing again is not an error
        backend.remove("calltrack:positions").await.unwrap();
    }
}
