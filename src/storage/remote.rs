//! Remote-object backend

use async_trait::async_trait;
use std::sync::Arc;

use super::object_store::ObjectStore;
use super::{validate_filename, PostStorage};
use crate::error::{Error, Result};

/// Stores posts as `<prefix><filename>` objects in an [`ObjectStore`]
pub struct RemoteStorage {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl RemoteStorage {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &str) -> Self {
        let prefix = if prefix.is_empty() || prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };
        Self { store, prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key_for(&self, filename: &str) -> Result<String> {
        validate_filename(filename)?;
        Ok(format!("{}{}", self.prefix, filename))
    }
}

#[async_trait]
impl PostStorage for RemoteStorage {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn list(&self) -> Result<Vec<String>> {
        let blobs = self.store.list(&self.prefix).await.map_err(|e| {
            tracing::error!("Error listing blobs under {}: {}", self.prefix, e);
            e
        })?;

        let names: Vec<String> = blobs
            .into_iter()
            .filter_map(|blob| {
                blob.pathname
                    .strip_prefix(&self.prefix)
                    .filter(|name| !name.is_empty() && !name.contains('/'))
                    .map(str::to_string)
            })
            .collect();
        tracing::debug!("Listed {} blobs under {}", names.len(), self.prefix);
        Ok(names)
    }

    async fn read(&self, filename: &str) -> Result<String> {
        let key = self.key_for(filename)?;

        // Locate the object by listing, then fetch it through its handle.
        let blobs = self.store.list(&key).await.map_err(|e| {
            tracing::error!("Error reading blob {}: {}", filename, e);
            e
        })?;
        let blob = blobs
            .iter()
            .find(|b| b.pathname == key)
            .ok_or_else(|| Error::not_found(filename))?;

        self.store.fetch(blob).await.map_err(|e| {
            if !e.is_not_found() {
                tracing::error!("Error fetching blob {}: {}", filename, e);
            }
            e
        })
    }

    async fn write(&self, filename: &str, content: &str) -> Result<()> {
        let key = self.key_for(filename)?;
        self.store
            .put(&key, content.to_string())
            .await
            .map_err(|e| {
                tracing::error!("Error writing blob {}: {}", filename, e);
                e
            })?;
        tracing::debug!("Wrote blob {} ({} bytes)", key, content.len());
        Ok(())
    }

    async fn delete(&self, filename: &str) -> Result<()> {
        let key = self.key_for(filename)?;
        match self.store.delete(&key).await {
            Ok(()) => {
                tracing::debug!("Deleted blob {}", key);
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => {
                tracing::error!("Error deleting blob {}: {}", filename, e);
                Err(e)
            }
        }
    }
}
