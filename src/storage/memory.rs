//! In-process object store

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::object_store::{BlobObject, ObjectStore};
use crate::error::{Error, Result};

const URL_SCHEME: &str = "memory://";

/// Object store that keeps everything in a map.
///
/// Useful for testing the remote backend without a network. Clones share
/// the same objects.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<String, String>>>,
    fail_mutations: Arc<AtomicBool>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put` and `delete` fail, to simulate an unavailable store
    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Keys currently stored
    pub async fn keys(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }

    fn check_writable(&self, pathname: &str) -> Result<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(Error::remote(format!("store unavailable for {}", pathname)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        let objects = self.objects.lock().await;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(|key| BlobObject {
                pathname: key.clone(),
                url: format!("{}{}", URL_SCHEME, key),
                download_url: format!("{}{}", URL_SCHEME, key),
            })
            .collect())
    }

    async fn fetch(&self, object: &BlobObject) -> Result<String> {
        let key = object
            .download_url
            .strip_prefix(URL_SCHEME)
            .ok_or_else(|| Error::remote(format!("bad handle {}", object.download_url)))?;
        self.objects
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(key))
    }

    async fn put(&self, pathname: &str, content: String) -> Result<()> {
        self.check_writable(pathname)?;
        self.objects
            .lock()
            .await
            .insert(pathname.to_string(), content);
        Ok(())
    }

    async fn delete(&self, pathname: &str) -> Result<()> {
        self.check_writable(pathname)?;
        self.objects.lock().await.remove(pathname);
        Ok(())
    }
}
