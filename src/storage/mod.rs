//! Storage backends for post files
//!
//! Posts are plain text blobs addressed by file name (`<slug>.md`). A backend
//! is chosen once at startup and shared behind [`PostStorage`]; nothing else in
//! the crate branches on which one is active.

mod local;
mod memory;
mod object_store;
mod remote;

pub use local::LocalStorage;
pub use memory::MemoryObjectStore;
pub use object_store::{BlobObject, HttpBlobStore, ObjectStore};
pub use remote::RemoteStorage;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::{BackendKind, SiteConfig};
use crate::error::{Error, Result};

/// Uniform access to named text blobs
///
/// No operation retries; a failure is returned to the caller as-is.
#[async_trait]
pub trait PostStorage: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// All file names in the store
    async fn list(&self) -> Result<Vec<String>>;

    /// Read a file, failing with [`Error::NotFound`] when it is absent
    async fn read(&self, filename: &str) -> Result<String>;

    /// Create or overwrite a file
    async fn write(&self, filename: &str, content: &str) -> Result<()>;

    /// Remove a file. Removing an absent file succeeds.
    async fn delete(&self, filename: &str) -> Result<()>;

    /// Whether a file exists
    async fn exists(&self, filename: &str) -> Result<bool> {
        match self.read(filename).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Build the backend selected by the configuration and environment.
///
/// This is the one-time initialization step: the local backend gets its
/// directory created here.
pub async fn open(config: &SiteConfig, base_dir: &Path) -> Result<Arc<dyn PostStorage>> {
    connect(config.resolve_backend()?, config, base_dir).await
}

/// Build a specific backend
pub async fn connect(
    kind: BackendKind,
    config: &SiteConfig,
    base_dir: &Path,
) -> Result<Arc<dyn PostStorage>> {
    match kind {
        BackendKind::Remote => {
            let token = config.storage.token()?;
            let store = HttpBlobStore::new(&config.storage.base_url, token);
            tracing::info!(
                "Using remote blob storage at {} (prefix {})",
                config.storage.base_url,
                config.storage.prefix
            );
            Ok(Arc::new(RemoteStorage::new(
                Arc::new(store),
                &config.storage.prefix,
            )))
        }
        BackendKind::Local | BackendKind::Auto => {
            let storage = LocalStorage::new(base_dir.join(&config.posts_dir));
            storage.init().await?;
            tracing::info!("Using local storage at {:?}", storage.dir());
            Ok(Arc::new(storage))
        }
    }
}

/// Reject names that would escape the store
pub(crate) fn validate_filename(filename: &str) -> Result<()> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0');
    if invalid {
        return Err(Error::InvalidPost(format!(
            "invalid file name `{}`",
            filename
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("hello-world.md").is_ok());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("../secret.md").is_err());
        assert!(validate_filename("a/b.md").is_err());
        assert!(validate_filename("a\\b.md").is_err());
    }

    #[tokio::test]
    async fn test_connect_remote_requires_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.storage.token_env = "INKWELL_TEST_TOKEN_THAT_IS_NOT_SET".to_string();

        let err = connect(BackendKind::Remote, &config, dir.path())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_open_local_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::default();

        let storage = connect(BackendKind::Local, &config, dir.path())
            .await
            .unwrap();
        assert_eq!(storage.name(), "local");
        assert!(dir.path().join("content/posts").is_dir());
    }
}
