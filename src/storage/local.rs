//! Local-directory backend

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{validate_filename, PostStorage};
use crate::error::{Error, Result};

/// Stores each post as a file in a single directory
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the post files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the posts directory if it does not exist yet
    pub async fn init(&self) -> Result<()> {
        if !fs::try_exists(&self.dir).await.unwrap_or(false) {
            tracing::debug!("Creating posts directory {:?}", self.dir);
            fs::create_dir_all(&self.dir).await.map_err(|e| {
                tracing::error!("Failed to create posts directory {:?}: {}", self.dir, e);
                Error::Io(e)
            })?;
        }
        Ok(())
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        validate_filename(filename)?;
        Ok(self.dir.join(filename))
    }
}

#[async_trait]
impl PostStorage for LocalStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::error!("Error reading posts directory {:?}: {}", self.dir, e);
                return Err(e.into());
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            // Follow symlinks; a dangling link is skipped
            let is_file = match fs::metadata(entry.path()).await {
                Ok(meta) => meta.is_file(),
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", entry.path(), e);
                    false
                }
            };
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        // read_dir order is platform dependent
        names.sort();
        tracing::debug!("Listed {} files in {:?}", names.len(), self.dir);
        Ok(names)
    }

    async fn read(&self, filename: &str) -> Result<String> {
        let path = self.path_for(filename)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::not_found(filename)),
            Err(e) => {
                tracing::error!("Error reading file {}: {}", filename, e);
                Err(e.into())
            }
        }
    }

    async fn write(&self, filename: &str, content: &str) -> Result<()> {
        let path = self.path_for(filename)?;
        self.init().await?;
        fs::write(&path, content).await.map_err(|e| {
            tracing::error!("Error writing file {}: {}", filename, e);
            Error::Io(e)
        })?;
        tracing::debug!("Wrote {} ({} bytes)", filename, content.len());
        Ok(())
    }

    async fn delete(&self, filename: &str) -> Result<()> {
        let path = self.path_for(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::error!("Error deleting file {}: {}", filename, e);
                Err(e.into())
            }
        }
    }
}
