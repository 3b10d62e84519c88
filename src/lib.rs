//! inkwell: a markdown blog post store
//!
//! Posts live as `<slug>.md` files with YAML front-matter, either in a local
//! directory or in a remote blob store. This crate provides the file format,
//! the storage backends, a repository with create/update/delete semantics, and
//! the listing views (by category, by tag, frequency counts) built on top.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod query;
pub mod repository;
pub mod server;
pub mod storage;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the site configuration file
pub const CONFIG_FILE: &str = "_config.yml";

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Post repository over the selected backend
    pub repository: repository::PostRepository,
}

impl Blog {
    /// Open a blog from a directory: load `_config.yml` (defaults when
    /// absent) and initialize the storage backend selected for this process
    pub async fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config = Self::load_config(&base_dir)?;
        let storage = storage::open(&config, &base_dir).await?;
        Ok(Self::with_storage(config, base_dir, storage))
    }

    /// Build a blog over an already constructed backend
    pub fn with_storage<P: AsRef<Path>>(
        config: config::SiteConfig,
        base_dir: P,
        storage: Arc<dyn storage::PostStorage>,
    ) -> Self {
        Self {
            config,
            base_dir: base_dir.as_ref().to_path_buf(),
            repository: repository::PostRepository::new(storage),
        }
    }

    /// Load `_config.yml` from a directory, or the defaults
    pub fn load_config(base_dir: &Path) -> Result<config::SiteConfig> {
        let config_path = base_dir.join(CONFIG_FILE);
        if config_path.exists() {
            config::SiteConfig::load(&config_path)
        } else {
            Ok(config::SiteConfig::default())
        }
    }

    /// Snapshot the listing views
    pub async fn query(&self) -> Result<query::ContentQuery> {
        query::ContentQuery::load(&self.repository).await
    }
}
