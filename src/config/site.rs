//! Site configuration (_config.yml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Environment variable naming the deployment environment
pub const ENV_VAR: &str = "INKWELL_ENV";

/// Environment variable forcing a storage backend (`local` or `remote`)
pub const STORAGE_VAR: &str = "INKWELL_STORAGE";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub author: String,

    /// Directory holding `<slug>.md` files, relative to the site directory
    pub posts_dir: String,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Inkwell".to_string(),
            description: String::new(),
            author: String::new(),
            posts_dir: "content/posts".to_string(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(config)
    }

    /// Pick the concrete backend for this process from the config and the
    /// process environment
    pub fn resolve_backend(&self) -> Result<BackendKind> {
        let environment = std::env::var(ENV_VAR).ok();
        let forced = std::env::var(STORAGE_VAR).ok();
        self.storage
            .resolve(environment.as_deref(), forced.as_deref())
    }
}

/// Which storage backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote in production, local otherwise
    Auto,
    Local,
    Remote,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "local" => Ok(BackendKind::Local),
            "remote" => Ok(BackendKind::Remote),
            other => Err(Error::config(format!(
                "unknown storage backend `{}` (expected auto, local or remote)",
                other
            ))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Key prefix for posts in the remote store
    pub prefix: String,
    /// Base URL of the blob HTTP API
    pub base_url: String,
    /// Name of the environment variable holding the blob API token
    pub token_env: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            prefix: "posts/".to_string(),
            base_url: "https://blob.vercel-storage.com".to_string(),
            token_env: "BLOB_READ_WRITE_TOKEN".to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolve `auto` against the deployment environment. An explicit
    /// override wins over both.
    pub fn resolve(&self, environment: Option<&str>, forced: Option<&str>) -> Result<BackendKind> {
        let configured = match forced {
            Some(value) => value.parse()?,
            None => self.backend,
        };

        Ok(match configured {
            BackendKind::Auto => {
                let production = environment
                    .map(|e| e.trim().eq_ignore_ascii_case("production"))
                    .unwrap_or(false);
                if production {
                    BackendKind::Remote
                } else {
                    BackendKind::Local
                }
            }
            kind => kind,
        })
    }

    /// Read the blob API token from the configured environment variable
    pub fn token(&self) -> Result<String> {
        std::env::var(&self.token_env).map_err(|_| {
            Error::config(format!(
                "remote storage selected but ${} is not set",
                self.token_env
            ))
        })
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 4000,
        }
    }
}
