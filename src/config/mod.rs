//! Configuration module

mod site;

pub use site::BackendKind;
pub use site::ServerConfig;
pub use site::SiteConfig;
pub use site::StorageConfig;
pub use site::{ENV_VAR, STORAGE_VAR};
