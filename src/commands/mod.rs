//! CLI commands

pub mod delete;
pub mod edit;
pub mod fix;
pub mod init;
pub mod list;
pub mod new;
pub mod show;
pub mod taxonomy;
