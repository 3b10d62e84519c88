//! Initialize a new blog directory

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::SiteConfig;
use crate::content::{filename_for, serialize, slugify, PostDraft};
use crate::helpers::format_timestamp;
use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# Inkwell Configuration

# Site
title: Inkwell
description: ''
## Default author for new posts
author: ''

# Directory holding <slug>.md files
posts_dir: content/posts

# Storage
## backend: auto | local | remote
## auto picks remote when INKWELL_ENV=production, local otherwise.
## INKWELL_STORAGE=local|remote overrides this setting.
storage:
  backend: auto
  prefix: posts/
  base_url: https://blob.vercel-storage.com
  token_env: BLOB_READ_WRITE_TOKEN

# JSON API
server:
  ip: localhost
  port: 4000
"#;

const WELCOME_BODY: &str = r#"Welcome to your new blog. Posts are plain markdown files with a
front-matter header; edit this one or create another with:

```bash
$ inkwell new --title "My New Post" --content "Hello"
```

Run `inkwell serve` to browse posts through the JSON API.
"#;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let config = SiteConfig::load(&config_path)?;
    let posts_dir = target_dir.join(&config.posts_dir);
    fs::create_dir_all(&posts_dir)?;

    let mut draft = PostDraft::new("Hello World", WELCOME_BODY);
    draft.excerpt = "Your first post".to_string();
    draft.category = Some("General".to_string());
    draft.tags = vec!["welcome".to_string()];
    let text = serialize(&draft, &format_timestamp(&chrono::Utc::now()), None);
    fs::write(posts_dir.join(filename_for(&slugify(&draft.title))), text)?;

    Ok(())
}
