//! Create a new post

use anyhow::{Context, Result};
use std::io::Read;
use std::path::PathBuf;

use crate::content::{Post, PostDraft};
use crate::Blog;

/// Post fields given on the command line. Unset fields keep their current
/// value when editing; an empty value clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct DraftFields {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Inline body
    pub content: Option<String>,
    /// Read the body from a file, `-` for stdin
    pub file: Option<PathBuf>,
}

impl DraftFields {
    fn read_body(&self) -> Result<Option<String>> {
        if let Some(content) = &self.content {
            return Ok(Some(content.clone()));
        }
        match &self.file {
            Some(path) if path.as_os_str() == "-" => {
                let mut body = String::new();
                std::io::stdin().read_to_string(&mut body)?;
                Ok(Some(body))
            }
            Some(path) => std::fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("Failed to read {:?}", path)),
            None => Ok(None),
        }
    }

    /// Fill in the site author when no author was given
    pub fn with_default_author(mut self, author: &str) -> Self {
        if self.author.is_none() && !author.trim().is_empty() {
            self.author = Some(author.to_string());
        }
        self
    }

    /// Draft for a brand new post
    pub fn into_draft(self) -> Result<PostDraft> {
        let body = self.read_body()?.unwrap_or_default();
        Ok(PostDraft {
            title: self.title.unwrap_or_default(),
            excerpt: self.excerpt.unwrap_or_default(),
            content: body,
            cover_image: self.cover_image,
            author: self.author,
            tags: self.tags.unwrap_or_default(),
            category: self.category,
        })
    }

    /// Draft for editing `post`: given fields replace the stored ones
    pub fn merge_into(self, post: Post) -> Result<PostDraft> {
        let body = self.read_body()?;
        Ok(PostDraft {
            title: self.title.unwrap_or(post.title),
            excerpt: self.excerpt.unwrap_or(post.excerpt),
            content: body.unwrap_or(post.content),
            cover_image: self.cover_image.or(post.cover_image),
            author: self.author.or(post.author),
            tags: self.tags.unwrap_or(post.tags),
            category: self.category.or(post.category),
        })
    }
}

/// Run the new command
pub async fn run(blog: &Blog, fields: DraftFields) -> Result<()> {
    let draft = fields
        .with_default_author(&blog.config.author)
        .into_draft()?;
    let slug = blog.repository.create(draft).await?;
    println!("Created: {}", slug);
    Ok(())
}
