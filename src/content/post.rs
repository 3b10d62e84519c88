//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FrontMatter;
use crate::error::{Error, Result};
use crate::helpers::parse_timestamp;

/// File extension of stored posts
pub const POST_EXTENSION: &str = "md";

/// Title shown for a post whose file could not be parsed
pub const ERROR_TITLE: &str = "Error Loading Post";

/// Derive the URL slug for a title: lowercase, non-alphanumeric runs collapsed
/// to single hyphens, no leading or trailing hyphen
pub fn slugify(title: &str) -> String {
    slug::slugify(title)
}

/// Storage key of a slug
pub fn filename_for(slug: &str) -> String {
    format!("{}.{}", slug, POST_EXTENSION)
}

/// Slug of a storage key, if the key is a post file
pub fn slug_from_filename(filename: &str) -> Option<&str> {
    filename
        .strip_suffix(POST_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .filter(|s| !s.is_empty())
}

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Slug (URL-friendly name), also the storage key stem
    pub slug: String,

    /// Post title
    pub title: String,

    /// Creation date
    pub date: DateTime<Utc>,

    /// Last edit
    pub updated_at: Option<DateTime<Utc>>,

    /// Short summary shown in listings
    pub excerpt: String,

    pub cover_image: Option<String>,

    pub author: Option<String>,

    pub category: Option<String>,

    pub tags: Vec<String>,

    /// Raw markdown body
    pub content: String,
}

impl Post {
    /// Build a post from decoded front-matter and its body
    pub fn from_front_matter(slug: &str, fm: FrontMatter, content: &str) -> Self {
        let date = match fm.date.as_deref().and_then(parse_timestamp) {
            Some(date) => date,
            None => {
                tracing::warn!("Post {} has no valid date, using current time", slug);
                Utc::now()
            }
        };

        Self {
            slug: slug.to_string(),
            title: fm
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            date,
            updated_at: fm.updated_at.as_deref().and_then(parse_timestamp),
            excerpt: fm.excerpt.unwrap_or_default(),
            cover_image: fm.cover_image.filter(|s| !s.is_empty()),
            author: fm.author,
            category: fm.category,
            tags: fm.tags,
            content: content.to_string(),
        }
    }

    /// Case-insensitive category match
    pub fn in_category(&self, name: &str) -> bool {
        self.category
            .as_deref()
            .map(|c| c.to_lowercase() == name.to_lowercase())
            .unwrap_or(false)
    }

    /// Case-insensitive tag membership
    pub fn has_tag(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == name)
    }
}

/// Author-supplied fields for creating or editing a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Trim the title, drop blank optional fields and blank tags
    pub fn normalized(mut self) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        self.title = self.title.trim().to_string();
        self.cover_image = blank_to_none(self.cover_image);
        self.author = blank_to_none(self.author);
        self.category = blank_to_none(self.category);
        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    /// Check the draft can be stored and return its slug
    pub fn validate(&self) -> Result<String> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidPost("title is required".to_string()));
        }
        let slug = slugify(&self.title);
        if slug.is_empty() {
            return Err(Error::InvalidPost(format!(
                "title `{}` does not produce a usable slug",
                self.title
            )));
        }
        Ok(slug)
    }
}

/// A stored file that could not be decoded into a [`Post`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnparseablePost {
    pub slug: String,
    /// Whatever body could be salvaged from the file
    pub raw_content: String,
    pub reason: String,
}

/// The result of loading one post file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PostEntry {
    Post(Post),
    Unparseable(UnparseablePost),
}

impl PostEntry {
    pub fn slug(&self) -> &str {
        match self {
            PostEntry::Post(post) => &post.slug,
            PostEntry::Unparseable(entry) => &entry.slug,
        }
    }

    /// Sort date; unparseable entries have none
    pub fn date(&self) -> Option<DateTime<Utc>> {
        match self {
            PostEntry::Post(post) => Some(post.date),
            PostEntry::Unparseable(_) => None,
        }
    }

    pub fn into_post(self) -> Option<Post> {
        match self {
            PostEntry::Post(post) => Some(post),
            PostEntry::Unparseable(_) => None,
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, PostEntry::Unparseable(_))
    }

    /// The post to show a reader: the real one, or a stub explaining the
    /// failure with any salvaged body appended
    pub fn into_placeholder(self) -> Post {
        match self {
            PostEntry::Post(post) => post,
            PostEntry::Unparseable(entry) => {
                let mut content = format!(
                    "This post could not be loaded because its front-matter is malformed ({}).",
                    entry.reason
                );
                if !entry.raw_content.is_empty() {
                    content.push_str("\n\n");
                    content.push_str(&entry.raw_content);
                }
                Post {
                    slug: entry.slug,
                    title: ERROR_TITLE.to_string(),
                    date: DateTime::<Utc>::default(),
                    updated_at: None,
                    excerpt: "There was an error loading this post. Please check the file format."
                        .to_string(),
                    cover_image: None,
                    author: None,
                    category: None,
                    tags: Vec::new(),
                    content,
                }
            }
        }
    }
}
