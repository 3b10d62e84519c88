//! Listing views derived from the full post list: by category, by tag, and
//! tag/category frequency counts

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::content::{Post, PostEntry};
use crate::error::Result;
use crate::repository::PostRepository;

/// A tag or category with the number of posts using it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    /// Lowercase key used for matching
    pub key: String,
    /// Key with its first letter capitalized, for display only
    pub name: String,
    /// Percent-encoded key for use in a URL path
    pub slug: String,
    pub count: usize,
}

/// Read-only views over one snapshot of the posts
#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
    posts: Vec<Post>,
}

impl ContentQuery {
    /// Build from a listing; unparseable entries are left out
    pub fn new(entries: Vec<PostEntry>) -> Self {
        Self {
            posts: entries.into_iter().filter_map(PostEntry::into_post).collect(),
        }
    }

    pub fn from_posts(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    /// Snapshot the repository's current listing
    pub async fn load(repo: &PostRepository) -> Result<Self> {
        Ok(Self::new(repo.list().await?))
    }

    /// All posts, newest first
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Posts whose category matches `name`, ignoring case. An empty result
    /// means the category does not exist.
    pub fn by_category(&self, name: &str) -> Vec<&Post> {
        self.posts.iter().filter(|p| p.in_category(name)).collect()
    }

    /// Posts tagged `name`, ignoring case
    pub fn by_tag(&self, name: &str) -> Vec<&Post> {
        self.posts.iter().filter(|p| p.has_tag(name)).collect()
    }

    /// Categories by descending post count
    pub fn category_counts(&self) -> Vec<TermCount> {
        count_terms(self.posts.iter().filter_map(|p| p.category.as_deref()))
    }

    /// Tags by descending post count
    pub fn tag_counts(&self) -> Vec<TermCount> {
        count_terms(
            self.posts
                .iter()
                .flat_map(|p| p.tags.iter().map(String::as_str)),
        )
    }
}

/// Count terms case-insensitively. Ties keep first-seen order.
fn count_terms<'a>(terms: impl Iterator<Item = &'a str>) -> Vec<TermCount> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for term in terms {
        let key = term.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    sorted
        .into_iter()
        .map(|(key, count)| TermCount {
            name: display_name(&key),
            slug: utf8_percent_encode(&key, NON_ALPHANUMERIC).to_string(),
            key,
            count,
        })
        .collect()
}

/// Capitalize the first letter
pub fn display_name(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
