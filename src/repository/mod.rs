//! Post repository - maps stored files to posts
//!
//! Every call goes back to the storage backend; nothing is cached between
//! calls. Two writers editing the same slug race and the last write wins.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

use crate::content::{
    self, filename_for, salvage_body, slug_from_filename, FrontMatter, Post, PostDraft, PostEntry,
    UnparseablePost,
};
use crate::error::{Error, Result};
use crate::helpers::format_timestamp;
use crate::storage::PostStorage;

lazy_static! {
    static ref DATE_LINE_RE: Regex = Regex::new(r"(?m)^date:[ \t]*(.+?)[ \t]*\r?$").unwrap();
}

/// Loads and stores posts through a [`PostStorage`] backend
#[derive(Clone)]
pub struct PostRepository {
    storage: Arc<dyn PostStorage>,
}

impl PostRepository {
    pub fn new(storage: Arc<dyn PostStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn PostStorage> {
        &self.storage
    }

    /// Load every post, newest first.
    ///
    /// A file that cannot be read or parsed is returned as
    /// [`PostEntry::Unparseable`] so the listing keeps one entry per file;
    /// those sort after all dated posts.
    pub async fn list(&self) -> Result<Vec<PostEntry>> {
        let filenames = self.storage.list().await?;

        let mut entries = Vec::with_capacity(filenames.len());
        for filename in &filenames {
            let Some(slug) = slug_from_filename(filename) else {
                continue;
            };
            let entry = match self.storage.read(filename).await {
                Ok(text) => parse_entry(slug, &text),
                Err(e) => {
                    tracing::warn!("Failed to read post {}: {}", filename, e);
                    PostEntry::Unparseable(UnparseablePost {
                        slug: slug.to_string(),
                        raw_content: String::new(),
                        reason: e.to_string(),
                    })
                }
            };
            entries.push(entry);
        }

        // Sort by date descending (newest first); stable for equal dates
        entries.sort_by(|a, b| b.date().cmp(&a.date()));

        Ok(entries)
    }

    /// Load every post that parsed, newest first
    pub async fn posts(&self) -> Result<Vec<Post>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter_map(PostEntry::into_post)
            .collect())
    }

    /// Look up one post. A missing post is `None`; a broken one is
    /// [`PostEntry::Unparseable`]. Errors never escape.
    pub async fn get_by_slug(&self, slug: &str) -> Option<PostEntry> {
        let filename = filename_for(slug);
        match self.storage.read(&filename).await {
            Ok(text) => Some(parse_entry(slug, &text)),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::error!("Error getting post by slug {}: {}", slug, e);
                None
            }
        }
    }

    /// Store a new post and return its slug.
    ///
    /// Fails with [`Error::SlugConflict`] when a post with the same slug
    /// already exists.
    pub async fn create(&self, draft: PostDraft) -> Result<String> {
        let draft = draft.normalized();
        let slug = draft.validate()?;
        let filename = filename_for(&slug);

        if self.storage.exists(&filename).await? {
            return Err(Error::SlugConflict(slug));
        }

        let date = format_timestamp(&Utc::now());
        let text = content::serialize(&draft, &date, None);
        self.storage.write(&filename, &text).await?;

        tracing::info!("Created post {}", slug);
        Ok(slug)
    }

    /// Rewrite an existing post and return its (possibly new) slug.
    ///
    /// The original `date` is kept; `updatedAt` is set to now. When the title
    /// change produces a new slug the post moves to the new key and the old
    /// key is removed. If the old file is missing or has no date, the current
    /// time becomes the date.
    pub async fn update(&self, slug: &str, draft: PostDraft) -> Result<String> {
        let draft = draft.normalized();
        let new_slug = draft.validate()?;
        let old_filename = filename_for(slug);
        let new_filename = filename_for(&new_slug);

        let now = format_timestamp(&Utc::now());
        let date = match self.storage.read(&old_filename).await {
            Ok(text) => original_date(&text),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        let date = date.unwrap_or_else(|| {
            tracing::warn!("No original date for post {}, using current time", slug);
            now.clone()
        });

        let renamed = new_slug != slug;
        if renamed && self.storage.exists(&new_filename).await? {
            return Err(Error::SlugConflict(new_slug));
        }

        let text = content::serialize(&draft, &date, Some(&now));
        self.storage.write(&new_filename, &text).await?;

        if renamed {
            self.storage.delete(&old_filename).await?;
            tracing::info!("Renamed post {} -> {}", slug, new_slug);
        } else {
            tracing::info!("Updated post {}", slug);
        }

        Ok(new_slug)
    }

    /// Remove a post. Returns false instead of failing.
    pub async fn delete(&self, slug: &str) -> bool {
        match self.storage.delete(&filename_for(slug)).await {
            Ok(()) => {
                tracing::info!("Deleted post {}", slug);
                true
            }
            Err(e) => {
                tracing::error!("Error deleting post {}: {}", slug, e);
                false
            }
        }
    }

    /// Repair one post's front-matter in place. Returns whether the file
    /// changed.
    pub async fn repair(&self, slug: &str) -> Result<bool> {
        let filename = filename_for(slug);
        let text = self.storage.read(&filename).await?;
        let repaired = content::repair(&text);
        if repaired == text {
            return Ok(false);
        }
        self.storage.write(&filename, &repaired).await?;
        tracing::info!("Repaired front-matter of {}", slug);
        Ok(true)
    }

    /// Repair every post. Per-file failures are recorded, not raised.
    pub async fn repair_all(&self) -> Result<RepairReport> {
        let filenames = self.storage.list().await?;

        let mut results = Vec::new();
        for filename in &filenames {
            let Some(slug) = slug_from_filename(filename) else {
                continue;
            };
            let outcome = match self.repair(slug).await {
                Ok(fixed) => RepairOutcome {
                    slug: slug.to_string(),
                    fixed,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Failed to repair {}: {}", slug, e);
                    RepairOutcome {
                        slug: slug.to_string(),
                        fixed: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(outcome);
        }

        Ok(RepairReport { results })
    }
}

/// Outcome of repairing one post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairOutcome {
    pub slug: String,
    pub fixed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of repairing every post
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairReport {
    pub results: Vec<RepairOutcome>,
}

impl RepairReport {
    pub fn fixed_count(&self) -> usize {
        self.results.iter().filter(|r| r.fixed).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "Fixed {} of {} posts",
            self.fixed_count(),
            self.results.len()
        )
    }
}

fn parse_entry(slug: &str, text: &str) -> PostEntry {
    match FrontMatter::parse(text) {
        Ok((fm, body)) => PostEntry::Post(Post::from_front_matter(slug, fm, body)),
        Err(e) => {
            tracing::warn!("Failed to parse post {}: {}", slug, e);
            PostEntry::Unparseable(UnparseablePost {
                slug: slug.to_string(),
                raw_content: salvage_body(text),
                reason: e.to_string(),
            })
        }
    }
}

/// The `date` value of a stored file, read structurally when the
/// front-matter parses and from the raw `date:` line otherwise
fn original_date(text: &str) -> Option<String> {
    if let Ok((fm, _)) = FrontMatter::parse(text) {
        return fm.date.filter(|d| !d.trim().is_empty());
    }

    let block = content::frontmatter::split(text)
        .map(|(block, _)| block)
        .unwrap_or(text);
    DATE_LINE_RE
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStorage, MemoryObjectStore, RemoteStorage};

    fn local() -> (tempfile::TempDir, PostRepository) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("posts"));
        (dir, PostRepository::new(Arc::new(storage)))
    }

    fn remote() -> (MemoryObjectStore, PostRepository) {
        let store = MemoryObjectStore::new();
        let storage = RemoteStorage::new(Arc::new(store.clone()), "posts/");
        (store, PostRepository::new(Arc::new(storage)))
    }

    #[test]
    fn test_original_date_structural() {
        let text = "---\ntitle: A\ndate: 2024-01-15T10:30:00.000Z\n---\n\nbody";
        assert_eq!(
            original_date(text).as_deref(),
            Some("2024-01-15T10:30:00.000Z")
        );
    }

    #[test]
    fn test_original_date_from_broken_file() {
        let text = "---\ntitle: My: Title\ndate: \"2024-01-15T10:30:00.000Z\"\n---\n\nbody";
        assert_eq!(
            original_date(text).as_deref(),
            Some("2024-01-15T10:30:00.000Z")
        );
        assert_eq!(original_date("---\ntitle: My: Title\n---\n"), None);
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, repo) = local();
        let mut draft = PostDraft::new("Hello, World!", "# Hi\n\nBody");
        draft.tags = vec!["Rust".to_string()];

        let slug = repo.create(draft).await.unwrap();
        assert_eq!(slug, "hello-world");

        let post = repo.get_by_slug(&slug).await.unwrap().into_post().unwrap();
        assert_eq!(post.title, "Hello, World!");
        assert_eq!(post.content, "# Hi\n\nBody");
        assert_eq!(post.tags, vec!["Rust"]);
        assert!(post.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let (_dir, repo) = local();
        repo.create(PostDraft::new("Same", "one")).await.unwrap();
        let err = repo.create(PostDraft::new("same!", "two")).await.unwrap_err();
        assert!(matches!(err, Error::SlugConflict(ref s) if s == "same"));

        let post = repo.get_by_slug("same").await.unwrap().into_post().unwrap();
        assert_eq!(post.content, "one");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let (_dir, repo) = local();
        let err = repo.create(PostDraft::new("   ", "x")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPost(_)));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (_dir, repo) = local();
        assert!(repo.get_by_slug("nope").await.is_none());
        assert!(repo.get_by_slug("../etc/passwd").await.is_none());
    }

    #[tokio::test]
    async fn test_get_broken_post_is_placeholder() {
        let (_dir, repo) = local();
        repo.storage()
            .write("broken.md", "---\ntitle: My: Title\n---\n\nSalvaged body\n")
            .await
            .unwrap();

        let entry = repo.get_by_slug("broken").await.unwrap();
        let PostEntry::Unparseable(ref broken) = entry else {
            panic!("expected an unparseable entry");
        };
        assert_eq!(broken.raw_content, "Salvaged body");

        let placeholder = entry.into_placeholder();
        assert_eq!(placeholder.title, content::ERROR_TITLE);
        assert!(placeholder.content.contains("Salvaged body"));
    }

    #[tokio::test]
    async fn test_list_skips_non_markdown_and_keeps_broken() {
        let (_dir, repo) = local();
        repo.create(PostDraft::new("Good", "ok")).await.unwrap();
        repo.storage().write("notes.txt", "ignored").await.unwrap();
        repo.storage().write("bad.md", "no front-matter").await.unwrap();

        let entries = repo.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].slug(), "good");
        assert!(entries[1].is_unparseable());

        let posts = repo.posts().await.unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_date_and_sets_updated_at() {
        let (_store, repo) = remote();
        repo.storage()
            .write(
                "foo.md",
                "---\ntitle: Foo\ndate: 2024-01-01T00:00:00.000Z\n---\n\nold",
            )
            .await
            .unwrap();

        let slug = repo
            .update("foo", PostDraft::new("Foo", "new"))
            .await
            .unwrap();
        assert_eq!(slug, "foo");

        let post = repo.get_by_slug("foo").await.unwrap().into_post().unwrap();
        assert_eq!(format_timestamp(&post.date), "2024-01-01T00:00:00.000Z");
        assert!(post.updated_at.is_some());
        assert_eq!(post.content, "new");
    }

    #[tokio::test]
    async fn test_update_rename_moves_file() {
        let (store, repo) = remote();
        repo.create(PostDraft::new("Foo", "a")).await.unwrap();

        let slug = repo.update("foo", PostDraft::new("Bar", "b")).await.unwrap();
        assert_eq!(slug, "bar");
        assert_eq!(store.keys().await, vec!["posts/bar.md"]);
    }

    #[tokio::test]
    async fn test_update_refuses_to_overwrite_other_post() {
        let (_dir, repo) = local();
        repo.create(PostDraft::new("Foo", "a")).await.unwrap();
        repo.create(PostDraft::new("Bar", "b")).await.unwrap();

        let err = repo.update("foo", PostDraft::new("Bar", "c")).await.unwrap_err();
        assert!(matches!(err, Error::SlugConflict(_)));
        assert!(repo.get_by_slug("foo").await.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_post_uses_now() {
        let (_dir, repo) = local();
        let before = Utc::now() - chrono::Duration::seconds(1);
        let slug = repo
            .update("ghost", PostDraft::new("Ghost", "boo"))
            .await
            .unwrap();
        let post = repo.get_by_slug(&slug).await.unwrap().into_post().unwrap();
        assert!(post.date >= before);
    }

    #[tokio::test]
    async fn test_delete_reports_failure_as_false() {
        let (store, repo) = remote();
        repo.create(PostDraft::new("Foo", "a")).await.unwrap();

        store.fail_mutations(true);
        assert!(!repo.delete("foo").await);

        store.fail_mutations(false);
        assert!(repo.delete("foo").await);
        assert!(repo.get_by_slug("foo").await.is_none());
    }

    #[tokio::test]
    async fn test_repair_all() {
        let (_dir, repo) = local();
        repo.create(PostDraft::new("Fine", "ok")).await.unwrap();
        repo.storage()
            .write(
                "broken.md",
                "---\ntitle: My: Title\ndate: 2024-01-01\n---\n\nbody",
            )
            .await
            .unwrap();

        let report = repo.repair_all().await.unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.fixed_count(), 1);
        assert_eq!(report.summary(), "Fixed 1 of 2 posts");

        let post = repo.get_by_slug("broken").await.unwrap().into_post().unwrap();
        assert_eq!(post.title, "My: Title");

        // Second run has nothing left to do
        assert_eq!(repo.repair_all().await.unwrap().fixed_count(), 0);
    }
}
