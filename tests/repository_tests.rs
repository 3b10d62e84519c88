//! End-to-end behavior of the post repository over both backends

use std::sync::Arc;

use inkwell::content::{FrontMatter, PostDraft, PostEntry};
use inkwell::query::ContentQuery;
use inkwell::repository::PostRepository;
use inkwell::storage::{LocalStorage, MemoryObjectStore, PostStorage, RemoteStorage};
use tempfile::TempDir;

/// A repository per backend; the tempdir must outlive the local one
fn backends() -> (TempDir, Vec<PostRepository>) {
    let dir = TempDir::new().unwrap();
    let local: Arc<dyn PostStorage> = Arc::new(LocalStorage::new(dir.path().join("posts")));
    let remote: Arc<dyn PostStorage> = Arc::new(RemoteStorage::new(
        Arc::new(MemoryObjectStore::new()),
        "posts/",
    ));
    (
        dir,
        vec![PostRepository::new(local), PostRepository::new(remote)],
    )
}

fn dated(title: &str, date: &str) -> String {
    format!("---\ntitle: {}\ndate: {}\n---\n\nbody of {}\n", title, date, title)
}

#[tokio::test]
async fn list_is_newest_first() {
    let (_dir, repos) = backends();
    for repo in repos {
        let storage = repo.storage();
        storage
            .write("jan.md", &dated("January", "2024-01-15T00:00:00.000Z"))
            .await
            .unwrap();
        storage
            .write("mar.md", &dated("March", "2024-03-15T00:00:00.000Z"))
            .await
            .unwrap();
        storage
            .write("feb.md", &dated("February", "2024-02-15T00:00:00.000Z"))
            .await
            .unwrap();
        storage.write("notes.txt", "ignored").await.unwrap();

        let titles: Vec<String> = repo
            .posts()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["March", "February", "January"], "{}", storage.name());
    }
}

#[tokio::test]
async fn unparseable_posts_sort_last() {
    let (_dir, repos) = backends();
    for repo in repos {
        let storage = repo.storage();
        storage
            .write("good.md", &dated("Good", "2020-01-01T00:00:00.000Z"))
            .await
            .unwrap();
        storage
            .write("bad.md", "---\ntitle: [unclosed\n---\n\nstill here")
            .await
            .unwrap();

        let entries = repo.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].slug(), "good");
        assert!(entries[1].is_unparseable());

        let placeholder = entries[1].clone().into_placeholder();
        assert_eq!(placeholder.title, "Error Loading Post");
        assert!(placeholder.content.contains("still here"));
    }
}

#[tokio::test]
async fn awkward_title_round_trips() {
    let (_dir, repos) = backends();
    for repo in repos {
        let mut draft = PostDraft::new("My: Title", "Hello *world*");
        draft.excerpt = "He said \"hi\" # not a comment".to_string();
        draft.tags = vec!["a: b".to_string(), "plain".to_string()];

        let slug = repo.create(draft).await.unwrap();
        assert_eq!(slug, "my-title");

        let post = repo
            .get_by_slug("my-title")
            .await
            .and_then(PostEntry::into_post)
            .unwrap();
        assert_eq!(post.title, "My: Title");
        assert_eq!(post.excerpt, "He said \"hi\" # not a comment");
        assert_eq!(post.tags, vec!["a: b", "plain"]);
        assert_eq!(post.content, "Hello *world*");
    }
}

#[tokio::test]
async fn update_renames_and_keeps_date() {
    let (_dir, repos) = backends();
    for repo in repos {
        repo.storage()
            .write("foo.md", &dated("Foo", "2023-06-01T12:00:00.000Z"))
            .await
            .unwrap();

        let slug = repo.update("foo", PostDraft::new("Bar", "new")).await.unwrap();
        assert_eq!(slug, "bar");
        assert!(repo.get_by_slug("foo").await.is_none());

        let text = repo.storage().read("bar.md").await.unwrap();
        let (fm, body) = FrontMatter::parse(&text).unwrap();
        assert_eq!(fm.date.as_deref(), Some("2023-06-01T12:00:00.000Z"));
        assert!(fm.updated_at.is_some());
        assert_eq!(body, "new");
    }
}

#[tokio::test]
async fn update_with_same_slug_deletes_nothing() {
    let (_dir, repos) = backends();
    for repo in repos {
        repo.create(PostDraft::new("Same", "v1")).await.unwrap();
        let slug = repo.update("same", PostDraft::new("Same", "v2")).await.unwrap();
        assert_eq!(slug, "same");

        let post = repo
            .get_by_slug("same")
            .await
            .and_then(PostEntry::into_post)
            .unwrap();
        assert_eq!(post.content, "v2");
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn delete_then_get_is_none() {
    let (_dir, repos) = backends();
    for repo in repos {
        repo.create(PostDraft::new("Gone", "x")).await.unwrap();
        assert!(repo.delete("gone").await);
        assert!(repo.get_by_slug("gone").await.is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn repair_makes_posts_loadable() {
    let (_dir, repos) = backends();
    for repo in repos {
        repo.storage()
            .write(
                "legacy.md",
                "---\ntitle: Rust: A Love Story\ndate: 2022-02-02T00:00:00.000Z\ntags: [rust, love]\n---\n\nbody",
            )
            .await
            .unwrap();
        assert!(repo.list().await.unwrap()[0].is_unparseable());

        let report = repo.repair_all().await.unwrap();
        assert_eq!(report.summary(), "Fixed 1 of 1 posts");

        let post = repo
            .get_by_slug("legacy")
            .await
            .and_then(PostEntry::into_post)
            .unwrap();
        assert_eq!(post.title, "Rust: A Love Story");
        assert_eq!(post.tags, vec!["rust", "love"]);

        assert_eq!(repo.repair_all().await.unwrap().fixed_count(), 0);
    }
}

#[tokio::test]
async fn taxonomy_views_ignore_case() {
    let (_dir, repos) = backends();
    for repo in repos {
        let mut a = PostDraft::new("A", "");
        a.category = Some("Programming".to_string());
        a.tags = vec!["React".to_string()];
        let mut b = PostDraft::new("B", "");
        b.category = Some("programming".to_string());
        b.tags = vec!["react".to_string(), "css".to_string()];
        repo.create(a).await.unwrap();
        repo.create(b).await.unwrap();

        let query = ContentQuery::load(&repo).await.unwrap();
        assert_eq!(query.by_tag("React").len(), 2);
        assert_eq!(query.by_tag("react"), query.by_tag("REACT"));
        assert_eq!(query.by_category("PROGRAMMING").len(), 2);
        assert!(query.by_category("missing").is_empty());

        let tags = query.tag_counts();
        assert_eq!(tags[0].key, "react");
        assert_eq!(tags[0].count, 2);
        assert_eq!(tags[1].key, "css");

        let categories = query.category_counts();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Programming");
    }
}

#[tokio::test]
async fn titles_with_control_characters_stay_loadable() {
    let (_dir, repos) = backends();
    for repo in repos {
        for title in ["Bell\u{7}Title", "Line\u{2028}Sep", "Nel\u{85}Next"] {
            let slug = repo.create(PostDraft::new(title, "body")).await.unwrap();
            let post = repo
                .get_by_slug(&slug)
                .await
                .and_then(PostEntry::into_post)
                .unwrap_or_else(|| panic!("{:?} did not load", title));
            assert_eq!(post.title, title);
            assert!(repo.delete(&slug).await);
        }
    }
}

#[tokio::test]
async fn equal_dates_keep_listing_order() {
    let (_dir, repos) = backends();
    for repo in repos {
        let storage = repo.storage();
        for name in ["b", "a", "c"] {
            storage
                .write(&format!("{}.md", name), &dated(name, "2024-05-05T00:00:00.000Z"))
                .await
                .unwrap();
        }
        storage
            .write("newest.md", &dated("newest", "2024-06-01T00:00:00.000Z"))
            .await
            .unwrap();

        let slugs: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .iter()
            .map(|e| e.slug().to_string())
            .collect();
        // Both backends enumerate by name; ties keep that order
        assert_eq!(slugs, vec!["newest", "a", "b", "c"], "{}", storage.name());
    }
}
