//! List posts

use anyhow::Result;

use crate::content::PostEntry;
use crate::helpers::short_date;
use crate::Blog;

/// One listing line for a post
pub fn format_entry(entry: &PostEntry) -> String {
    match entry {
        PostEntry::Post(post) => {
            let mut line = format!("  {} - {} [{}]", short_date(&post.date), post.title, post.slug);
            if let Some(category) = &post.category {
                line.push_str(&format!(" ({})", category));
            }
            line
        }
        PostEntry::Unparseable(entry) => {
            format!("  ????-??-?? - {} [{}]: {}", crate::content::ERROR_TITLE, entry.slug, entry.reason)
        }
    }
}

/// Run the list command
pub async fn run(blog: &Blog) -> Result<()> {
    let entries = blog.repository.list().await?;
    println!("{} - Posts ({}):", blog.config.title, entries.len());
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{FrontMatter, Post, UnparseablePost};

    #[test]
    fn test_format_entry() {
        let fm = FrontMatter {
            title: Some("Hello".to_string()),
            date: Some("2024-03-01T00:00:00.000Z".to_string()),
            category: Some("News".to_string()),
            ..Default::default()
        };
        let post = Post::from_front_matter("hello", fm, "");
        assert_eq!(
            format_entry(&PostEntry::Post(post)),
            "  2024-03-01 - Hello [hello] (News)"
        );

        let broken = PostEntry::Unparseable(UnparseablePost {
            slug: "bad".to_string(),
            raw_content: String::new(),
            reason: "oops".to_string(),
        });
        assert!(format_entry(&broken).contains("[bad]: oops"));
    }
}
