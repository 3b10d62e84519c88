//! Edit an existing post

use anyhow::Result;

use super::new::DraftFields;
use crate::Blog;

/// Run the edit command
pub async fn run(blog: &Blog, slug: &str, fields: DraftFields) -> Result<()> {
    let entry = match blog.repository.get_by_slug(slug).await {
        Some(entry) => entry,
        None => anyhow::bail!("Post not found: {}", slug),
    };
    let post = match entry.into_post() {
        Some(post) => post,
        None => anyhow::bail!(
            "Post {} has malformed front-matter; run `inkwell fix {}` first",
            slug,
            slug
        ),
    };

    let draft = fields.merge_into(post)?;
    let new_slug = blog.repository.update(slug, draft).await?;
    if new_slug == slug {
        println!("Updated: {}", slug);
    } else {
        println!("Updated: {} -> {}", slug, new_slug);
    }
    Ok(())
}
