//! Print a single post

use anyhow::Result;

use crate::helpers::full_date;
use crate::Blog;

/// Run the show command. Broken posts are printed as their placeholder.
pub async fn run(blog: &Blog, slug: &str, json: bool) -> Result<()> {
    let Some(entry) = blog.repository.get_by_slug(slug).await else {
        anyhow::bail!("Post not found: {}", slug);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    let post = entry.into_placeholder();
    println!("{}", post.title);
    println!("{}", full_date(&post.date));
    if let Some(author) = &post.author {
        println!("by {}", author);
    }
    if let Some(category) = &post.category {
        println!("Category: {}", category);
    }
    if !post.tags.is_empty() {
        println!("Tags: {}", post.tags.join(", "));
    }
    if !post.excerpt.is_empty() {
        println!("\n{}", post.excerpt);
    }
    println!("\n{}", post.content);
    Ok(())
}
