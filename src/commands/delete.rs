//! Delete a post

use anyhow::Result;

use crate::Blog;

/// Run the delete command
pub async fn run(blog: &Blog, slug: &str) -> Result<()> {
    if blog.repository.delete(slug).await {
        println!("Deleted: {}", slug);
        Ok(())
    } else {
        anyhow::bail!("Failed to delete {}", slug)
    }
}
