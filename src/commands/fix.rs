//! Repair malformed front-matter

use anyhow::Result;

use crate::Blog;

/// Repair one post, or every post when `slug` is `None`
pub async fn run(blog: &Blog, slug: Option<&str>) -> Result<()> {
    if let Some(slug) = slug {
        if blog.repository.repair(slug).await? {
            println!("Fixed: {}", slug);
        } else {
            println!("Nothing to fix in {}", slug);
        }
        return Ok(());
    }

    let report = blog.repository.repair_all().await?;
    for outcome in &report.results {
        match (&outcome.error, outcome.fixed) {
            (Some(error), _) => println!("  {} - error: {}", outcome.slug, error),
            (None, true) => println!("  {} - fixed", outcome.slug),
            (None, false) => {}
        }
    }
    println!("{}", report.summary());
    Ok(())
}
