//! Tag and category listings

use anyhow::Result;

use super::list::format_entry;
use crate::content::{Post, PostEntry};
use crate::query::TermCount;
use crate::Blog;

fn print_counts(label: &str, counts: &[TermCount]) {
    println!("{} ({}):", label, counts.len());
    for term in counts {
        println!("  {} ({})", term.name, term.count);
    }
}

fn print_posts(posts: &[&Post]) {
    for post in posts {
        println!("{}", format_entry(&PostEntry::Post((*post).clone())));
    }
}

/// Run the tags command
pub async fn tags(blog: &Blog) -> Result<()> {
    let query = blog.query().await?;
    print_counts("Tags", &query.tag_counts());
    Ok(())
}

/// Run the categories command
pub async fn categories(blog: &Blog) -> Result<()> {
    let query = blog.query().await?;
    print_counts("Categories", &query.category_counts());
    Ok(())
}

/// Posts in one category
pub async fn category(blog: &Blog, name: &str) -> Result<()> {
    let query = blog.query().await?;
    let posts = query.by_category(name);
    if posts.is_empty() {
        anyhow::bail!("Category not found: {}", name);
    }
    println!("Category {} ({}):", name, posts.len());
    print_posts(&posts);
    Ok(())
}

/// Posts with one tag
pub async fn tag(blog: &Blog, name: &str) -> Result<()> {
    let query = blog.query().await?;
    let posts = query.by_tag(name);
    if posts.is_empty() {
        anyhow::bail!("Tag not found: {}", name);
    }
    println!("Tag {} ({}):", name, posts.len());
    print_posts(&posts);
    Ok(())
}
