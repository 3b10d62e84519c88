//! Content module - post models and the front-matter file format

pub mod frontmatter;
mod post;
pub mod repair;

pub use frontmatter::{salvage_body, serialize, FrontMatter};
pub use post::{
    filename_for, slug_from_filename, slugify, Post, PostDraft, PostEntry, UnparseablePost,
    ERROR_TITLE, POST_EXTENSION,
};
pub use repair::repair;
