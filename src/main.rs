//! CLI entry point for inkwell

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkwell::commands::new::DraftFields;
use inkwell::Blog;

#[derive(Parser)]
#[command(name = "inkwell")]
#[command(author = "Yukang Chen")]
#[command(version)]
#[command(about = "A markdown blog post store with local and remote backends", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Post fields shared by `new` and `edit`
#[derive(Args)]
struct PostArgs {
    /// Post title
    #[arg(short, long)]
    title: Option<String>,

    /// Short summary
    #[arg(short, long)]
    excerpt: Option<String>,

    /// Cover image URL
    #[arg(long)]
    cover_image: Option<String>,

    #[arg(short, long)]
    author: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Inline markdown body
    #[arg(long, conflicts_with = "file")]
    content: Option<String>,

    /// Read the body from a file, `-` for stdin
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl From<PostArgs> for DraftFields {
    fn from(args: PostArgs) -> Self {
        DraftFields {
            title: args.title,
            excerpt: args.excerpt,
            cover_image: args.cover_image,
            author: args.author,
            category: args.category,
            tags: if args.tags.is_empty() {
                None
            } else {
                Some(args.tags)
            },
            content: args.content,
            file: args.file,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new blog
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// List posts, newest first
    #[command(alias = "ls")]
    List,

    /// Print one post
    Show {
        slug: String,

        /// Print the stored entry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new post
    New {
        #[command(flatten)]
        post: PostArgs,
    },

    /// Edit a post; unset fields keep their current value, empty ones clear it
    Edit {
        slug: String,

        #[command(flatten)]
        post: PostArgs,
    },

    /// Delete a post
    #[command(alias = "rm")]
    Delete { slug: String },

    /// Repair malformed front-matter in one post or all posts
    Fix { slug: Option<String> },

    /// List tags by post count
    Tags,

    /// List categories by post count
    Categories,

    /// List posts in a category
    Category { name: String },

    /// List posts with a tag
    Tag { name: String },

    /// Serve the JSON API
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "inkwell=debug,info"
    } else {
        "inkwell=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing blog in {:?}", target_dir);
            inkwell::commands::init::init_site(&target_dir)?;
            println!("Initialized blog in {:?}", target_dir);
        }

        Commands::Version => {
            println!("inkwell version {}", env!("CARGO_PKG_VERSION"));
        }

        command => {
            let blog = Blog::open(&base_dir).await?;
            run(&blog, command).await?;
        }
    }

    Ok(())
}

async fn run(blog: &Blog, command: Commands) -> Result<()> {
    use inkwell::commands::*;

    match command {
        Commands::List => list::run(blog).await,
        Commands::Show { slug, json } => show::run(blog, &slug, json).await,
        Commands::New { post } => new::run(blog, post.into()).await,
        Commands::Edit { slug, post } => edit::run(blog, &slug, post.into()).await,
        Commands::Delete { slug } => delete::run(blog, &slug).await,
        Commands::Fix { slug } => fix::run(blog, slug.as_deref()).await,
        Commands::Tags => taxonomy::tags(blog).await,
        Commands::Categories => taxonomy::categories(blog).await,
        Commands::Category { name } => taxonomy::category(blog, &name).await,
        Commands::Tag { name } => taxonomy::tag(blog, &name).await,
        Commands::Serve { port, ip } => {
            let ip = ip.unwrap_or_else(|| blog.config.server.ip.clone());
            let port = port.unwrap_or(blog.config.server.port);
            tracing::info!("Starting server at http://{}:{}", ip, port);
            inkwell::server::start(blog, &ip, port).await
        }
        Commands::Init { .. } | Commands::Version => Ok(()),
    }
}
