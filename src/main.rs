//! CLI entry point for blogtree

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "blogtree")]
#[command(version)]
#[command(about = "Serve a tree of markdown files as a browsable blog", long_about = None)]
struct Cli {
    /// Set the site directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a content path to stdout
    #[command(alias = "r")]
    Render {
        /// Content path, relative to the source root
        path: String,

        /// Language to render in
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// List a directory in natural order
    List {
        /// Directory path, relative to the source root
        #[arg(default_value = "")]
        path: String,

        /// Language the entries link to
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Print the resolved title of a markdown document
    Title {
        path: String,
    },

    /// Start the HTTP server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to server.ip)
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
        "blogtree=debug,info"
    } else {
        "blogtree=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    match cli.command {
        Commands::Render { path, lang } => {
            let blog = blogtree::Blog::new(&base_dir)?;
            blogtree::commands::render::run(&blog, &path, lang.as_deref())?;
        }

        Commands::List { path, lang } => {
            let blog = blogtree::Blog::new(&base_dir)?;
            blogtree::commands::list::run(&blog, &path, lang.as_deref())?;
        }

        Commands::Title { path } => {
            let blog = blogtree::Blog::new(&base_dir)?;
            blogtree::commands::title::run(&blog, &path)?;
        }

        Commands::Serve { port, ip } => {
            let blog = blogtree::Blog::new(&base_dir)?;
            let port = port.unwrap_or(blog.config.server.port);
            let ip = ip.unwrap_or_else(|| blog.config.server.ip.clone());

            tracing::info!("Starting server at http://{}:{}", ip, port);
            blogtree::server::start(blog, &ip, port).await?;
        }

        Commands::Version => {
            println!("blogtree version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
