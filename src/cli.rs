//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::client::{ApiClient, DEFAULT_SERVER_URL};
use crate::config::load_settings;
use crate::models::HistoryPage;
use crate::pagination::{PageToken, Pagination};
use crate::server;
use crate::services::UploadQueue;

#[derive(Parser)]
#[command(name = "gamedrop")]
#[command(about = "Upload game archives to Google Drive", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Upload archives through a running server, one at a time
    Upload {
        /// Archives to upload (.zip)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Google OAuth access token with the drive.file scope
        #[arg(long, env = "GAMEDROP_ACCESS_TOKEN", hide_env_values = true)]
        token: String,

        /// Server base URL
        #[arg(long, default_value = DEFAULT_SERVER_URL)]
        server: String,

        /// Request timeout in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
    },

    /// Show one page of the upload history
    History {
        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Print every upload instead of one page
        #[arg(long, conflicts_with = "page")]
        all: bool,

        /// Server base URL
        #[arg(long, default_value = DEFAULT_SERVER_URL)]
        server: String,
    },
}

/// Execute a parsed command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { host, port } => {
            let mut settings = load_settings().await;
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            server::serve(&settings).await
        }
        Commands::Upload {
            files,
            token,
            server,
            timeout,
        } => upload(files, token, &server, timeout).await,
        Commands::History { page, all, server } => history(page, all, &server).await,
    }
}

async fn upload(files: Vec<PathBuf>, token: String, server: &str, timeout: u64) -> anyhow::Result<()> {
    let client = ApiClient::new(server, Duration::from_secs(timeout))
        .context("failed to create HTTP client")?
        .with_token(token);

    let queue = UploadQueue::new();
    for file in files {
        if let Err(e) = queue.add(&file).await {
            eprintln!("skipping {}: {}", file.display(), e);
        }
    }
    let pending = queue.pending_count().await;
    if pending == 0 {
        bail!("no .zip archives to upload");
    }

    println!("Uploading {} file(s) to {}", pending, server);
    let summary = queue.submit_all(&client).await?;

    for item in queue.items().await {
        println!("  {:<9} {}  {}", item.status, item.file_name(), item.status_label());
    }
    println!(
        "{} of {} uploaded, {} skipped, {} failed",
        summary.uploaded,
        summary.total(),
        summary.skipped,
        summary.failed
    );

    match client.fetch_history_page(1).await {
        Ok(history) => {
            println!();
            print_history_page(&history);
        }
        Err(e) => tracing::warn!("Could not refresh history: {}", e),
    }

    if summary.failed > 0 {
        bail!("{} upload(s) failed", summary.failed);
    }
    Ok(())
}

async fn history(page: u32, all: bool, server: &str) -> anyhow::Result<()> {
    let client = ApiClient::new(server, Duration::from_secs(30))?;
    if all {
        let records = client.fetch_history().await?;
        let everything = Pagination::new(records.len(), records.len());
        print_history_page(&HistoryPage::new(&records, &everything));
        return Ok(());
    }
    let history = client.fetch_history_page(page).await?;
    if history.page != page && history.total_items > 0 {
        tracing::warn!("Page {} does not exist, showing page {}", page, history.page);
    }
    print_history_page(&history);
    Ok(())
}

fn print_history_page(history: &HistoryPage) {
    if history.total_items == 0 {
        println!("No uploads yet.");
        return;
    }

    println!("{:<40} {:<12} LINK", "GAME", "DATE");
    for record in &history.items {
        println!(
            "{:<40} {:<12} {}",
            record.display_name,
            record.uploaded_at.format("%Y-%m-%d"),
            record.remote_link
        );
    }

    if history.total_pages > 1 {
        println!("{}", navigation_line(&history.window, history.page));
    }
}

/// Text rendering of a page window, with the current page bracketed.
pub fn navigation_line(window: &[PageToken], current: u32) -> String {
    window
        .iter()
        .map(|token| match token.page() {
            Some(n) if n == current => format!("[{}]", n),
            _ => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
