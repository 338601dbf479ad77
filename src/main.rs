mod render;
mod tools;

use anyhow::Context;
use clap::{Parser, Subcommand};
use reddit_client::SearchService;
use reddit_data_core::{AppConfig, ErrorExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tools::{SearchArgs, ToolServer};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "reddit_data=info,reddit_client=info";

#[derive(Parser)]
#[command(name = "reddit-data", version, about = "Reddit search tools for LLM callers")]
struct Cli {
    /// TOML configuration file (overrides REDDIT_DATA_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single search and print Markdown
    Search {
        query: String,
        #[arg(short, long)]
        subreddit: Option<String>,
        #[arg(long, default_value = "score")]
        sort: String,
        #[arg(short, long, default_value = "all")]
        time_filter: String,
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(long)]
        comments: bool,
        #[arg(long)]
        comments_per_post: Option<u32>,
        #[arg(long)]
        max_chars: Option<usize>,
    },
    /// Serve tool calls as JSON lines on stdin/stdout
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).map_err(startup_error)?;
    let service = Arc::new(SearchService::from_config(&config).map_err(startup_error)?);
    let server = Arc::new(ToolServer::new(service, config.defaults.clone()));

    match cli.command {
        Command::Search {
            query,
            subreddit,
            sort,
            time_filter,
            limit,
            comments,
            comments_per_post,
            max_chars,
        } => {
            let args = SearchArgs {
                query,
                subreddit,
                sort: Some(sort),
                time_filter: Some(time_filter),
                limit,
                include_comments: comments,
                comments_per_post,
                max_chars,
            };
            println!("{}", server.search(args).await);
        }
        Command::Serve => serve(server).await?,
    }

    Ok(())
}

/// Logs the full error and hands the caller a readable message.
fn startup_error<E: ErrorExt>(error: E) -> anyhow::Error {
    error.log_error();
    anyhow::anyhow!("[{}] {}", error.error_code(), error.user_friendly_message())
}

/// Reads one request per line. Requests run concurrently and replies are
/// written in completion order, each carrying the caller's `id`.
async fn serve(server: Arc<ToolServer>) -> anyhow::Result<()> {
    tracing::info!("Serving tool calls on stdio");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(reply) = rx.recv().await {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let server = Arc::clone(&server);
        let tx = tx.clone();
        tokio::spawn(async move {
            let reply = server.handle_line(&line).await;
            if tx.send(reply).is_err() {
                tracing::warn!("Reply dropped, stdout writer has stopped");
            }
        });
    }

    drop(tx);
    writer.await.context("stdout writer panicked")??;
    tracing::info!("stdin closed, shutting down");
    Ok(())
}
