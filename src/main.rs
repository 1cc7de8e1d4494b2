use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use blackbird::config::Config;
use blackbird::feed::{progress, FeedClient, NormalizedArticle, NormalizedFeed};
use blackbird::util::{strip_control_chars, truncate_to_width, validate_url};

/// Column budget when the terminal width is unknown.
const DEFAULT_COLUMNS: usize = 80;

#[derive(Parser, Debug)]
#[command(name = "blackbird", about = "Fetch, normalize and discover RSS, Atom and JSON feeds")]
struct Args {
    /// Config file (default: ~/.config/blackbird/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a feed and print its normalized articles
    Fetch {
        url: String,
        /// Category to assign to the feed
        #[arg(long, value_name = "ID")]
        category: Option<String>,
        /// Print the normalized feed as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the feeds a website advertises
    Discover { url: String },
    /// Resolve a site's icon and write it to a file
    Icon {
        url: String,
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct FetchReport<'a> {
    feed: &'a NormalizedFeed,
    articles: &'a [NormalizedArticle],
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let Some(path) = path.or_else(Config::default_path) else {
        tracing::debug!("HOME not set, using default configuration");
        return Ok(Config::default());
    };
    Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))
}

fn terminal_columns() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse().ok())
        .filter(|&c| c > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

async fn fetch(client: &FeedClient, url: &str, category: Option<&str>, json: bool) -> Result<()> {
    let (tx, mut rx) = progress::channel();
    let reporter = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let update = *rx.borrow_and_update();
            tracing::info!(fraction = update.fraction, "{}", update.stage.label());
        }
    });

    let result = client.fetch_feed(url, category, Some(&tx)).await;
    drop(tx);
    let _ = reporter.await;
    let (feed, articles) = result.with_context(|| format!("Failed to fetch {url}"))?;

    if json {
        let report = FetchReport {
            feed: &feed,
            articles: &articles,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let columns = terminal_columns();
    println!("{} ({}, {} articles)", feed.title, feed.format, articles.len());
    for article in &articles {
        let minutes = article
            .reading_time()
            .map(|m| format!("{m:>3} min"))
            .unwrap_or_else(|| "   -   ".to_string());
        let marker = if article.starred { '*' } else { ' ' };
        let budget = columns.saturating_sub(minutes.len() + 4);
        println!(
            "{marker} {minutes}  {}",
            truncate_to_width(&strip_control_chars(&article.title), budget)
        );
    }
    Ok(())
}

async fn discover(client: &FeedClient, url: &str) -> Result<()> {
    let feeds = client
        .discover_feeds(url)
        .await
        .with_context(|| format!("Failed to discover feeds for {url}"))?;

    if feeds.is_empty() {
        eprintln!("No feeds found at {url}");
        std::process::exit(1);
    }
    for feed in feeds {
        println!("{feed}");
    }
    Ok(())
}

async fn icon(client: &FeedClient, url: &str, output: &Path) -> Result<()> {
    let url = validate_url(url, client.config().allow_private_hosts)
        .with_context(|| format!("Invalid URL: {url}"))?;

    let mut found = None;
    client.resolve_icon(&url, |bytes| found = Some(bytes)).await;

    let Some(bytes) = found else {
        anyhow::bail!("No icon found for {url}");
    };

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write icon to {}", output.display()))?;
    println!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config)?;
    let client = FeedClient::new(&config).context("Failed to create HTTP client")?;

    match args.command {
        Command::Fetch {
            url,
            category,
            json,
        } => fetch(&client, &url, category.as_deref(), json).await,
        Command::Discover { url } => discover(&client, &url).await,
        Command::Icon { url, output } => icon(&client, &url, &output).await,
    }
}
