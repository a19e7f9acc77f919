// Copyright 2026 Orgscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! orgscope command-line entry point.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use orgscope::ports::{EnvCredentialStore, FileCacheStore};
use orgscope::record::response_body;
use orgscope::{ScrapeRequest, Scraper};

use crate::config::{resolve_cache_dir, resolve_scraper_config, FetchOverrides};

#[derive(Parser)]
#[command(
    name = "orgscope",
    about = "Fetch a company profile page and extract a structured entity record",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a profile URL and print the record as JSON.
    Scrape {
        /// Profile URL (http or https).
        url: String,

        /// Skip the cache lookup. The result is still cached.
        #[arg(long)]
        no_cache: bool,

        /// Cache directory. Also reads ORGSCOPE_CACHE_DIR.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Retries after the first attempt. Also reads ORGSCOPE_MAX_RETRIES.
        #[arg(long)]
        max_retries: Option<u32>,

        /// Delay before the first retry, in ms. Also reads ORGSCOPE_BASE_DELAY_MS.
        #[arg(long)]
        base_delay_ms: Option<u64>,

        /// Per-attempt timeout in ms. Also reads ORGSCOPE_TIMEOUT_MS.
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// User-Agent header. Also reads ORGSCOPE_USER_AGENT.
        #[arg(long)]
        user_agent: Option<String>,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Extract a record from a saved HTML file without touching the network.
    Extract {
        /// Path to the saved page.
        file: PathBuf,

        /// URL to report as the profile URL.
        #[arg(long, default_value = "")]
        url: String,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Manage the result cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   orgscope completions bash > ~/.local/share/bash-completion/completions/orgscope
    ///   orgscope completions zsh > ~/.zfunc/_orgscope
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete every cached result.
    Clear {
        /// Cache directory. Also reads ORGSCOPE_CACHE_DIR.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn init_logging(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    match cli.command {
        Commands::Scrape {
            url,
            no_cache,
            cache_dir,
            max_retries,
            base_delay_ms,
            timeout_ms,
            user_agent,
            pretty,
        } => {
            let overrides = FetchOverrides {
                max_retries,
                base_delay_ms,
                timeout_ms,
                user_agent,
            };
            let config = resolve_scraper_config(&overrides);
            let cache = FileCacheStore::new(resolve_cache_dir(cache_dir));
            tracing::debug!(cache_dir = %cache.cache_dir().display(), "using file cache");

            let scraper = Scraper::with_http(Arc::new(cache), Arc::new(EnvCredentialStore::default()), config);
            let request = ScrapeRequest {
                use_cache: !no_cache,
                ..ScrapeRequest::post(url)
            };

            match scraper.scrape(&request).await {
                Ok(records) => {
                    print_json(&records, pretty)?;
                    scraper.flush().await;
                }
                Err(e) => {
                    tracing::error!(status = e.status_code(), error = %e, "scrape failed");
                    print_json(&e.to_error_body(), pretty)?;
                    std::process::exit(1);
                }
            }
        }

        Commands::Extract { file, url, pretty } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            match orgscope::extract_record(&html, &url) {
                Ok(record) => print_json(&response_body(record), pretty)?,
                Err(e) => {
                    let body = orgscope::record::ErrorBody { error: e.to_string() };
                    print_json(&body, pretty)?;
                    std::process::exit(1);
                }
            }
        }

        Commands::Cache {
            action: CacheAction::Clear { cache_dir },
        } => {
            let cache = FileCacheStore::new(resolve_cache_dir(cache_dir));
            let removed = cache.clear().await?;
            println!("Removed {removed} cached entries from {}", cache.cache_dir().display());
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "orgscope", &mut std::io::stdout());
        }
    }

    Ok(())
}
