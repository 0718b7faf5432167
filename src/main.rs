//! # Backlog Watch
//!
//! Watches one author's article archive and emails a digest when new posts
//! appear.
//!
//! ## Usage
//!
//! ```sh
//! backlog_watch serve            # GET / lists the last week, POST / runs a check
//! backlog_watch check            # one check cycle, for cron
//! backlog_watch check --dry-run  # log the digest, keep the watermark
//! backlog_watch list --days 14
//! ```
//!
//! ## Architecture
//!
//! A check cycle is a straight pipeline:
//! 1. **Watermark**: read the last-checked instant (default: a week ago)
//! 2. **Scraping**: walk archive pages from 1 until one yields no articles
//! 3. **Filtering**: sort newest first, keep articles at or after the watermark
//! 4. **Notification**: email one digest, then advance the watermark

use chrono::{DateTime, FixedOffset};
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod filter;
mod models;
mod notify;
mod outputs;
mod scrapers;
mod server;
mod service;
mod utils;
mod watermark;

use cli::{Cli, Command};
use config::{EmailSettings, Settings};
use models::Article;
use notify::{LogNotifier, SmtpNotifier};
use scrapers::archive::ArchiveClient;
use service::{CheckOutcome, DigestService};
use utils::ensure_writable_dir;
use watermark::{JsonFileStore, MemoryStore, WatermarkStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; real deployments set the environment directly.
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "Loaded .env");
    }

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    let settings = Settings::from_cli(&args)?;
    info!(?settings, command = ?args.command, "backlog_watch starting up");

    let source = ArchiveClient::new(settings.target.archive_url.clone());
    let store = JsonFileStore::new(settings.watermark_path(), settings.timezone);

    match args.command {
        Command::Serve { bind } => {
            ensure_writable_dir(&settings.data_dir).await?;
            let notifier = SmtpNotifier::new(require_email(&settings)?)?;
            let service = Arc::new(DigestService::new(source, store, notifier, settings));
            server::serve(server::router(service), bind).await?;
        }
        Command::Check { dry_run: false } => {
            ensure_writable_dir(&settings.data_dir).await?;
            let notifier = SmtpNotifier::new(require_email(&settings)?)?;
            let service = DigestService::new(source, store, notifier, settings);
            report(&service.check().await?);
        }
        Command::Check { dry_run: true } => {
            let scratch = MemoryStore::new(store.get());
            let service = DigestService::new(source, scratch, LogNotifier, settings);
            report(&service.check().await?);
        }
        Command::List { days } => {
            let service = DigestService::new(source, store, LogNotifier, settings);
            let (articles, since) = service.recent(days).await?;
            print_listing(&articles, since);
        }
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Execution complete");
    Ok(())
}

fn require_email(settings: &Settings) -> Result<&EmailSettings, error::Error> {
    settings.email.as_ref().ok_or_else(|| {
        error::Error::config(
            "EMAIL_USERNAME, EMAIL_PASSWORD and RECEIVER_EMAIL must be set to send the digest",
        )
    })
}

fn report(outcome: &CheckOutcome) {
    match outcome {
        CheckOutcome::NoNewArticles => println!("No new articles."),
        CheckOutcome::Notified {
            articles,
            watermark,
        } => {
            println!(
                "Sent digest with {} article(s); watermark now {}",
                articles.len(),
                watermark.to_rfc3339()
            );
        }
    }
}

fn print_listing(articles: &[Article], since: DateTime<FixedOffset>) {
    println!("Articles published since {}:", since.format("%m/%d/%Y"));
    if articles.is_empty() {
        println!("No new articles!");
    }
    for article in articles {
        println!(
            "{}: {} ({})",
            article.pretty_date(),
            article.pretty_title(),
            article.url
        );
    }
}
