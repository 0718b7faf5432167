//! Command-line interface definitions for Backlog Watch.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every global option can also be supplied through an environment variable,
//! and a `.env` file in the working directory is loaded before parsing.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Command-line arguments for the Backlog Watch application.
///
/// # Examples
///
/// ```sh
/// # Serve the home page and the check trigger
/// backlog_watch serve --bind 0.0.0.0:8080
///
/// # Run one check cycle from cron
/// backlog_watch --data-dir ./data check
///
/// # See what would be sent without sending it
/// backlog_watch check --dry-run
///
/// # Print what was published in the last two weeks
/// backlog_watch list --days 14
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the last-checked watermark file
    #[arg(long, env = "LAST_CHECKED_DIR", default_value = "/data", global = true)]
    pub data_dir: PathBuf,

    /// Reference timezone for the watermark and date formatting
    #[arg(long, env = "DEFAULT_TZ", default_value = crate::config::DEFAULT_TIMEZONE, global = true)]
    pub timezone: String,

    /// Bearer token required by the HTTP check trigger (empty denies every caller)
    #[arg(long, env = "API_TOKEN", default_value = "", hide_env_values = true, global = true)]
    pub api_token: String,

    /// SMTP relay used to send the digest
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com", global = true)]
    pub smtp_host: String,

    /// Sender address, also used as the SMTP login
    #[arg(long, env = "EMAIL_USERNAME", global = true)]
    pub email_username: Option<String>,

    /// SMTP password for the sender
    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true, global = true)]
    pub email_password: Option<String>,

    /// Digest recipient
    #[arg(long, env = "RECEIVER_EMAIL", global = true)]
    pub receiver_email: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Upper bound for `list --days`, roughly a century.
const MAX_LIST_DAYS: i64 = 36_500;

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run the HTTP service (GET / renders recent articles, POST / triggers a check)
    Serve {
        /// Address to listen on
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
    /// Run a single check cycle and email any new articles
    Check {
        /// Log the digest instead of sending it and leave the stored watermark alone
        #[arg(long)]
        dry_run: bool,
    },
    /// Print articles published in the last N days without touching the watermark
    List {
        /// How many days back to look (0 to 36500)
        #[arg(
            short,
            long,
            default_value_t = crate::config::DEFAULT_LOOKBACK_DAYS,
            value_parser = clap::value_parser!(i64).range(0..=MAX_LIST_DAYS)
        )]
        days: i64,
    },
}
