//! Runtime settings assembled once at startup and handed to each component.

use crate::cli::Cli;
use crate::error::{Error, Result};
use chrono_tz::Tz;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Display name used to pick the author's metadata blocks out of an archive page.
pub const AUTHOR_NAME: &str = "Sarah Salisbury";
/// First page of the author's archive listing; later pages add `?page=N`.
pub const ARCHIVE_URL: &str = "https://www.cozymeal.com/magazine/authors/sarah-salisbury";
pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;
pub const WATERMARK_FILENAME: &str = "last_checked_time.json";

/// The archive being watched.
#[derive(Debug, Clone)]
pub struct Target {
    pub author_name: String,
    pub archive_url: Url,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            author_name: AUTHOR_NAME.to_string(),
            archive_url: Url::parse(ARCHIVE_URL).expect("ARCHIVE_URL is a valid URL"),
        }
    }
}

/// SMTP credentials and addressing for the digest.
#[derive(Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub username: String,
    pub password: String,
    pub recipient: String,
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

#[derive(Clone)]
pub struct Settings {
    pub target: Target,
    pub timezone: Tz,
    pub data_dir: PathBuf,
    pub lookback_days: i64,
    pub api_token: String,
    pub email: Option<EmailSettings>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("target", &self.target)
            .field("timezone", &self.timezone)
            .field("data_dir", &self.data_dir)
            .field("lookback_days", &self.lookback_days)
            .field("api_token_set", &!self.api_token.is_empty())
            .field("email", &self.email)
            .finish()
    }
}

impl Settings {
    /// Build settings from parsed CLI arguments.
    ///
    /// Email settings are only present when sender, password and recipient
    /// are all supplied; commands that send mail fail later if they are not.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let timezone: Tz = cli
            .timezone
            .parse()
            .map_err(|e| Error::config(format!("unknown timezone {:?}: {}", cli.timezone, e)))?;

        let email = match (&cli.email_username, &cli.email_password, &cli.receiver_email) {
            (Some(username), Some(password), Some(recipient)) => Some(EmailSettings {
                smtp_host: cli.smtp_host.clone(),
                username: username.clone(),
                password: password.clone(),
                recipient: recipient.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            target: Target::default(),
            timezone,
            data_dir: cli.data_dir.clone(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            api_token: cli.api_token.clone(),
            email,
        })
    }

    pub fn watermark_path(&self) -> PathBuf {
        self.data_dir.join(WATERMARK_FILENAME)
    }
}

#[cfg(test)]
impl Settings {
    /// Settings pointing at a throwaway directory, for tests.
    pub fn for_tests(data_dir: PathBuf) -> Self {
        Self {
            target: Target::default(),
            timezone: chrono_tz::America::Los_Angeles,
            data_dir,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            api_token: "valid_token".to_string(),
            email: None,
        }
    }
}
