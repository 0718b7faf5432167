//! Digest delivery.
//!
//! [`Notifier`] is the seam between a check cycle and the outside world: the
//! cycle hands it the ordered list of new articles, it delivers one digest.
//! [`SmtpNotifier`] sends the digest as a `multipart/alternative` email over
//! implicit TLS. The sender appears in a `Cc` header but the SMTP envelope
//! names only the recipient, so only the recipient's mailbox gets a copy.
//! [`LogNotifier`] only logs it.

use crate::config::EmailSettings;
use crate::error::{Error, Result};
use crate::models::Article;
use crate::outputs::email::render_digest;
use lettre::address::Envelope;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Delivers a digest of new articles.
pub trait Notifier {
    /// Send one digest. Callers only invoke this with a non-empty list.
    fn notify(&self, articles: &[Article]) -> impl Future<Output = Result<()>> + Send;
}

/// Sends the digest through an SMTP relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
}

impl fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("sender", &self.sender.to_string())
            .field("recipient", &self.recipient.to_string())
            .finish()
    }
}

impl SmtpNotifier {
    /// Build a notifier for the configured relay and addresses.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if an address does not parse or the relay cannot be
    /// set up.
    pub fn new(settings: &EmailSettings) -> Result<Self> {
        let sender: Mailbox = settings
            .username
            .parse()
            .map_err(|e| Error::config(format!("invalid sender address {:?}: {}", settings.username, e)))?;
        let recipient: Mailbox = settings
            .recipient
            .parse()
            .map_err(|e| Error::config(format!("invalid recipient address {:?}: {}", settings.recipient, e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)
            .map_err(|e| Error::config(format!("invalid SMTP relay {:?}: {}", settings.smtp_host, e)))?
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }

    /// Assemble the email for a list of articles without sending it.
    pub fn build_message(&self, articles: &[Article]) -> Result<Message> {
        let digest = render_digest(articles);
        let envelope = Envelope::new(
            Some(self.sender.email.clone()),
            vec![self.recipient.email.clone()],
        )
        .map_err(Error::notify)?;

        Message::builder()
            .envelope(envelope)
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .cc(self.sender.clone())
            .subject(digest.subject)
            .multipart(MultiPart::alternative_plain_html(digest.text, digest.html))
            .map_err(Error::notify)
    }
}

impl Notifier for SmtpNotifier {
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    async fn notify(&self, articles: &[Article]) -> Result<()> {
        let t0 = Instant::now();
        let message = self.build_message(articles)?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!(
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    recipient = %self.recipient,
                    "Sent digest email"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, recipient = %self.recipient, "Digest email failed");
                Err(Error::notify(e))
            }
        }
    }
}

/// Writes the digest to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, articles: &[Article]) -> Result<()> {
        let digest = render_digest(articles);
        info!(
            count = articles.len(),
            subject = %digest.subject,
            "Digest not sent:\n{}",
            digest.text
        );
        Ok(())
    }
}
