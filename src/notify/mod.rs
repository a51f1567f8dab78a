use crate::config::SmtpConfig;
use crate::error::NotifyError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// Transport seam for the one notification a run may send.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), NotifyError>;

    /// False for dry-run transports; gates marker bookkeeping.
    fn enabled(&self) -> bool {
        true
    }
}

/// STARTTLS SMTP sender with a fixed sender address and Bcc recipient list.
/// Credentials come from configuration and are never logged.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    bcc: Vec<Mailbox>,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self, NotifyError> {
        let sender: Mailbox = cfg.sender.parse()?;
        let bcc = cfg
            .bcc
            .iter()
            .map(|addr| addr.parse())
            .collect::<Result<Vec<Mailbox>, _>>()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();
        Ok(SmtpMailer {
            transport,
            sender,
            bcc,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML);
        for mailbox in &self.bcc {
            builder = builder.bcc(mailbox.clone());
        }
        let message = builder.body(html_body.to_string())?;

        self.transport.send(message).await?;
        info!(recipients = self.bcc.len(), subject, "rate email sent");
        Ok(())
    }
}

/// Dry-run transport: succeeds without touching the network.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, subject: &str, _html_body: &str) -> Result<(), NotifyError> {
        info!(subject, "email sending disabled; skipping transport");
        Ok(())
    }

    fn enabled(&self) -> bool {
        false
    }
}
