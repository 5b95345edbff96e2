use crate::config::SmtpConfig;
use async_trait::async_trait;
use cni_core::{CoreError, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail transport. The server picks `SmtpMailer` when SMTP is
/// configured and `LogMailer` otherwise; tests substitute a recorder.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<()>;
}

/// Delivers over SMTP with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, from: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| CoreError::Email {
                message: format!("invalid SMTP relay {}: {e}", smtp.host),
            })?
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
            .build();

        let from = from.parse().map_err(|e| CoreError::Email {
            message: format!("invalid sender address {from}: {e}"),
        })?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        let to: Mailbox = email.to.parse().map_err(|e| CoreError::Email {
            message: format!("invalid recipient {}: {e}", email.to),
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .body(email.body)
            .map_err(|e| CoreError::Email {
                message: format!("failed to build message: {e}"),
            })?;

        self.transport
            .send(message)
            .await
            .map_err(|e| CoreError::Email {
                message: format!("SMTP delivery to {} failed: {e}", email.to),
            })?;

        Ok(())
    }
}

/// Logs messages instead of sending them. Used when SMTP is not configured,
/// so the whole signup flow works locally with codes visible in the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        info!(to = %email.to, subject = %email.subject, "email (not sent): {}", email.body);
        Ok(())
    }
}
