use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::mail::OutboundMail;
use crate::config::MailConfig;

pub const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Port on which SMTP speaks TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("SMTP connection failed: {0}")]
    Connection(String),
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("email build error: {0}")]
    Build(String),
}

impl RelayError {
    pub fn is_authentication(&self) -> bool {
        let message = self.to_string();
        message.contains("535") || message.to_lowercase().contains("authentication")
    }
}

/// Delivers rendered notifications.
pub trait MailRelay: Send + Sync {
    fn deliver(
        &self,
        config: &MailConfig,
        mail: &OutboundMail,
    ) -> impl Future<Output = Result<(), RelayError>> + Send;
}

/// `lettre` SMTP relay: implicit TLS on port 465, STARTTLS otherwise. The
/// connection is verified before the message is handed over.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpRelay;

impl SmtpRelay {
    fn transport(config: &MailConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, RelayError> {
        let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        };

        Ok(builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.trim().to_string(),
                config.smtp_password.trim().to_string(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build())
    }
}

impl MailRelay for SmtpRelay {
    async fn deliver(&self, config: &MailConfig, mail: &OutboundMail) -> Result<(), RelayError> {
        let message = build_message(mail)?;
        let transport = Self::transport(config)?;

        tracing::info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            implicit_tls = config.smtp_port == IMPLICIT_TLS_PORT,
            "verifying SMTP connection"
        );
        if !transport.test_connection().await? {
            return Err(RelayError::Connection(format!(
                "{}:{} did not accept the connection",
                config.smtp_host, config.smtp_port
            )));
        }

        transport.send(message).await?;
        tracing::info!(
            to = %mail.to,
            attachments = mail.attachments.len(),
            "application notification sent"
        );
        Ok(())
    }
}

/// Assembles the multipart message: plain and HTML alternatives followed by
/// the decoded attachments.
pub fn build_message(mail: &OutboundMail) -> Result<Message, RelayError> {
    let from = Mailbox::new(Some(mail.from_name.to_string()), mail.from_address.parse()?);

    let mut body = MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
        mail.text.clone(),
        mail.html.clone(),
    ));
    for attachment in &mail.attachments {
        let bytes = STANDARD
            .decode(&attachment.content)
            .map_err(|err| RelayError::Build(format!("{}: {err}", attachment.filename)))?;
        let mime = mime_guess::from_path(&attachment.filename).first_or(mime_guess::mime::IMAGE_JPEG);
        let content_type = ContentType::parse(mime.essence_str())
            .map_err(|err| RelayError::Build(err.to_string()))?;
        body = body.singlepart(Attachment::new(attachment.filename.clone()).body(bytes, content_type));
    }

    Message::builder()
        .from(from)
        .to(mail.to.parse()?)
        .reply_to(mail.reply_to.parse()?)
        .subject(mail.subject.clone())
        .multipart(body)
        .map_err(|err| RelayError::Build(err.to_string()))
}
