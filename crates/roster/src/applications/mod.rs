//! "Become a model" submissions relayed to the agency inbox by email.

pub mod form;
pub mod mail;
pub mod relay;
pub mod router;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use form::ApplicationForm;
pub use mail::{MailAttachment, OutboundMail};
pub use relay::{MailRelay, RelayError, SmtpRelay};
pub use router::application_router;

use crate::config::MailConfig;

const AUTHENTICATION_HINT: &str = "SMTP authentication failed. Check the SMTP credentials; \
     providers that enforce two-factor sign-in expect an app-specific password.";

#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("{0}")]
    Invalid(String),
    #[error("Server configuration error")]
    NotConfigured,
    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl ApplicationError {
    /// Message returned to the submitter.
    pub fn public_message(&self) -> String {
        match self {
            ApplicationError::Relay(err) if err.is_authentication() => AUTHENTICATION_HINT.to_string(),
            other => other.to_string(),
        }
    }
}

/// Validates submissions, renders the notification and hands it to the relay.
pub struct ApplicationService<M> {
    relay: Arc<M>,
    mail: Option<MailConfig>,
}

impl<M> ApplicationService<M>
where
    M: MailRelay + 'static,
{
    pub fn new(relay: Arc<M>, mail: Option<MailConfig>) -> Self {
        Self { relay, mail }
    }

    pub fn is_configured(&self) -> bool {
        self.mail.is_some()
    }

    pub async fn submit(
        &self,
        form: &ApplicationForm,
        submitted_at: DateTime<Utc>,
    ) -> Result<OutboundMail, ApplicationError> {
        form.validate()?;

        let Some(config) = &self.mail else {
            tracing::error!("application received but SMTP is not configured");
            return Err(ApplicationError::NotConfigured);
        };

        let mail = OutboundMail::from_application(form, config, submitted_at);
        if let Err(err) = self.relay.deliver(config, &mail).await {
            tracing::error!(error = %err, applicant = %form.full_name(), "failed to relay application");
            return Err(err.into());
        }

        tracing::info!(
            applicant = %form.full_name(),
            attachments = mail.attachments.len(),
            "application relayed"
        );
        Ok(mail)
    }
}
