//! Outbound email over SMTP, or into the log when no relay is configured.

use anyhow::Context as _;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpSettings;
use crate::domain::repository::Mailer;
use crate::domain::types::OutgoingEmail;
use crate::error::ShopServiceError;

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings, from: &str) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .context("configure SMTP relay")?
            .port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: from.parse().with_context(|| format!("invalid MAIL_FROM {from}"))?,
        })
    }

    fn build(&self, email: &OutgoingEmail) -> anyhow::Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for to in &email.to {
            let mailbox: Mailbox = to
                .parse()
                .with_context(|| format!("invalid recipient {to}"))?;
            builder = builder.to(mailbox);
        }
        builder.body(email.body.clone()).context("build email")
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ShopServiceError> {
        let message = self.build(email)?;
        self.transport
            .send(message)
            .await
            .with_context(|| format!("send email {:?}", email.subject))?;
        tracing::info!(recipients = email.to.len(), subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Writes emails to the log. Used when SMTP is not configured.
#[derive(Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ShopServiceError> {
        tracing::info!(
            to = ?email.to,
            subject = %email.subject,
            body = %email.body,
            "email not sent, SMTP disabled"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub enum AppMailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl AppMailer {
    pub fn from_settings(smtp: Option<&SmtpSettings>, from: &str) -> anyhow::Result<Self> {
        match smtp {
            Some(settings) => Ok(Self::Smtp(SmtpMailer::new(settings, from)?)),
            None => {
                tracing::warn!("SMTP_HOST not set, emails will only be logged");
                Ok(Self::Log(LogMailer))
            }
        }
    }
}

impl Mailer for AppMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ShopServiceError> {
        match self {
            Self::Smtp(mailer) => mailer.send(email).await,
            Self::Log(mailer) => mailer.send(email).await,
        }
    }
}
