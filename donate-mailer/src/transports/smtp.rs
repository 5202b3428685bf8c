use async_trait::async_trait;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::{Email, Mailer, MailerError};

/// lettre's async SMTP relay, built by [`MailerConfig::build_transport`](crate::MailerConfig::build_transport).
pub type SmtpTransport = AsyncSmtpTransport<Tokio1Executor>;

#[async_trait]
impl Mailer for SmtpTransport {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        let response = self.send(email.to_message()?).await?;
        tracing::debug!(code = %response.code(), to = %email.to, "SMTP relay accepted email");
        Ok(())
    }
}
