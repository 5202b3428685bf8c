use crate::{Email, MailerError};
use async_trait::async_trait;
use std::sync::Arc;

/// Something that can deliver an [`Email`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, email: Email) -> Result<(), MailerError>;
}

#[async_trait]
impl<T: Mailer + ?Sized> Mailer for Arc<T> {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        (**self).send_email(email).await
    }
}

#[async_trait]
impl<T: Mailer + ?Sized> Mailer for Box<T> {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        (**self).send_email(email).await
    }
}
