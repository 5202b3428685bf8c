//! Email delivery for the donation portal
//!
//! Renders the sign-in email with askama and hands it to a lettre transport.
//! SMTP is used in production; the file transport writes `.eml` files for
//! local development and tests.

pub mod config;
pub mod email;
pub mod email_types;
pub mod error;
pub mod mailer;
pub mod templates;
pub mod transports;

pub use config::{MailerConfig, TlsType, TransportConfig};
pub use email::Email;
pub use email_types::MagicLinkEmail;
pub use error::MailerError;
pub use lettre::{Address, message::Mailbox};
pub use mailer::Mailer;
pub use templates::{AskamaTemplateEngine, TemplateContext, TemplateEngine};
pub use transports::{FileTransport, SmtpTransport};
