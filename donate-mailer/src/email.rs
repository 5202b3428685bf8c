use lettre::{
    Address, Message,
    message::{Mailbox, MultiPart, SinglePart},
};

use crate::MailerError;

/// A rendered sign-in email addressed to exactly one donor.
///
/// Addresses are parsed before an `Email` exists, so the recipient a
/// transport delivers to is always the bare address the link was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: Address,
    pub from: Mailbox,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl Email {
    /// Convert into a `multipart/alternative` lettre message.
    pub fn to_message(&self) -> Result<Message, MailerError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, self.to.clone()))
            .subject(self.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(self.text_body.clone()))
                    .singlepart(SinglePart::html(self.html_body.clone())),
            )?;

        Ok(message)
    }
}
