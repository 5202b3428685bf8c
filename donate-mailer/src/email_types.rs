use lettre::{Address, message::Mailbox};

use crate::{
    Email, MailerError,
    templates::{TemplateContext, TemplateData, TemplateEngine},
};

pub struct MagicLinkEmail;

impl MagicLinkEmail {
    /// Render the sign-in email for `to`.
    ///
    /// `lifetime_minutes` is the shortest time the link stays valid, as
    /// reported by the code engine.
    pub async fn build<T: TemplateEngine>(
        engine: &T,
        from: &Mailbox,
        to: &Address,
        magic_link: &str,
        lifetime_minutes: u32,
        context: TemplateContext,
    ) -> Result<Email, MailerError> {
        let template_data = TemplateData::new()
            .insert("context", &context)?
            .insert("email", to.to_string())?
            .insert("magic_link", magic_link)?
            .insert("lifetime_minutes", lifetime_minutes)?;

        let html_body = engine
            .render_html("magic_link", template_data.clone())
            .await?;
        let text_body = engine.render_text("magic_link", template_data).await?;

        Ok(Email {
            to: to.clone(),
            from: from.clone(),
            subject: format!("Sign in to {} Donations", context.app_name),
            html_body,
            text_body,
        })
    }
}
