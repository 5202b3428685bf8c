use crate::{MailerError, templates::TemplateData};
use askama::Template;

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Sign in to {{ app_name }} Donations</title>
    <style>
        body { font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; font-size: 14px; line-height: 1.6; color: #555555; margin: 0; padding: 20px; background-color: #f4f4f4; }
        .container { max-width: 600px; margin: 0 auto; background: #ffffff; padding: 40px 20px; text-align: center; }
        h1 { font-size: 24px; font-weight: 700; color: #333333; }
        .button { display: inline-block; padding: 12px 32px; background-color: #cc3333; color: #ffffff; font-size: 16px; font-weight: 600; text-decoration: none; border-radius: 6px; margin: 20px 0; }
        .muted { color: #888888; font-size: 13px; }
        .link { color: #0066cc; font-size: 11px; word-break: break-all; }
        .footer { margin-top: 30px; padding-top: 20px; border-top: 1px solid #e0e0e0; font-size: 12px; color: #999999; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Sign in to {{ app_name }}</h1>

        <p>You requested a magic link to sign in to manage your {{ app_name }} donation.</p>

        <p class="muted">Email: <strong>{{ email }}</strong></p>

        <a href="{{ magic_link|safe }}" class="button">Sign In</a>

        <p class="muted">This link will expire in {{ lifetime_minutes }} minutes.</p>

        <div class="footer">
            <p>If you didn't request this email, you can safely ignore it.</p>
            <p>Or copy and paste this link into your browser:</p>
            <p class="link">{{ magic_link|safe }}</p>
            <p><a href="{{ app_url|safe }}">{{ app_name }}</a></p>
        </div>
    </div>
</body>
</html>
"#,
    ext = "html"
)]
pub struct MagicLinkHtmlTemplate {
    pub app_name: String,
    pub app_url: String,
    pub email: String,
    pub magic_link: String,
    pub lifetime_minutes: u32,
}

#[derive(Template)]
#[template(
    source = r#"Sign in to {{ app_name }}

You requested a magic link to sign in to manage your {{ app_name }} donation.

Email: {{ email }}

Open this link to sign in:
{{ magic_link }}

This link will expire in {{ lifetime_minutes }} minutes.

If you didn't request this email, you can safely ignore it.

{{ app_name }} - {{ app_url }}
"#,
    ext = "txt"
)]
pub struct MagicLinkTextTemplate {
    pub app_name: String,
    pub app_url: String,
    pub email: String,
    pub magic_link: String,
    pub lifetime_minutes: u32,
}

impl MagicLinkHtmlTemplate {
    pub fn from_data(data: &TemplateData) -> Result<Self, MailerError> {
        let context = data.context();

        Ok(Self {
            email: data.require_str("email")?,
            magic_link: data.require_str("magic_link")?,
            app_name: context.app_name,
            app_url: context.app_url,
            lifetime_minutes: data.require_u32("lifetime_minutes")?,
        })
    }
}

impl MagicLinkTextTemplate {
    pub fn from_data(data: &TemplateData) -> Result<Self, MailerError> {
        let html = MagicLinkHtmlTemplate::from_data(data)?;

        Ok(Self {
            app_name: html.app_name,
            app_url: html.app_url,
            email: html.email,
            magic_link: html.magic_link,
            lifetime_minutes: html.lifetime_minutes,
        })
    }
}
