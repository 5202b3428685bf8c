use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use donate_core::{ConfigError, MagicLinkService, SecretString};
use donate_mailer::{AskamaTemplateEngine, Mailer, MailerConfig};

use crate::{session::cookie_key, types::CookieConfig};

/// Shared state for the authentication routes.
#[derive(Clone)]
pub struct AuthState {
    pub magic_link: Arc<MagicLinkService>,
    pub mailer: Arc<dyn Mailer>,
    pub mailer_config: Arc<MailerConfig>,
    pub templates: AskamaTemplateEngine,
    pub cookie_config: CookieConfig,
    key: Key,
}

impl AuthState {
    pub fn new(
        magic_link: MagicLinkService,
        mailer: Arc<dyn Mailer>,
        mailer_config: MailerConfig,
        cookie_secret: &SecretString,
    ) -> Result<Self, ConfigError> {
        let cookie_config = CookieConfig::for_environment(magic_link.secrets().production);

        Ok(Self {
            magic_link: Arc::new(magic_link),
            mailer,
            mailer_config: Arc::new(mailer_config),
            templates: AskamaTemplateEngine::new(),
            cookie_config,
            key: cookie_key(cookie_secret)?,
        })
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.key.clone()
    }
}

impl FromRef<AuthState> for CookieConfig {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_config.clone()
    }
}
