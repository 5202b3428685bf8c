//! Signed session cookie
//!
//! The cookie value is the JSON-serialized [`SessionData`] in unpadded
//! URL-safe base64, signed with a key derived from `COOKIE_SECRET`.

use axum_extra::extract::{
    SignedCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use donate_core::{
    ConfigError, SecretString, SessionData,
    config::{COOKIE_SECRET_VAR, MIN_COOKIE_SECRET_LEN},
};

use crate::{error::AuthError, types::CookieConfig};

/// Derive the cookie signing key from the configured secret.
pub fn cookie_key(secret: &SecretString) -> Result<Key, ConfigError> {
    if secret.len() < MIN_COOKIE_SECRET_LEN {
        return Err(ConfigError::Invalid {
            name: COOKIE_SECRET_VAR,
            reason: format!("must be at least {MIN_COOKIE_SECRET_LEN} bytes"),
        });
    }

    Ok(Key::derive_from(secret.expose().as_bytes()))
}

pub(crate) fn session_cookie(
    config: &CookieConfig,
    session: &SessionData,
) -> Result<Cookie<'static>, AuthError> {
    let value = URL_SAFE_NO_PAD.encode(session.to_json()?);

    Ok(Cookie::build((config.name.clone(), value))
        .path(config.path.clone())
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(config.max_age_secs))
        .build())
}

pub(crate) fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((config.name.clone(), ""))
        .path(config.path.clone())
        .build()
}

/// Read the session from a verified cookie. Tampered or malformed cookies yield `None`.
pub(crate) fn read_session(jar: &SignedCookieJar, config: &CookieConfig) -> Option<SessionData> {
    let cookie = jar.get(&config.name)?;
    let json = URL_SAFE_NO_PAD.decode(cookie.value()).ok()?;
    let json = String::from_utf8(json).ok()?;
    SessionData::from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_SESSION_MAX_AGE_SECS;
    use donate_core::AuthProvider;

    #[test]
    fn test_cookie_key_requires_long_secret() {
        assert!(cookie_key(&SecretString::new("short")).is_err());
        assert!(cookie_key(&SecretString::new("x".repeat(MIN_COOKIE_SECRET_LEN))).is_ok());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let session = SessionData::new("donor@example.com", AuthProvider::MagicLink);
        let cookie = session_cookie(&CookieConfig::default(), &session).unwrap();

        assert_eq!(cookie.name(), "user_session");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(DEFAULT_SESSION_MAX_AGE_SECS))
        );
    }

    #[test]
    fn test_signed_round_trip() {
        let key = cookie_key(&SecretString::new("k".repeat(64))).unwrap();
        let config = CookieConfig::development();
        let session = SessionData::new("donor@example.com", AuthProvider::MagicLink);

        let jar = SignedCookieJar::new(key).add(session_cookie(&config, &session).unwrap());

        assert_eq!(read_session(&jar, &config), Some(session));
    }
}
