//! Process configuration
//!
//! All secret material is read exactly once, at startup, into an [`AppConfig`].
//! The pieces the magic-link engine needs are handed to it as [`Secrets`]; no
//! code path below this module reads the environment.

use crate::error::ConfigError;

pub const TOTP_SECRET_VAR: &str = "TOTP_SECRET";
pub const SERVER_HOST_VAR: &str = "SERVER_HOST";
pub const COOKIE_SECRET_VAR: &str = "COOKIE_SECRET";
pub const APP_ENV_VAR: &str = "APP_ENV";
pub const SERVER_PORT_VAR: &str = "SERVER_PORT";

/// Minimum length of the cookie signing secret, in bytes.
pub const MIN_COOKIE_SECRET_LEN: usize = 32;

pub const DEFAULT_PORT: u16 = 3000;

/// A string that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(**redacted**)")
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Secret material consumed by the magic-link engine.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub totp_secret: SecretString,
    pub server_host: String,
    pub production: bool,
}

impl Secrets {
    pub fn new(totp_secret: impl Into<SecretString>, server_host: impl Into<String>) -> Self {
        Self {
            totp_secret: totp_secret.into(),
            server_host: server_host.into(),
            production: false,
        }
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// `https` in production, `http` otherwise.
    pub fn protocol(&self) -> &'static str {
        if self.production { "https" } else { "http" }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol(), self.server_host)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secrets: Secrets,
    pub cookie_secret: SecretString,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let totp_secret = require(&lookup, TOTP_SECRET_VAR)?;
        let server_host = require(&lookup, SERVER_HOST_VAR)?;
        let cookie_secret = require(&lookup, COOKIE_SECRET_VAR)?;

        if cookie_secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: COOKIE_SECRET_VAR,
                reason: format!("must be at least {MIN_COOKIE_SECRET_LEN} bytes"),
            });
        }

        let production = lookup(APP_ENV_VAR)
            .map(|env| env.trim().eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let port = match lookup(SERVER_PORT_VAR) {
            Some(port) => port.trim().parse().map_err(|_| ConfigError::Invalid {
                name: SERVER_PORT_VAR,
                reason: format!("'{port}' is not a valid port"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            secrets: Secrets::new(totp_secret, server_host).with_production(production),
            cookie_secret: SecretString::new(cookie_secret),
            port,
        })
    }
}

fn require<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}
