use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading process configuration.
///
/// These are fatal: a process that cannot build its configuration must not
/// start serving requests.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required env var: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid HMAC key: {0}")]
    InvalidKey(String),
}
