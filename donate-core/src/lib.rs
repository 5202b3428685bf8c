//! Core functionality for the donation portal
//!
//! This crate contains the stateless magic-link code engine, the secret
//! material it is built from, and the session types shared with the HTTP
//! layer.
//!
//! See [`MagicLinkService`] for issuing and verifying codes, and
//! [`AppConfig`] for loading configuration at startup.
//!
pub mod config;
pub mod crypto;
pub mod error;
pub mod magic_link;
pub mod session;

pub use config::{AppConfig, SecretString, Secrets};
pub use error::{ConfigError, CryptoError, Error};
pub use magic_link::{
    CALLBACK_PATH, MIN_LINK_LIFETIME_MINUTES, MagicLinkService, MagicLinkState,
    WINDOW_DURATION_MS, decode_state, state_from_url,
};
pub use session::{AuthProvider, SessionData};
