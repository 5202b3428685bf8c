//! # Donation portal Axum integration
//!
//! Routes for the magic-link sign-in flow and the signed session cookie it
//! establishes.
//!
//! ## Routes
//!
//! - `POST /auth/magic-link` — email a sign-in link to the submitted address
//! - `GET /auth/magic-link/callback?state=` — verify the link, set the session cookie
//! - `GET /auth/session` — the current session as JSON
//! - `GET|POST /auth/signout` — clear the session cookie
//! - `GET /healthz` — liveness check
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use donate_core::{AppConfig, MagicLinkService};
//! use donate_mailer::MailerConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let mailer_config = MailerConfig::from_env()?;
//!     let mailer: Arc<dyn donate_mailer::Mailer> = Arc::from(mailer_config.build_transport()?);
//!
//!     let magic_link = MagicLinkService::new(config.secrets.clone())?;
//!     let state = donate_axum::AuthState::new(magic_link, mailer, mailer_config, &config.cookie_secret)?;
//!
//!     let app = donate_axum::routes(state);
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod routes;
mod session;
mod state;
mod types;

pub use error::{AuthError, Result};
pub use extractors::{OptionalSessionUser, SessionUser};
pub use middleware::require_session;
pub use routes::{INVALID_LINK_REDIRECT, SIGNED_IN_REDIRECT, create_router};
pub use session::cookie_key;
pub use state::AuthState;
pub use types::{
    ConnectionInfo, CookieConfig, DEFAULT_SESSION_MAX_AGE_SECS, HealthResponse,
    MagicLinkCallbackQuery, MagicLinkRequest, MessageResponse, SessionResponse,
};

use axum::Router;

/// Create the authentication router with all routes mounted at their absolute paths.
pub fn routes(state: AuthState) -> Router {
    create_router(state)
}
