use donate_core::SessionData;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicLinkCallbackQuery {
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: SessionData,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub path: String,
    pub max_age_secs: i64,
}

/// Two hours.
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 2 * 60 * 60;

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "user_session".to_string(),
            http_only: true,
            secure: true,
            path: "/".to_string(),
            max_age_secs: DEFAULT_SESSION_MAX_AGE_SECS,
        }
    }
}

impl CookieConfig {
    pub fn development() -> Self {
        Self {
            secure: false,
            ..Self::default()
        }
    }

    /// Secure cookies in production, plain-http cookies otherwise.
    pub fn for_environment(production: bool) -> Self {
        if production {
            Self::default()
        } else {
            Self::development()
        }
    }
}
