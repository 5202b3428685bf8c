use serde::{Deserialize, Serialize};

/// How a donor proved control of their email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Github,
    Google,
    MagicLink,
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthProvider::Github => write!(f, "github"),
            AuthProvider::Google => write!(f, "google"),
            AuthProvider::MagicLink => write!(f, "magic_link"),
        }
    }
}

/// Contents of an authenticated donor session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub email: String,
    pub provider: AuthProvider,
}

impl SessionData {
    pub fn new(email: impl Into<String>, provider: AuthProvider) -> Self {
        Self {
            email: email.into(),
            provider,
        }
    }

    /// Parse a serialized session, rejecting anything without a non-empty email.
    pub fn from_json(value: &str) -> Option<Self> {
        serde_json::from_str::<Self>(value)
            .ok()
            .filter(|session| !session.email.is_empty())
    }

    pub fn to_json(&self) -> Result<String, crate::Error> {
        Ok(serde_json::to_string(self)?)
    }
}
