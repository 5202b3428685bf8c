mod engine;
mod magic_link;

pub use engine::{AskamaTemplateEngine, TemplateEngine};
pub use magic_link::{MagicLinkHtmlTemplate, MagicLinkTextTemplate};

use crate::MailerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Values shared by every outgoing email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    pub app_name: String,
    pub app_url: String,
    pub user_email: Option<String>,
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self {
            app_name: "Noisebridge".to_string(),
            app_url: "http://localhost:3000".to_string(),
            user_email: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateData {
    pub data: HashMap<String, serde_json::Value>,
}

impl TemplateData {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn insert<T: Serialize>(mut self, key: &str, value: T) -> Result<Self, MailerError> {
        self.data
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    fn require_str(&self, key: &str) -> Result<String, MailerError> {
        self.get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| MailerError::Builder(format!("{key} is required")))
    }

    fn require_u32(&self, key: &str) -> Result<u32, MailerError> {
        self.get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| MailerError::Builder(format!("{key} is required")))
    }

    fn context(&self) -> TemplateContext {
        self.get("context")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

impl Default for TemplateData {
    fn default() -> Self {
        Self::new()
    }
}
