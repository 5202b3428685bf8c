use crate::templates::TemplateContext;
use crate::{FileTransport, Mailer, MailerError, SmtpTransport};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub transport: TransportConfig,
    pub from_address: String,
    pub from_name: Option<String>,
    pub app_name: String,
    pub app_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    Smtp {
        host: String,
        port: Option<u16>,
        username: Option<String>,
        #[serde(skip_serializing)]
        password: Option<String>,
        tls: Option<TlsType>,
    },
    File {
        output_dir: PathBuf,
    },
}

/// How the SMTP connection is secured. STARTTLS when unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsType {
    None,
    #[default]
    StartTls,
    Tls,
}

impl MailerConfig {
    pub fn from_env() -> Result<Self, MailerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, MailerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = if let Some(smtp_host) = lookup("MAILER_SMTP_HOST") {
            let port = match lookup("MAILER_SMTP_PORT") {
                Some(port) => Some(port.parse().map_err(|_| {
                    MailerError::Config(format!("Invalid MAILER_SMTP_PORT: {port}"))
                })?),
                None => None,
            };

            let tls = match lookup("MAILER_SMTP_TLS") {
                Some(tls) => Some(match tls.to_lowercase().as_str() {
                    "none" => TlsType::None,
                    "starttls" => TlsType::StartTls,
                    "tls" => TlsType::Tls,
                    other => {
                        return Err(MailerError::Config(format!(
                            "Invalid MAILER_SMTP_TLS: {other}"
                        )));
                    }
                }),
                None => None,
            };

            TransportConfig::Smtp {
                host: smtp_host,
                port,
                username: lookup("MAILER_SMTP_USERNAME"),
                password: lookup("MAILER_SMTP_PASSWORD"),
                tls,
            }
        } else if let Some(output_dir) = lookup("MAILER_FILE_OUTPUT_DIR") {
            TransportConfig::File {
                output_dir: PathBuf::from(output_dir),
            }
        } else {
            // Default to file transport for development
            TransportConfig::File {
                output_dir: PathBuf::from("./emails"),
            }
        };

        let defaults = Self::default();

        let config = Self {
            transport,
            from_address: lookup("MAILER_FROM_ADDRESS").unwrap_or(defaults.from_address),
            from_name: lookup("MAILER_FROM_NAME"),
            app_name: lookup("MAILER_APP_NAME").unwrap_or(defaults.app_name),
            app_url: lookup("MAILER_APP_URL").unwrap_or(defaults.app_url),
        };

        // Fail at startup rather than on the first sign-in request.
        config.from_mailbox()?;

        Ok(config)
    }

    pub fn build_transport(&self) -> Result<Box<dyn Mailer>, MailerError> {
        match &self.transport {
            TransportConfig::Smtp {
                host,
                port,
                username,
                password,
                tls,
            } => {
                let mut builder = match tls.unwrap_or_default() {
                    TlsType::None => SmtpTransport::builder_dangerous(host),
                    TlsType::StartTls => SmtpTransport::starttls_relay(host)?,
                    TlsType::Tls => SmtpTransport::relay(host)?,
                };

                if let Some(port) = port {
                    builder = builder.port(*port);
                }

                if let (Some(username), Some(password)) = (username, password) {
                    builder = builder
                        .credentials(Credentials::new(username.clone(), password.clone()));
                }

                tracing::debug!(host = %host, "Using SMTP transport");
                Ok(Box::new(builder.build()))
            }
            TransportConfig::File { output_dir } => Ok(Box::new(FileTransport::new(output_dir)?)),
        }
    }

    /// The sender mailbox, `Name <address>` when a from name is configured.
    pub fn from_mailbox(&self) -> Result<Mailbox, MailerError> {
        let address = self.from_address.parse().map_err(|e| {
            MailerError::Config(format!(
                "Invalid MAILER_FROM_ADDRESS {:?}: {e}",
                self.from_address
            ))
        })?;

        Ok(Mailbox::new(self.from_name.clone(), address))
    }

    pub fn template_context(&self, user_email: Option<&str>) -> TemplateContext {
        TemplateContext {
            app_name: self.app_name.clone(),
            app_url: self.app_url.clone(),
            user_email: user_email.map(str::to_string),
        }
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::File {
                output_dir: PathBuf::from("./emails"),
            },
            from_address: "noreply@example.org".to_string(),
            from_name: None,
            app_name: "Noisebridge".to_string(),
            app_url: "http://localhost:3000".to_string(),
        }
    }
}
