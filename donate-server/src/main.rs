use std::{net::SocketAddr, sync::Arc};

use donate_axum::AuthState;
use donate_core::{AppConfig, MagicLinkService};
use donate_mailer::{Mailer, MailerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid server configuration");
    })?;
    let mailer_config = MailerConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid mailer configuration");
    })?;

    let mailer: Arc<dyn Mailer> = Arc::from(mailer_config.build_transport()?);
    let magic_link = MagicLinkService::new(config.secrets.clone())?;

    info!(
        base_url = %config.secrets.base_url(),
        production = config.secrets.production,
        "Starting donation portal"
    );

    let state = AuthState::new(magic_link, mailer, mailer_config, &config.cookie_secret)?;
    let app = donate_axum::routes(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
