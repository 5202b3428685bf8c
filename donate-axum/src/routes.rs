use axum::{
    Form, Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::SignedCookieJar;
use donate_core::{
    AuthProvider, CALLBACK_PATH, MIN_LINK_LIFETIME_MINUTES, SessionData, decode_state,
};
use donate_mailer::{Address, MagicLinkEmail};

use crate::{
    error::{AuthError, Result},
    extractors::SessionUser,
    session::{removal_cookie, session_cookie},
    state::AuthState,
    types::*,
};

/// Where a failed magic-link callback sends the browser.
pub const INVALID_LINK_REDIRECT: &str = "/auth?error=invalid_magic_link";

/// Where a successful sign-in lands.
pub const SIGNED_IN_REDIRECT: &str = "/manage";

pub fn create_router(state: AuthState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/auth/magic-link", post(request_magic_link_handler))
        .route(CALLBACK_PATH, get(magic_link_callback_handler))
        .route("/auth/session", get(get_session_handler))
        .route("/auth/signout", get(signout_handler).post(signout_handler))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Parse the submitted value as a bare address.
///
/// Display names, angle brackets and address lists are rejected, so the
/// address the code is bound to is the one the email is delivered to.
fn normalize_email(raw: &str) -> Result<Address> {
    let email = raw.trim();

    if email.is_empty() {
        return Err(AuthError::BadRequest("Email is required".to_string()));
    }

    email.parse::<Address>().map_err(|e| {
        tracing::debug!(error = %e, "Rejected sign-in address");
        AuthError::BadRequest("Invalid email address".to_string())
    })
}

async fn request_magic_link_handler(
    State(state): State<AuthState>,
    Form(payload): Form<MagicLinkRequest>,
) -> Result<impl IntoResponse> {
    let address = normalize_email(&payload.email)?;
    let email: &str = address.as_ref();

    let url = state.magic_link.generate_url(email)?;

    let message = MagicLinkEmail::build(
        &state.templates,
        &state.mailer_config.from_mailbox()?,
        &address,
        &url,
        MIN_LINK_LIFETIME_MINUTES,
        state.mailer_config.template_context(Some(email)),
    )
    .await?;

    state.mailer.send_email(message).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to send magic link email");
        AuthError::InternalError("Failed to send sign-in email".to_string())
    })?;

    tracing::info!(email = %email, "Magic link issued");

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Check your email for a sign-in link".to_string(),
        }),
    ))
}

async fn magic_link_callback_handler(
    State(state): State<AuthState>,
    jar: SignedCookieJar,
    connection_info: ConnectionInfo,
    query: std::result::Result<Query<MagicLinkCallbackQuery>, QueryRejection>,
) -> Response {
    let verified = query
        .ok()
        .and_then(|Query(query)| query.state)
        .and_then(|encoded| decode_state(&encoded))
        .filter(|link| state.magic_link.verify_code_now(&link.email, &link.code));

    let Some(link) = verified else {
        tracing::warn!(ip = ?connection_info.ip, "Magic link verification failed");
        return Redirect::to(INVALID_LINK_REDIRECT).into_response();
    };

    let session = SessionData::new(link.email, AuthProvider::MagicLink);

    match session_cookie(&state.cookie_config, &session) {
        Ok(cookie) => {
            tracing::info!(
                email = %session.email,
                ip = ?connection_info.ip,
                user_agent = ?connection_info.user_agent,
                "User authenticated via magic link"
            );
            (jar.add(cookie), Redirect::to(SIGNED_IN_REDIRECT)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build session cookie");
            Redirect::to("/auth?error=auth_failed").into_response()
        }
    }
}

async fn get_session_handler(SessionUser(session): SessionUser) -> Result<impl IntoResponse> {
    Ok(Json(SessionResponse { session }))
}

async fn signout_handler(State(state): State<AuthState>, jar: SignedCookieJar) -> impl IntoResponse {
    let jar = jar.remove(removal_cookie(&state.cookie_config));

    (jar, Redirect::to("/"))
}
