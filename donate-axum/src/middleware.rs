use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::SignedCookieJar;

use crate::{
    session::{read_session, removal_cookie},
    types::CookieConfig,
};

/// Redirect to `/` unless the request carries a valid session.
///
/// On success the [`SessionData`](donate_core::SessionData) is inserted into
/// the request extensions for downstream handlers. On failure the session
/// cookie is cleared along with the redirect.
pub async fn require_session(
    State(config): State<CookieConfig>,
    jar: SignedCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match read_session(&jar, &config) {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "No valid session found, redirecting");
            (jar.remove(removal_cookie(&config)), Redirect::to("/")).into_response()
        }
    }
}
