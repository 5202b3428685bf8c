use std::net::SocketAddr;

use axum::{
    RequestPartsExt,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use axum_extra::{
    TypedHeader,
    extract::{SignedCookieJar, cookie::Key},
    headers::UserAgent,
};
use donate_core::SessionData;

use crate::{
    error::AuthError,
    session::read_session,
    types::{ConnectionInfo, CookieConfig},
};

impl<S> FromRequestParts<S> for ConnectionInfo
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .extract::<Option<TypedHeader<UserAgent>>>()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid user agent header"))?
            .map(|ua| ua.to_string());

        let ip = parts
            .extract::<ConnectInfo<SocketAddr>>()
            .await
            .ok()
            .map(|addr| addr.ip().to_string());

        Ok(ConnectionInfo { ip, user_agent })
    }
}

/// The signed-in donor. Rejects with 401 when there is no valid session cookie.
pub struct SessionUser(pub SessionData);

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    Key: FromRef<S>,
    CookieConfig: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalSessionUser(session) = OptionalSessionUser::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::Unauthorized)?;

        session.map(SessionUser).ok_or(AuthError::Unauthorized)
    }
}

pub struct OptionalSessionUser(pub Option<SessionData>);

impl<S> FromRequestParts<S> for OptionalSessionUser
where
    S: Send + Sync,
    Key: FromRef<S>,
    CookieConfig: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid cookie header"))?;

        let config = CookieConfig::from_ref(state);

        Ok(OptionalSessionUser(read_session(&jar, &config)))
    }
}
