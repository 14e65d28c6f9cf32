use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::{dto::PublicUser, jwt::JwtKeys, services::authenticate};
use crate::{error::AppError, state::AppState};

/// Header carrying the bearer token, on requests and on auth responses.
pub const AUTH_HEADER: &str = "x-auth";

/// Identity resolved from the `x-auth` header; the owner filter for the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|h| h.to_str().ok());

        let keys = JwtKeys::from_ref(state);
        let user = authenticate(state.users.as_ref(), &keys, raw).await?;
        Ok(AuthUser(user))
    }
}
