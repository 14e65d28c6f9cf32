use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::{HeaderMap, HeaderValue},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{CredentialsRequest, PublicUser},
        extractors::{AuthUser, AUTH_HEADER},
        jwt::JwtKeys,
        repo_types::User,
        services::{issue_and_attach_token, register, sign_in},
    },
    error::{AppError, Result},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/login", post(login))
        .route("/users/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<PublicUser>)> {
    let Json(payload) = payload?;
    let user = register(state.users.as_ref(), &payload.email, &payload.password).await?;
    respond_with_token(&state, user).await
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<PublicUser>)> {
    let Json(payload) = payload?;
    let user = sign_in(state.users.as_ref(), &payload.email, &payload.password).await?;
    respond_with_token(&state, user).await
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(me): AuthUser) -> Json<PublicUser> {
    tracing::debug!(user_id = %me.id, "resolved current user");
    Json(me)
}

async fn respond_with_token(state: &AppState, user: User) -> Result<(HeaderMap, Json<PublicUser>)> {
    let keys = JwtKeys::from_ref(state);
    let token = issue_and_attach_token(state.users.as_ref(), &keys, &user).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTH_HEADER,
        HeaderValue::from_str(&token).map_err(|e| AppError::Internal(e.into()))?,
    );
    Ok((headers, Json(user.into())))
}
