use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    claims::AUTH_SCOPE,
    dto::PublicUser,
    jwt::JwtKeys,
    password::{hash_password, verify_dummy_password, verify_password, MIN_PASSWORD_LEN},
    repo::UserRepo,
    repo_types::{IssuedToken, User},
};
use crate::error::{AppError, Result};

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validates the credentials and stores a new user with no tokens.
#[instrument(skip(repo, password))]
pub async fn register(repo: &dyn UserRepo, email: &str, password: &str) -> Result<User> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::Validation("email is required".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation(format!("{email} is not a valid email")));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hash = hash_password(password)?;
    let user = repo.create(&email, &hash).await.map_err(|e| {
        if matches!(e, AppError::Conflict(_)) {
            warn!(email = %email, "email already registered");
        }
        e
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Unknown email and wrong password are indistinguishable to the caller.
#[instrument(skip(repo, password))]
pub async fn sign_in(repo: &dyn UserRepo, email: &str, password: &str) -> Result<User> {
    let email = normalize_email(email);
    let Some(user) = repo.find_by_email(&email).await? else {
        verify_dummy_password(password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthenticated);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthenticated);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

/// Issues an `auth` token and appends it to the user's list. This is the
/// only way a token becomes acceptable to [`authenticate`].
pub async fn issue_and_attach_token(
    repo: &dyn UserRepo,
    keys: &JwtKeys,
    user: &User,
) -> Result<String> {
    let token = keys.issue(user.id, AUTH_SCOPE)?;
    repo.push_token(
        user.id,
        &IssuedToken {
            access: AUTH_SCOPE.to_string(),
            token: token.clone(),
        },
    )
    .await?;
    Ok(token)
}

/// Resolves the raw header value to the identity that owns it.
///
/// Every failure collapses to `Unauthenticated`.
pub async fn authenticate(
    repo: &dyn UserRepo,
    keys: &JwtKeys,
    raw_token: Option<&str>,
) -> Result<PublicUser> {
    let token = raw_token.ok_or(AppError::Unauthenticated)?;

    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid token");
        AppError::Unauthenticated
    })?;

    if claims.access != AUTH_SCOPE {
        warn!(user_id = %claims.sub, scope = %claims.access, "token has wrong scope");
        return Err(AppError::Unauthenticated);
    }

    let issued = IssuedToken {
        access: AUTH_SCOPE.to_string(),
        token: token.to_string(),
    };
    match repo.find_by_token(claims.sub, &issued).await? {
        Some(user) => Ok(user.into()),
        None => {
            warn!(user_id = %claims.sub, "token not issued to user");
            Err(AppError::Unauthenticated)
        }
    }
}
