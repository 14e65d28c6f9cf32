use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{IssuedToken, User};
use crate::error::{AppError, Result};

/// Credential store: users and the tokens each of them owns.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Create a user with an empty token list. Duplicate email is `Conflict`.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Append a token to the user's list. Unknown user is `NotFound`.
    async fn push_token(&self, user_id: Uuid, token: &IssuedToken) -> Result<()>;

    /// The user with this id, but only if `token` (string and scope) is in its list.
    async fn find_by_token(&self, user_id: Uuid, token: &IssuedToken) -> Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict("email already registered".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn push_token(&self, user_id: Uuid, token: &IssuedToken) -> Result<()> {
        let res = sqlx::query(
            r#"
            INSERT INTO user_tokens (user_id, access, token)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token.access)
        .bind(&token.token)
        .execute(&self.db)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_token(&self, user_id: Uuid, token: &IssuedToken) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.created_at
            FROM users u
            WHERE u.id = $1
              AND EXISTS (
                  SELECT 1 FROM user_tokens t
                  WHERE t.user_id = u.id AND t.token = $2 AND t.access = $3
              )
            "#,
        )
        .bind(user_id)
        .bind(&token.token)
        .bind(&token.access)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}
