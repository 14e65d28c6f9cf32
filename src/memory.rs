//! In-process store backing both repositories.
//!
//! Used by the test suite and by `STORE_BACKEND=memory` for local runs. Each
//! collection sits behind one `RwLock`, so every operation is atomic per
//! document just like the single-statement queries of the Postgres store.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{IssuedToken, User},
    },
    error::{AppError, Result},
    todos::{
        repo::TodoRepo,
        repo_types::{now_millis, Todo, TodoPatch},
    },
};

struct UserRecord {
    user: User,
    tokens: Vec<IssuedToken>,
}

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<UserRecord>>,
    todos: RwLock<Vec<Todo>>,
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|r| r.user.email == email) {
            return Err(AppError::Conflict("email already registered".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(UserRecord {
            user: user.clone(),
            tokens: Vec::new(),
        });
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|r| r.user.email == email)
            .map(|r| r.user.clone()))
    }

    async fn push_token(&self, user_id: Uuid, token: &IssuedToken) -> Result<()> {
        let mut users = self.users.write().await;
        let record = users
            .iter_mut()
            .find(|r| r.user.id == user_id)
            .ok_or(AppError::NotFound)?;
        record.tokens.push(token.clone());
        Ok(())
    }

    async fn find_by_token(&self, user_id: Uuid, token: &IssuedToken) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|r| r.user.id == user_id && r.tokens.contains(token))
            .map(|r| r.user.clone()))
    }
}

#[async_trait]
impl TodoRepo for MemoryStore {
    async fn insert(&self, todo: &Todo) -> Result<Todo> {
        self.todos.write().await.push(todo.clone());
        Ok(todo.clone())
    }

    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .cloned())
    }

    async fn update_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: &TodoPatch,
    ) -> Result<Option<Todo>> {
        let mut todos = self.todos.write().await;
        Ok(todos
            .iter_mut()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .map(|t| {
                patch.apply(t, now_millis());
                t.clone()
            }))
    }

    async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Todo>> {
        let mut todos = self.todos.write().await;
        let pos = todos
            .iter()
            .position(|t| t.id == id && t.owner_id == owner_id);
        Ok(pos.map(|i| todos.remove(i)))
    }
}
