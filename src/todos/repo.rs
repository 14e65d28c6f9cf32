use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{now_millis, Todo, TodoPatch};
use crate::error::Result;

/// Todo storage. Every read and write is scoped by `owner_id`; a record owned
/// by someone else is reported exactly like a missing one.
#[async_trait]
pub trait TodoRepo: Send + Sync {
    async fn insert(&self, todo: &Todo) -> Result<Todo>;

    /// Owned todos in insertion order.
    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Todo>>;

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Todo>>;

    /// Applies `patch` atomically with respect to other writers of the same todo.
    async fn update_owned(&self, owner_id: Uuid, id: Uuid, patch: &TodoPatch)
        -> Result<Option<Todo>>;

    async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Todo>>;
}

#[derive(Clone)]
pub struct PgTodoRepo {
    db: PgPool,
}

impl PgTodoRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoRepo for PgTodoRepo {
    async fn insert(&self, todo: &Todo) -> Result<Todo> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (id, owner_id, text, completed, completed_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, text, completed, completed_at
            "#,
        )
        .bind(todo.id)
        .bind(todo.owner_id)
        .bind(&todo.text)
        .bind(todo.completed)
        .bind(todo.completed_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Todo>> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, text, completed, completed_at
            FROM todos
            WHERE owner_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Todo>> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, text, completed, completed_at
            FROM todos
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: &TodoPatch,
    ) -> Result<Option<Todo>> {
        let mut tx = self.db.begin().await?;

        let current = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, text, completed, completed_at
            FROM todos
            WHERE id = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut todo) = current else {
            tx.rollback().await?;
            return Ok(None);
        };
        patch.apply(&mut todo, now_millis());

        let updated = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET text = $3, completed = $4, completed_at = $5
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, text, completed, completed_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&todo.text)
        .bind(todo.completed)
        .bind(todo.completed_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Todo>> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            DELETE FROM todos
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, text, completed, completed_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
