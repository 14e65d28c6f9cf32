use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    dto::UpdateTodoRequest,
    repo::TodoRepo,
    repo_types::{Todo, TodoPatch},
};
use crate::error::{AppError, Result};

fn required_text(raw: &str) -> Result<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text is required".into()));
    }
    Ok(text.to_string())
}

/// A malformed id can't name any todo, so it is just `NotFound`.
pub fn parse_todo_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        debug!(id = raw, "malformed todo id");
        AppError::NotFound
    })
}

#[instrument(skip(repo, text))]
pub async fn create_todo(repo: &dyn TodoRepo, owner_id: Uuid, text: &str) -> Result<Todo> {
    let todo = Todo::new(owner_id, required_text(text)?);
    let todo = repo.insert(&todo).await?;
    info!(todo_id = %todo.id, "todo created");
    Ok(todo)
}

pub async fn list_todos(repo: &dyn TodoRepo, owner_id: Uuid) -> Result<Vec<Todo>> {
    repo.list_owned(owner_id).await
}

pub async fn get_todo(repo: &dyn TodoRepo, owner_id: Uuid, id: &str) -> Result<Todo> {
    let id = parse_todo_id(id)?;
    repo.find_owned(owner_id, id).await?.ok_or(AppError::NotFound)
}

#[instrument(skip(repo, changes))]
pub async fn update_todo(
    repo: &dyn TodoRepo,
    owner_id: Uuid,
    id: &str,
    changes: UpdateTodoRequest,
) -> Result<Todo> {
    let id = parse_todo_id(id)?;
    let patch = TodoPatch {
        text: changes.text.as_deref().map(required_text).transpose()?,
        completed: changes.completed,
    };
    let todo = repo
        .update_owned(owner_id, id, &patch)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(todo_id = %todo.id, completed = todo.completed, "todo updated");
    Ok(todo)
}

#[instrument(skip(repo))]
pub async fn delete_todo(repo: &dyn TodoRepo, owner_id: Uuid, id: &str) -> Result<Todo> {
    let id = parse_todo_id(id)?;
    let todo = repo
        .delete_owned(owner_id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(todo_id = %todo.id, "todo deleted");
    Ok(todo)
}
