use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateTodoRequest, TodoListResponse, TodoResponse, UpdateTodoRequest},
    repo_types::Todo,
    services::{create_todo, delete_todo, get_todo, list_todos, update_todo},
};
use crate::{auth::extractors::AuthUser, error::Result, state::AppState};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list).post(create))
        .route("/todos/:id", get(show).patch(update).delete(remove))
}

#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    payload: std::result::Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>> {
    let Json(body) = payload?;
    let todo = create_todo(state.todos.as_ref(), me.id, &body.text).await?;
    Ok(Json(todo))
}

#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<TodoListResponse>> {
    let todos = list_todos(state.todos.as_ref(), me.id).await?;
    Ok(Json(TodoListResponse { todos }))
}

#[instrument(skip(state, me))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>> {
    let todo = get_todo(state.todos.as_ref(), me.id, &id).await?;
    Ok(Json(TodoResponse { todo }))
}

#[instrument(skip(state, me, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<TodoResponse>> {
    let Json(changes) = payload?;
    let todo = update_todo(state.todos.as_ref(), me.id, &id, changes).await?;
    Ok(Json(TodoResponse { todo }))
}

#[instrument(skip(state, me))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>> {
    let todo = delete_todo(state.todos.as_ref(), me.id, &id).await?;
    Ok(Json(TodoResponse { todo }))
}
