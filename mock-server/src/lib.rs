//! In-memory implementation of the todo backend's HTTP contract.
//!
//! Items keep insertion order and get a monotonically increasing integer
//! `todo_id`, matching a serial primary key.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub todo_id: i64,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct AddTodo {
    pub description: String,
}

/// Clients send the full object, but missing fields are tolerated and keep
/// their stored value.
#[derive(Deserialize)]
pub struct UpdateTodo {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Default)]
pub struct Collection {
    last_id: i64,
    todos: BTreeMap<i64, Todo>,
}

impl Collection {
    fn insert(&mut self, description: String) -> Todo {
        self.last_id += 1;
        let todo = Todo {
            todo_id: self.last_id,
            description,
            completed: false,
            created_at: Utc::now(),
        };
        self.todos.insert(todo.todo_id, todo.clone());
        todo
    }
}

pub type Db = Arc<RwLock<Collection>>;

type HandlerError = (StatusCode, String);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Collection::default()));
    Router::new()
        .route("/todos/all", get(list_todos))
        .route("/todos/add", post(add_todo))
        .route("/todos/delete/{todo_id}", delete(delete_todo))
        .route("/todos/update/{todo_id}", put(update_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn non_empty(description: &str) -> Result<String, HandlerError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "description must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    let db = db.read().await;
    tracing::debug!(count = db.todos.len(), "listing todos");
    Json(db.todos.values().cloned().collect())
}

async fn add_todo(
    State(db): State<Db>,
    Json(input): Json<AddTodo>,
) -> Result<(StatusCode, Json<Todo>), HandlerError> {
    let description = non_empty(&input.description)?;
    let todo = db.write().await.insert(description);
    tracing::debug!(todo_id = todo.todo_id, "added todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(db): State<Db>,
    Path(todo_id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, HandlerError> {
    let description = input.description.as_deref().map(non_empty).transpose()?;
    let mut db = db.write().await;
    let todo = db
        .todos
        .get_mut(&todo_id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("todo {todo_id} not found")))?;
    if let Some(description) = description {
        todo.description = description;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    tracing::debug!(todo_id, "updated todo");
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(todo_id): Path<i64>,
) -> Result<StatusCode, HandlerError> {
    let mut db = db.write().await;
    db.todos
        .remove(&todo_id)
        .map(|_| {
            tracing::debug!(todo_id, "deleted todo");
            StatusCode::NO_CONTENT
        })
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("todo {todo_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_with_backend_field_names() {
        let todo = Todo {
            todo_id: 1,
            description: "Test".to_string(),
            completed: false,
            created_at: DateTime::parse_from_rfc3339("2024-05-01T09:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["todo_id"], 1);
        assert_eq!(json["description"], "Test");
        assert_eq!(json["completed"], false);
        assert_eq!(json["created_at"], "2024-05-01T09:30:00Z");
    }

    #[test]
    fn collection_assigns_increasing_ids() {
        let mut collection = Collection::default();
        let first = collection.insert("a".to_string());
        let second = collection.insert("b".to_string());
        assert_eq!(first.todo_id, 1);
        assert_eq!(second.todo_id, 2);
        assert!(!first.completed);
        assert!(first.created_at <= second.created_at);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut collection = Collection::default();
        let first = collection.insert("a".to_string());
        collection.todos.remove(&first.todo_id);
        assert_eq!(collection.insert("b".to_string()).todo_id, 2);
    }

    #[test]
    fn add_todo_rejects_missing_description() {
        let result: Result<AddTodo, _> = serde_json::from_str(r#"{"completed":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_todo_all_fields_optional() {
        let input: UpdateTodo = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.description.is_none());
        assert!(input.completed.is_none());
    }

    #[test]
    fn blank_description_is_rejected() {
        let err = non_empty("   ").unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(non_empty(" milk ").unwrap(), "milk");
    }
}
