use axum::{
    extract::{Extension, Path, State},
    Json,
};
use log::info;
use partyplanner_shared::models::{now_millis, MessageResponse, Task};
use partyplanner_shared::planning::TaskProgress;
use partyplanner_shared::store::AppStore;
use uuid::Uuid;

use super::{category_or_default, load_viewable_event, parse_day};
use crate::error::{AppError, Result};
use crate::models::{CreateTaskRequest, UpdateTaskRequest};
use crate::state::AppState;

/// `None` for a missing or blank due date
fn due_date(raw: Option<String>) -> Result<Option<String>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(day) => parse_day(day, "Due date").map(Some),
    }
}

// GET /events/:id/tasks
pub async fn get_tasks<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let tasks = state.store.get_tasks(&id).await?;
    let progress = TaskProgress::of(&tasks);
    Ok(Json(serde_json::json!({ "tasks": tasks, "progress": progress })))
}

// POST /events/:id/tasks
pub async fn create_task<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Json<Task>>
where
    S: AppStore,
{
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Task name is required.".into()));
    }
    let due_date = due_date(payload.due_date)?;
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;

    let task = Task {
        id: Uuid::new_v4().to_string(),
        event_id: id.clone(),
        name: name.to_string(),
        category: category_or_default(payload.category),
        status: payload.status.unwrap_or_default(),
        due_date,
        created_at: now_millis(),
    };
    let task = state.store.put_task(task).await?;
    info!("Added task {} to event {}", task.id, id);
    Ok(Json(task))
}

// PATCH /events/:id/tasks/:task_id
pub async fn update_task<S>(
    State(state): State<AppState<S>>,
    Path((id, task_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let mut task = state.store.get_task(&id, &task_id).await?;

    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("Task name cannot be empty.".into()));
        }
        task.name = name.to_string();
    }
    if payload.category.is_some() {
        task.category = category_or_default(payload.category);
    }
    if let Some(status) = payload.status {
        task.status = status;
    }
    if payload.due_date.is_some() {
        task.due_date = due_date(payload.due_date)?;
    }

    Ok(Json(state.store.put_task(task).await?))
}

// DELETE /events/:id/tasks/:task_id
pub async fn delete_task<S>(
    State(state): State<AppState<S>>,
    Path((id, task_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<MessageResponse>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    state.store.get_task(&id, &task_id).await?;
    state.store.delete_task(&id, &task_id).await?;
    info!("Removed task {} from event {}", task_id, id);

    Ok(Json(MessageResponse {
        message: "Task removed".into(),
    }))
}
