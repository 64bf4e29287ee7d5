use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use taskhub_core::task::{AssignTaskRequest, CreateTaskRequest, TaskView, UpdateTaskRequest};

use crate::{context::CurrentUser, handlers::AppError, state::AppState};

/// List every task (GET /api/tasks).
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskView>>, AppError> {
    Ok(Json(state.tasks.get_all().await?))
}

/// Create a task owned by the caller (POST /api/tasks).
pub async fn create_task(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.tasks.create(payload, caller.user_id).await?;

    tracing::info!(
        request_id = %caller.request_id,
        task_id = %view.id,
        created_by = %caller.user_id,
        "Created task"
    );

    Ok((StatusCode::CREATED, Json(view)))
}

/// Get a single task (GET /api/tasks/{id}).
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskView>, AppError> {
    Ok(Json(state.tasks.get_by_id(id).await?))
}

/// Open tasks assigned to the caller (GET /api/tasks/pending).
pub async fn list_pending_tasks(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<Vec<TaskView>>, AppError> {
    Ok(Json(state.tasks.get_pending(caller.user_id).await?))
}

/// Tasks the caller created or is assigned to (GET /api/tasks/mine).
pub async fn list_my_tasks(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<Vec<TaskView>>, AppError> {
    Ok(Json(state.tasks.get_by_user(caller.user_id).await?))
}

/// Deleted tasks (GET /api/tasks/deleted).
pub async fn list_deleted_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskView>>, AppError> {
    Ok(Json(state.tasks.get_deleted().await?))
}

/// Update title, description and due date (PUT /api/tasks/{id}).
pub async fn update_task(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskView>, AppError> {
    let view = state.tasks.update(id, payload).await?;
    tracing::info!(request_id = %caller.request_id, task_id = %id, "Updated task");
    Ok(Json(view))
}

/// Assign the task (PUT /api/tasks/{id}/assign).
pub async fn assign_task(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignTaskRequest>,
) -> Result<Json<TaskView>, AppError> {
    let view = state.tasks.assign(id, payload).await?;
    tracing::info!(
        request_id = %caller.request_id,
        task_id = %id,
        assigned_to = %payload.assigned_to,
        "Assigned task"
    );
    Ok(Json(view))
}

/// Mark the task completed (PUT /api/tasks/{id}/complete).
pub async fn complete_task(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskView>, AppError> {
    let view = state.tasks.complete(id).await?;
    tracing::info!(request_id = %caller.request_id, task_id = %id, "Completed task");
    Ok(Json(view))
}

/// Delete the task (DELETE /api/tasks/{id}).
pub async fn delete_task(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete(id).await?;
    tracing::info!(request_id = %caller.request_id, task_id = %id, "Deleted task");
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a deleted task (POST /api/tasks/{id}/restore).
pub async fn restore_task(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskView>, AppError> {
    let view = state.tasks.restore(id).await?;
    tracing::info!(request_id = %caller.request_id, task_id = %id, "Restored task");
    Ok(Json(view))
}
