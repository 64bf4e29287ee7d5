use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use taskhub_core::task::NotificationView;

use crate::{context::CurrentUser, handlers::AppError, state::AppState};

/// The caller's notifications, newest first (GET /api/notifications).
pub async fn list_notifications(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<Vec<NotificationView>>, AppError> {
    Ok(Json(
        state.notifications.get_notifications(caller.user_id).await?,
    ))
}

/// The caller's unread notifications (GET /api/notifications/unread).
pub async fn list_unread_notifications(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<Vec<NotificationView>>, AppError> {
    Ok(Json(state.notifications.get_unread(caller.user_id).await?))
}

/// Mark a notification read (PUT /api/notifications/{id}/read).
pub async fn mark_notification_read(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationView>, AppError> {
    let view = state.notifications.mark_read(id).await?;
    tracing::debug!(
        request_id = %caller.request_id,
        notification_id = %id,
        "Marked notification read"
    );
    Ok(Json(view))
}
