use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use taskhub_core::serde::deserialize_optional_string;
use taskhub_core::task::User;

use crate::{handlers::AppError, services::ServiceError, state::AppState};

/// Request payload for registering a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub last_name: Option<String>,
}

impl CreateUserRequest {
    fn into_user(self) -> Result<User, ServiceError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ServiceError::Validation(
                "Username cannot be empty".to_string(),
            ));
        }
        if !self.email.contains('@') {
            return Err(ServiceError::Validation(format!(
                "Invalid email: {}",
                self.email
            )));
        }

        let mut user = User::new(username, self.email.trim());
        user.first_name = self.first_name;
        user.last_name = self.last_name;
        Ok(user)
    }
}

/// Register a user (POST /api/users).
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = payload.into_user()?;
    state
        .users
        .create_user(&user)
        .await
        .map_err(ServiceError::from)?;

    tracing::info!(user_id = %user.id, username = %user.username, "Created user");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID (GET /api/users/{id}).
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state
        .users
        .get_user(id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::not_found("User", id))?;

    Ok(Json(user))
}
