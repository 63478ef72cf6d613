use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use vela_core::identity::{Role, User, UserStatus};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: String,
    /// Hashed upstream; this service never sees plaintext credentials.
    pub password_hash: String,
    pub address: Option<String>,
    pub role: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users", post(create_user).get(list_users))
        .route("/v1/users/{id}", get(get_user))
        .route("/v1/users/{id}/approve", post(approve_user))
}

/// POST /v1/users
/// Registration. Accounts start pending and inactive until approved.
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    let role = Role::from_str(&req.role).map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let mut user = User::new(req.email, req.password_hash, role);
    user.name = req.name;
    user.address = req.address;

    state
        .users
        .create_user(&user)
        .await
        .map_err(ApiError::internal)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/users/:id (staff, or the account itself)
async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    if !caller.0.role.is_staff() && caller.0.user_id != id.to_string() {
        return Err(ApiError::Forbidden("Not your account".to_string()));
    }
    let user = state
        .users
        .get_user(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;
    Ok(Json(user))
}

/// GET /v1/users (staff)
async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<User>>, ApiError> {
    caller.require_staff()?;
    let users = state.users.list_users().await.map_err(ApiError::internal)?;
    Ok(Json(users))
}

/// POST /v1/users/:id/approve (admin)
async fn approve_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if caller.0.role != Role::Admin {
        return Err(ApiError::Forbidden("Admin role required".to_string()));
    }
    state
        .users
        .get_user(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;
    state
        .users
        .set_user_status(id, UserStatus::Approved, true)
        .await
        .map_err(ApiError::internal)?;
    Ok(StatusCode::NO_CONTENT)
}
