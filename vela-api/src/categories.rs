use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use vela_catalog::category::Category;
use vela_core::identity::Role;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub category_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetCategoryStatusRequest {
    pub is_active: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/categories", post(create_category).get(list_categories))
        .route("/v1/categories/with-counts", get(list_with_counts))
        .route(
            "/v1/categories/{id}",
            get(get_category).patch(set_category_status),
        )
}

fn require_admin(caller: &Caller) -> Result<(), ApiError> {
    if caller.0.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin role required".to_string()))
    }
}

/// POST /v1/categories (admin)
async fn create_category(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    require_admin(&caller)?;
    if req.category_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Category name is required".to_string()));
    }
    if state
        .categories
        .get_category_by_name(&req.category_name)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        return Err(ApiError::BadRequest(format!(
            "Category {:?} already exists",
            req.category_name
        )));
    }

    let category = Category::new(req.category_name);
    state
        .categories
        .create_category(&category)
        .await
        .map_err(ApiError::internal)?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /v1/categories
async fn list_categories(
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = state
        .categories
        .list_categories()
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(categories))
}

/// GET /v1/categories/with-counts
async fn list_with_counts(
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = state
        .categories
        .list_categories_with_counts()
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(categories))
}

/// GET /v1/categories/:id
async fn get_category(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .categories
        .get_category(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound(format!("Category {id} not found")))?;
    Ok(Json(category))
}

/// PATCH /v1/categories/:id (admin) — activate or deactivate.
async fn set_category_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<SetCategoryStatusRequest>,
) -> Result<StatusCode, ApiError> {
    require_admin(&caller)?;
    state
        .categories
        .get_category(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound(format!("Category {id} not found")))?;
    state
        .categories
        .set_category_status(id, req.is_active)
        .await
        .map_err(ApiError::internal)?;
    Ok(StatusCode::NO_CONTENT)
}
