use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use vela_catalog::product::{Product, ProductError};
use vela_core::notify::NotificationEvent;
use vela_shared::models::events::LowStockEvent;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub img_url: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub category_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub description: String,
    pub img_url: Option<String>,
    pub price_cents: i64,
    pub category_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    /// Positive to restock, negative to write stock off.
    pub delta: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/products", post(create_product).get(list_products))
        .route(
            "/v1/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/v1/products/{id}/stock", post(adjust_stock))
        .route("/v1/products/by-name/{name}", get(get_product_by_name))
        .route(
            "/v1/products/by-vendor/{vendor_id}",
            get(list_products_by_vendor),
        )
        .route(
            "/v1/products/by-category/{category_name}",
            get(list_products_by_category),
        )
}

/// POST /v1/products
/// Vendor lists a new product under an active category.
async fn create_product(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let vendor_id = caller.require_vendor()?.to_string();

    let category = state
        .categories
        .get_category_by_name(&req.category_name)
        .await
        .map_err(ApiError::internal)?;
    match category {
        Some(category) if category.is_active => {}
        _ => {
            return Err(ApiError::BadRequest(
                ProductError::CategoryNotAvailable(req.category_name).to_string(),
            ))
        }
    }

    let mut product = Product::new(
        req.name,
        req.description,
        req.price_cents,
        req.stock_quantity,
        vendor_id,
        req.category_name,
    )
    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    product.img_url = req.img_url;

    state
        .products
        .create_product(&product)
        .await
        .map_err(ApiError::internal)?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /v1/products/:id (owning vendor only)
async fn update_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    let vendor_id = caller.require_vendor()?;
    let mut product = fetch_owned_product(&state, id, vendor_id).await?;

    product.name = req.name;
    product.description = req.description;
    product.img_url = req.img_url;
    product.category_name = req.category_name;
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest("Price must be non-negative".to_string()));
    }
    product.price_cents = req.price_cents;

    state
        .products
        .update_product(id, &product)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(product))
}

/// DELETE /v1/products/:id (owning vendor only)
async fn delete_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let vendor_id = caller.require_vendor()?;
    fetch_owned_product(&state, id, vendor_id).await?;

    state
        .products
        .delete_product(id)
        .await
        .map_err(ApiError::internal)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/products/:id/stock
/// Vendor adjusts stock; draining past the threshold alerts the vendor feed.
async fn adjust_stock(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<Product>, ApiError> {
    let vendor_id = caller.require_vendor()?;
    let mut product = fetch_owned_product(&state, id, vendor_id).await?;

    product
        .adjust_stock(req.delta, state.low_stock_threshold)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    state
        .products
        .update_product(id, &product)
        .await
        .map_err(ApiError::internal)?;

    if product.is_low_stock {
        let event = NotificationEvent::LowStock(LowStockEvent {
            product_id: product.id,
            product_name: product.name.clone(),
            vendor_id: product.vendor_id.clone(),
            remaining_quantity: product.stock_quantity,
            timestamp: Utc::now().timestamp(),
        });
        if let Err(err) = state.notifier.emit(event).await {
            tracing::warn!(error = %err, "Notification emit failed");
        }
    }

    Ok(Json(product))
}

/// GET /v1/products/:id
async fn get_product(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .products
        .get_product(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// GET /v1/products/by-name/:name
async fn get_product_by_name(
    State(state): State<AppState>,
    _caller: Caller,
    Path(name): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .products
        .get_product_by_name(&name)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound(format!("No product found with name {name:?}")))?;
    Ok(Json(product))
}

/// GET /v1/products
async fn list_products(
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .products
        .list_products()
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(products))
}

/// GET /v1/products/by-vendor/:vendor_id
async fn list_products_by_vendor(
    State(state): State<AppState>,
    _caller: Caller,
    Path(vendor_id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .products
        .list_products_by_vendor(&vendor_id)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(products))
}

/// GET /v1/products/by-category/:category_name
async fn list_products_by_category(
    State(state): State<AppState>,
    _caller: Caller,
    Path(category_name): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .products
        .list_products_by_category(&category_name)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(products))
}

async fn fetch_owned_product(
    state: &AppState,
    id: Uuid,
    vendor_id: &str,
) -> Result<Product, ApiError> {
    let product = state
        .products
        .get_product(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    if product.vendor_id != vendor_id {
        return Err(ApiError::Forbidden(
            "Product belongs to another vendor".to_string(),
        ));
    }
    Ok(product)
}
