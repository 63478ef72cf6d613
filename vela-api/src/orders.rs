use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vela_core::identity::Role;
use vela_order::placement::NewOrderItem;
use vela_order::{CancellationOutcome, Order, OrderError, OrderStatus, VendorStatus};
use vela_shared::pii::Masked;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: String,
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    /// Position within the order; vendors address their items by it.
    pub index: usize,
    pub product_id: Uuid,
    pub product_name: String,
    pub vendor_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub vendor_status: VendorStatus,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: Masked<String>,
    pub total_cents: i64,
    pub payment_method: String,
    pub ordered_at: DateTime<Utc>,
    pub cancellation_requested: bool,
    pub cancellation_note: Option<String>,
}

impl OrderResponse {
    fn from_order(order: Order) -> Self {
        Self::filtered(order, None)
    }

    /// Vendor views only carry that vendor's own lines; the indices stay
    /// stable so item addressing keeps working.
    fn for_vendor(order: Order, vendor_id: &str) -> Self {
        Self::filtered(order, Some(vendor_id))
    }

    fn filtered(order: Order, vendor_id: Option<&str>) -> Self {
        let items = order
            .items
            .into_iter()
            .enumerate()
            .filter(|(_, item)| vendor_id.is_none_or(|v| item.vendor_id == v))
            .map(|(index, item)| OrderItemResponse {
                index,
                product_id: item.product_id,
                product_name: item.product_name,
                vendor_id: item.vendor_id,
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
                vendor_status: item.vendor_status,
            })
            .collect();
        Self {
            id: order.id,
            customer_id: order.customer_id,
            status: order.status,
            items,
            shipping_address: order.shipping_address,
            total_cents: order.total_cents,
            payment_method: order.payment_method,
            ordered_at: order.ordered_at,
            cancellation_requested: order.cancellation_requested,
            cancellation_note: order.cancellation_note,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetItemStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ResolveCancellationRequest {
    pub approve: bool,
    pub note: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(create_order).get(list_orders))
        .route("/v1/orders/{id}", get(get_order))
        .route(
            "/v1/orders/{id}/items/{index}/status",
            patch(set_item_status),
        )
        .route("/v1/orders/{id}/delivered", post(mark_delivered))
        .route(
            "/v1/orders/{id}/cancellation-request",
            post(request_cancellation),
        )
        .route("/v1/orders/{id}/cancellation", post(resolve_cancellation))
}

/// POST /v1/orders
/// Place a new order from catalog products.
async fn create_order(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    if caller.0.role != Role::Customer {
        return Err(ApiError::Forbidden(
            "Only customers place orders".to_string(),
        ));
    }

    let order = state
        .placement
        .place_order(
            caller.0.user_id,
            req.items,
            req.shipping_address,
            req.payment_method,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from_order(order))))
}

/// GET /v1/orders/:id
/// Retrieve order details; vendors see only their own lines.
async fn get_order(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .get(order_id)
        .await
        .map_err(OrderError::from)?
        .value;

    let response = match caller.0.role {
        Role::Admin | Role::Csr => OrderResponse::from_order(order),
        Role::Customer => {
            if order.customer_id != caller.0.user_id {
                return Err(ApiError::Forbidden(
                    "Order belongs to another customer".to_string(),
                ));
            }
            OrderResponse::from_order(order)
        }
        Role::Vendor => {
            let vendor_id = caller.require_vendor()?;
            if !order.items.iter().any(|i| i.vendor_id == vendor_id) {
                return Err(ApiError::Forbidden(
                    "Order has no items for this vendor".to_string(),
                ));
            }
            OrderResponse::for_vendor(order, vendor_id)
        }
    };
    Ok(Json(response))
}

/// GET /v1/orders
/// Role-scoped order listing.
async fn list_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let responses = match caller.0.role {
        Role::Admin | Role::Csr => state
            .orders
            .list_all()
            .await
            .map_err(OrderError::from)?
            .into_iter()
            .map(OrderResponse::from_order)
            .collect(),
        Role::Customer => state
            .orders
            .list_by_customer(&caller.0.user_id)
            .await
            .map_err(OrderError::from)?
            .into_iter()
            .map(OrderResponse::from_order)
            .collect(),
        Role::Vendor => {
            let vendor_id = caller.require_vendor()?.to_string();
            state
                .orders
                .list_by_vendor(&vendor_id)
                .await
                .map_err(OrderError::from)?
                .into_iter()
                .map(|order| OrderResponse::for_vendor(order, &vendor_id))
                .collect()
        }
    };
    Ok(Json(responses))
}

/// PATCH /v1/orders/:id/items/:index/status
/// A vendor flips one of its items between PROCESSING and READY.
async fn set_item_status(
    State(state): State<AppState>,
    caller: Caller,
    Path((order_id, item_index)): Path<(Uuid, usize)>,
    Json(req): Json<SetItemStatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let vendor_id = caller.require_vendor()?.to_string();

    let new_status = match req.status.as_str() {
        "PROCESSING" => VendorStatus::Processing,
        "READY" => VendorStatus::Ready,
        other => {
            return Err(OrderError::InvalidTransition(format!(
                "Unknown vendor status {other:?}, expected PROCESSING or READY"
            ))
            .into())
        }
    };

    let status = state
        .fulfillment
        .set_item_status(order_id, &vendor_id, item_index, new_status)
        .await?;
    Ok(Json(StatusResponse { status }))
}

/// POST /v1/orders/:id/delivered
/// Staff confirms fulfillment of a VENDOR_READY order.
async fn mark_delivered(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    caller.require_staff()?;
    let status = state.fulfillment.mark_delivered(order_id).await?;
    Ok(Json(StatusResponse { status }))
}

/// POST /v1/orders/:id/cancellation-request
/// Customer asks for the order to be cancelled; staff will arbitrate.
async fn request_cancellation(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    if caller.0.role != Role::Customer {
        return Err(ApiError::Forbidden(
            "Only the customer requests cancellation".to_string(),
        ));
    }
    let order = state
        .orders
        .get(order_id)
        .await
        .map_err(OrderError::from)?
        .value;
    if order.customer_id != caller.0.user_id {
        return Err(ApiError::Forbidden(
            "Order belongs to another customer".to_string(),
        ));
    }

    let status = state.cancellation.request_cancellation(order_id).await?;
    Ok(Json(StatusResponse { status }))
}

/// POST /v1/orders/:id/cancellation
/// Staff approves or denies a pending cancellation request. Partial restock
/// failures come back as a multi-status response: the cancellation itself is
/// committed either way.
async fn resolve_cancellation(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
    Json(req): Json<ResolveCancellationRequest>,
) -> Result<(StatusCode, Json<CancellationOutcome>), ApiError> {
    caller.require_staff()?;

    let outcome = state
        .cancellation
        .resolve_cancellation(order_id, req.approve, req.note)
        .await?;

    let code = if outcome.restock_failures.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((code, Json(outcome)))
}
