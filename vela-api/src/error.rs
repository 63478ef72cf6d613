use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vela_order::OrderError;

#[derive(Debug)]
pub enum ApiError {
    Unauthenticated(String),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Order(OrderError),
    Internal(anyhow::Error),
}

impl ApiError {
    /// Collaborator/storage failures that carry no actionable detail for the
    /// caller.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(anyhow::anyhow!("{err}"))
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

/// Each error kind maps to its own response class so clients can tell
/// not-found, authorization, lifecycle, race and upstream failures apart.
fn order_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::NotFound(_) => StatusCode::NOT_FOUND,
        OrderError::Forbidden(_) => StatusCode::FORBIDDEN,
        OrderError::InvalidState(_)
        | OrderError::InvalidTransition(_)
        | OrderError::Validation(_) => StatusCode::BAD_REQUEST,
        OrderError::Conflict(_) => StatusCode::CONFLICT,
        OrderError::Dependency(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Order(err) => (order_status(&err), err.to_string()),
            ApiError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_distinct_status_codes() {
        let cases = [
            (OrderError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (OrderError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (OrderError::InvalidState("x".into()), StatusCode::BAD_REQUEST),
            (
                OrderError::InvalidTransition("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (OrderError::Conflict("x".into()), StatusCode::CONFLICT),
            (OrderError::Dependency("x".into()), StatusCode::BAD_GATEWAY),
            (OrderError::Validation("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            assert_eq!(order_status(&err), expected, "{err}");
        }
    }
}
