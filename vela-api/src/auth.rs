use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::str::FromStr;

use vela_core::identity::{Actor, Role};

use crate::error::ApiError;

// Identity is asserted by the gateway in front of this service; these
// headers are trusted, not verified here.
pub const USER_HEADER: &str = "x-vela-user-id";
pub const ROLE_HEADER: &str = "x-vela-role";
pub const VENDOR_HEADER: &str = "x-vela-vendor-id";

/// The authenticated caller, extracted from the gateway headers.
pub struct Caller(pub Actor);

impl Caller {
    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.0.role.is_staff() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Staff role required".to_string()))
        }
    }

    pub fn require_vendor(&self) -> Result<&str, ApiError> {
        match (self.0.role, self.0.vendor_id.as_deref()) {
            (Role::Vendor, Some(vendor_id)) => Ok(vendor_id),
            _ => Err(ApiError::Forbidden("Vendor role required".to_string())),
        }
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let user_id = header(USER_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("Missing {USER_HEADER} header")))?;
        let role = header(ROLE_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("Missing {ROLE_HEADER} header")))?;
        let role =
            Role::from_str(&role).map_err(|err| ApiError::Unauthenticated(err.to_string()))?;

        Ok(Caller(Actor {
            user_id,
            role,
            vendor_id: header(VENDOR_HEADER),
        }))
    }
}
