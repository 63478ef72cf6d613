use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

/// Role assigned to an account. Vendors manage their own products and order
/// items; CSR and Admin arbitrate cancellations and confirm delivery.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Vendor,
    Csr,
    Admin,
}

impl Role {
    /// CSR and Admin share the back-office privileges.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Csr | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Role::Customer),
            "VENDOR" => Ok(Role::Vendor),
            "CSR" => Ok(Role::Csr),
            "ADMIN" => Ok(Role::Admin),
            other => Err(CoreError::ValidationError(format!(
                "Unknown role: {other}"
            ))),
        }
    }
}

/// The authenticated caller of an operation, as asserted by the upstream
/// gateway. Verification of the assertion is not this system's concern.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
    /// Present only for vendor accounts.
    pub vendor_id: Option<String>,
}

impl Actor {
    pub fn customer(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Customer,
            vendor_id: None,
        }
    }

    pub fn vendor(user_id: impl Into<String>, vendor_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Vendor,
            vendor_id: Some(vendor_id.into()),
        }
    }

    pub fn staff(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            vendor_id: None,
        }
    }
}

/// Account approval state. New accounts start out pending until an admin
/// approves them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Pending,
    Approved,
}

/// A back-office account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    /// Opaque hash produced upstream; never a plaintext password.
    pub password_hash: String,
    pub address: Option<String>,
    pub role: Role,
    pub user_status: UserStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            email,
            password_hash,
            address: None,
            role,
            user_status: UserStatus::Pending,
            is_active: false,
            created_at: Utc::now(),
        }
    }

    /// Admin approval flips the account to approved and active.
    pub fn approve(&mut self) {
        self.user_status = UserStatus::Approved;
        self.is_active = true;
    }
}

/// Repository trait for account data access.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(
        &self,
        user: &User,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_user(
        &self,
        id: Uuid,
    ) -> Result<Option<User>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_users(&self) -> Result<Vec<User>, Box<dyn std::error::Error + Send + Sync>>;

    async fn set_user_status(
        &self,
        id: Uuid,
        status: UserStatus,
        is_active: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("CSR").unwrap(), Role::Csr);
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn new_users_start_pending_and_inactive() {
        let mut user = User::new(
            "vendor@example.com".to_string(),
            "hash".to_string(),
            Role::Vendor,
        );
        assert_eq!(user.user_status, UserStatus::Pending);
        assert!(!user.is_active);

        user.approve();
        assert_eq!(user.user_status, UserStatus::Approved);
        assert!(user.is_active);
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Csr.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(!Role::Vendor.is_staff());
        assert!(!Role::Customer.is_staff());
    }
}
