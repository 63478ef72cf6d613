use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use vela_core::identity::{Role, User, UserRepository, UserStatus};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_str(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Pending => "PENDING",
        UserStatus::Approved => "APPROVED",
    }
}

fn parse_status(s: &str) -> Result<UserStatus, BoxError> {
    match s {
        "PENDING" => Ok(UserStatus::Pending),
        "APPROVED" => Ok(UserStatus::Approved),
        other => Err(format!("Unknown user status: {other}").into()),
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::Customer => "CUSTOMER",
        Role::Vendor => "VENDOR",
        Role::Csr => "CSR",
        Role::Admin => "ADMIN",
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User, BoxError> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("user_status")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        address: row.try_get("address")?,
        role: Role::from_str(&role)?,
        user_status: parse_status(&status)?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, address, role, user_status, is_active, created_at";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &User) -> Result<Uuid, BoxError> {
        sqlx::query(
            "INSERT INTO users \
             (id, name, email, password_hash, address, role, user_status, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.address)
        .bind(role_str(user.role))
        .bind(status_str(user.user_status))
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(user.id)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, BoxError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, BoxError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn set_user_status(
        &self,
        id: Uuid,
        status: UserStatus,
        is_active: bool,
    ) -> Result<(), BoxError> {
        sqlx::query("UPDATE users SET user_status = $1, is_active = $2 WHERE id = $3")
            .bind(status_str(status))
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
