use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use vela_catalog::category::{Category, CategoryRepository};
use vela_catalog::product::{Product, ProductRepository};
use vela_core::stock::{RestockRequest, StockError, StockService};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn product_from_row(row: &sqlx::postgres::PgRow) -> Result<Product, BoxError> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        img_url: row.try_get("img_url")?,
        description: row.try_get("description")?,
        price_cents: row.try_get("price_cents")?,
        stock_quantity: row.try_get("stock_quantity")?,
        is_low_stock: row.try_get("is_low_stock")?,
        vendor_id: row.try_get("vendor_id")?,
        category_name: row.try_get("category_name")?,
    })
}

const PRODUCT_COLUMNS: &str =
    "id, name, img_url, description, price_cents, stock_quantity, is_low_stock, vendor_id, category_name";

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create_product(&self, product: &Product) -> Result<Uuid, BoxError> {
        sqlx::query(
            "INSERT INTO products \
             (id, name, img_url, description, price_cents, stock_quantity, is_low_stock, vendor_id, category_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.img_url)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.is_low_stock)
        .bind(&product.vendor_id)
        .bind(&product.category_name)
        .execute(&self.pool)
        .await?;
        Ok(product.id)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, BoxError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn get_product_by_name(&self, name: &str) -> Result<Option<Product>, BoxError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, BoxError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn list_products_by_vendor(&self, vendor_id: &str) -> Result<Vec<Product>, BoxError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE vendor_id = $1 ORDER BY name"
        ))
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn list_products_by_category(
        &self,
        category_name: &str,
    ) -> Result<Vec<Product>, BoxError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_name = $1 ORDER BY name"
        ))
        .bind(category_name)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn update_product(&self, id: Uuid, product: &Product) -> Result<(), BoxError> {
        sqlx::query(
            "UPDATE products \
             SET name = $1, img_url = $2, description = $3, price_cents = $4, \
                 stock_quantity = $5, is_low_stock = $6, vendor_id = $7, category_name = $8 \
             WHERE id = $9",
        )
        .bind(&product.name)
        .bind(&product.img_url)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.is_low_stock)
        .bind(&product.vendor_id)
        .bind(&product.category_name)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), BoxError> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn category_from_row(row: &sqlx::postgres::PgRow) -> Result<Category, BoxError> {
    Ok(Category {
        id: row.try_get("id")?,
        category_name: row.try_get("category_name")?,
        category_count: row.try_get("category_count").ok(),
        is_active: row.try_get("is_active")?,
    })
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create_category(&self, category: &Category) -> Result<Uuid, BoxError> {
        sqlx::query("INSERT INTO categories (id, category_name, is_active) VALUES ($1, $2, $3)")
            .bind(category.id)
            .bind(&category.category_name)
            .bind(category.is_active)
            .execute(&self.pool)
            .await?;
        Ok(category.id)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, BoxError> {
        let row = sqlx::query(
            "SELECT id, category_name, NULL::bigint AS category_count, is_active \
             FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, BoxError> {
        let row = sqlx::query(
            "SELECT id, category_name, NULL::bigint AS category_count, is_active \
             FROM categories WHERE category_name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BoxError> {
        let rows = sqlx::query(
            "SELECT id, category_name, NULL::bigint AS category_count, is_active \
             FROM categories ORDER BY category_name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn list_categories_with_counts(&self) -> Result<Vec<Category>, BoxError> {
        let rows = sqlx::query(
            "SELECT c.id, c.category_name, COUNT(p.id) AS category_count, c.is_active \
             FROM categories c \
             LEFT JOIN products p ON p.category_name = c.category_name \
             GROUP BY c.id, c.category_name, c.is_active \
             ORDER BY c.category_name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn set_category_status(&self, id: Uuid, is_active: bool) -> Result<(), BoxError> {
        sqlx::query("UPDATE categories SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Stock collaborator backed by the products table. A reversal is recorded in
/// `stock_reversals` keyed by (order, item); replays of an already-applied
/// reversal are no-ops, which makes cancellation retries safe.
pub struct PgStockService {
    pool: PgPool,
    low_stock_threshold: i64,
}

impl PgStockService {
    pub fn new(pool: PgPool, low_stock_threshold: i64) -> Self {
        Self {
            pool,
            low_stock_threshold,
        }
    }
}

fn unavailable(err: impl std::fmt::Display) -> StockError {
    StockError::Unavailable(err.to_string())
}

#[async_trait]
impl StockService for PgStockService {
    async fn restock(&self, request: RestockRequest) -> Result<(), StockError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let marker = sqlx::query(
            "INSERT INTO stock_reversals (order_id, item_index) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(request.order_id)
        .bind(request.item_index as i32)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        if marker.rows_affected() == 0 {
            // Already reversed by an earlier attempt.
            tracing::debug!(
                order_id = %request.order_id,
                item_index = request.item_index,
                "Stock reversal already applied, skipping"
            );
            return Ok(());
        }

        let updated = sqlx::query(
            "UPDATE products \
             SET stock_quantity = stock_quantity + $1, \
                 is_low_stock = ($3 > 0 AND stock_quantity + $1 <= $3) \
             WHERE id = $2",
        )
        .bind(i64::from(request.quantity))
        .bind(request.product_id)
        .bind(self.low_stock_threshold)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        if updated.rows_affected() == 0 {
            // Roll back the marker so a later retry can still apply once the
            // product reappears.
            tx.rollback().await.map_err(unavailable)?;
            return Err(StockError::ProductNotFound(request.product_id));
        }

        tx.commit().await.map_err(unavailable)?;
        Ok(())
    }
}
