use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stock::StockLevel;

/// A product listed by a vendor. The stock quantity and low-stock flag live
/// on the product record itself; the flag is recomputed on every stock write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub img_url: Option<String>,
    pub description: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub is_low_stock: bool,
    pub vendor_id: String,
    pub category_name: String,
}

impl Product {
    pub fn new(
        name: String,
        description: String,
        price_cents: i64,
        stock_quantity: i64,
        vendor_id: String,
        category_name: String,
    ) -> Result<Self, ProductError> {
        if name.trim().is_empty() {
            return Err(ProductError::Invalid("Product name is required".into()));
        }
        if price_cents < 0 {
            return Err(ProductError::Invalid("Price must be non-negative".into()));
        }
        if stock_quantity < 0 {
            return Err(ProductError::Invalid("Stock must be non-negative".into()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            img_url: None,
            description,
            price_cents,
            stock_quantity,
            is_low_stock: false,
            vendor_id,
            category_name,
        })
    }

    /// Apply a stock delta (restock is positive, checkout negative) and
    /// recompute the low-stock flag against the configured threshold.
    pub fn adjust_stock(&mut self, delta: i64, threshold: i64) -> Result<StockLevel, ProductError> {
        let next = self.stock_quantity + delta;
        if next < 0 {
            return Err(ProductError::InsufficientStock {
                product_id: self.id,
                requested: -delta,
                available: self.stock_quantity,
            });
        }
        self.stock_quantity = next;
        self.is_low_stock = crate::stock::is_low(next, threshold);
        Ok(StockLevel {
            quantity: next,
            is_low: self.is_low_stock,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Invalid product: {0}")]
    Invalid(String),

    #[error("Category not available: {0}")]
    CategoryNotAvailable(String),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i64,
        available: i64,
    },
}

/// Repository trait for product data access.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(
        &self,
        product: &Product,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_product_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_products(&self) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_products_by_vendor(
        &self,
        vendor_id: &str,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_products_by_category(
        &self,
        category_name: &str,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_product(
        &self,
        id: Uuid,
        product: &Product,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn delete_product(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product(stock: i64) -> Product {
        Product::new(
            "Cinnamon Sticks".to_string(),
            "Hand-rolled Ceylon cinnamon".to_string(),
            1250,
            stock,
            "vendor-1".to_string(),
            "Spices".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_negative_price() {
        let result = Product::new(
            "Bad".to_string(),
            String::new(),
            -1,
            0,
            "v".to_string(),
            "c".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn checkout_below_zero_is_rejected() {
        let mut product = sample_product(2);
        let err = product.adjust_stock(-3, 5).unwrap_err();
        assert!(matches!(err, ProductError::InsufficientStock { .. }));
        // Stock is untouched on rejection.
        assert_eq!(product.stock_quantity, 2);
    }

    #[test]
    fn low_stock_flag_tracks_threshold() {
        let mut product = sample_product(10);
        let level = product.adjust_stock(-6, 5).unwrap();
        assert_eq!(level.quantity, 4);
        assert!(level.is_low);
        assert!(product.is_low_stock);

        let level = product.adjust_stock(20, 5).unwrap();
        assert!(!level.is_low);
        assert!(!product.is_low_stock);
    }
}
