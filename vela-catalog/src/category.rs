use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product category. Inactive categories stay visible on existing products
/// but reject new ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub category_name: String,
    /// Number of products filed under this category; derived on read.
    pub category_count: Option<i64>,
    pub is_active: bool,
}

impl Category {
    pub fn new(category_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_name,
            category_count: None,
            is_active: true,
        }
    }
}

/// Repository trait for category data access.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create_category(
        &self,
        category: &Category,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_category(
        &self,
        id: Uuid,
    ) -> Result<Option<Category>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_categories(
        &self,
    ) -> Result<Vec<Category>, Box<dyn std::error::Error + Send + Sync>>;

    /// Categories with their product counts filled in.
    async fn list_categories_with_counts(
        &self,
    ) -> Result<Vec<Category>, Box<dyn std::error::Error + Send + Sync>>;

    async fn set_category_status(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
