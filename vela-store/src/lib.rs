pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod events;
pub mod notify_repo;
pub mod order_repo;
pub mod user_repo;

pub use app_config::Config;
pub use catalog_repo::{PgCategoryRepository, PgProductRepository, PgStockService};
pub use database::DbClient;
pub use events::EventProducer;
pub use notify_repo::PgNotificationInbox;
pub use order_repo::PgOrderStore;
pub use user_repo::PgUserRepository;
