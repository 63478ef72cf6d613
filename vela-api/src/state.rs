use std::sync::Arc;

use vela_catalog::category::CategoryRepository;
use vela_catalog::product::ProductRepository;
use vela_core::identity::UserRepository;
use vela_core::notify::{NotificationFeed, NotificationSink};
use vela_core::stock::StockService;
use vela_order::{CancellationWorkflow, FulfillmentService, OrderStore, PlacementService};

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderStore>,
    pub products: Arc<dyn ProductRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub users: Arc<dyn UserRepository>,
    pub notifier: Arc<dyn NotificationSink>,
    pub feed: Arc<dyn NotificationFeed>,
    pub placement: Arc<PlacementService>,
    pub fulfillment: Arc<FulfillmentService>,
    pub cancellation: Arc<CancellationWorkflow>,
    pub low_stock_threshold: i64,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductRepository>,
        categories: Arc<dyn CategoryRepository>,
        users: Arc<dyn UserRepository>,
        stock: Arc<dyn StockService>,
        notifier: Arc<dyn NotificationSink>,
        feed: Arc<dyn NotificationFeed>,
        low_stock_threshold: i64,
    ) -> Self {
        let placement = Arc::new(PlacementService::new(
            orders.clone(),
            products.clone(),
            notifier.clone(),
            low_stock_threshold,
        ));
        let fulfillment = Arc::new(FulfillmentService::new(orders.clone(), notifier.clone()));
        let cancellation = Arc::new(CancellationWorkflow::new(
            orders.clone(),
            stock,
            notifier.clone(),
        ));
        Self {
            orders,
            products,
            categories,
            users,
            notifier,
            feed,
            placement,
            fulfillment,
            cancellation,
            low_stock_threshold,
        }
    }
}
