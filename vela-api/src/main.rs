use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vela_api::{app, AppState};
use vela_core::notify::{FanoutSink, NotificationSink};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vela_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = vela_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Vela API on port {}", config.server.port);

    let db = vela_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let kafka = vela_store::EventProducer::new(&config.kafka.brokers, &config.kafka.order_topic)
        .expect("Failed to create Kafka producer");

    let inbox = Arc::new(vela_store::PgNotificationInbox::new(db.pool.clone()));
    let notifier: Arc<dyn NotificationSink> = Arc::new(FanoutSink::new(vec![
        inbox.clone() as Arc<dyn NotificationSink>,
        Arc::new(kafka) as Arc<dyn NotificationSink>,
    ]));

    let threshold = config.business_rules.low_stock_threshold;
    let state = AppState::new(
        Arc::new(vela_store::PgOrderStore::new(db.pool.clone())),
        Arc::new(vela_store::PgProductRepository::new(db.pool.clone())),
        Arc::new(vela_store::PgCategoryRepository::new(db.pool.clone())),
        Arc::new(vela_store::PgUserRepository::new(db.pool.clone())),
        Arc::new(vela_store::PgStockService::new(db.pool.clone(), threshold)),
        notifier,
        inbox,
        threshold,
    );

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
