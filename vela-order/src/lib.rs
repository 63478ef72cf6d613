pub mod cancellation;
pub mod error;
pub mod fulfillment;
pub mod models;
pub mod placement;
pub mod status;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use cancellation::{CancellationOutcome, CancellationWorkflow, RestockFailure};
pub use error::OrderError;
pub use fulfillment::FulfillmentService;
pub use models::{Order, OrderItem, OrderStatus, VendorStatus};
pub use placement::{NewOrderItem, PlacementService};
pub use store::{MemoryOrderStore, OrderStore, StoreError, Versioned};
