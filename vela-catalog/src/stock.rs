use serde::{Deserialize, Serialize};

/// Snapshot of a product's stock after an adjustment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockLevel {
    pub quantity: i64,
    pub is_low: bool,
}

/// A product is flagged low once its quantity drops to the threshold or
/// below. Zero-threshold disables the flag entirely.
pub fn is_low(quantity: i64, threshold: i64) -> bool {
    threshold > 0 && quantity <= threshold
}
