use crate::error::OrderError;
use crate::models::{OrderStatus, VendorStatus};

#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("Cannot aggregate an order with no items")]
    EmptyOrder,
}

impl From<AggregationError> for OrderError {
    fn from(err: AggregationError) -> Self {
        OrderError::InvalidState(err.to_string())
    }
}

/// Derive the order-level status from the item vendor statuses.
///
/// Terminal statuses are frozen: the current status is returned unchanged
/// regardless of item contents. Otherwise the result depends only on the
/// item count and how many of them are `Ready`, never on item order.
pub fn aggregate(
    current: OrderStatus,
    items: &[VendorStatus],
) -> Result<OrderStatus, AggregationError> {
    if current.is_terminal() {
        return Ok(current);
    }
    if items.is_empty() {
        return Err(AggregationError::EmptyOrder);
    }

    let ready = items
        .iter()
        .filter(|s| **s == VendorStatus::Ready)
        .count();

    let status = if ready == 0 {
        OrderStatus::Processing
    } else if ready == items.len() {
        OrderStatus::VendorReady
    } else {
        OrderStatus::PartiallyDelivered
    };
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VendorStatus::{Processing, Ready};

    #[test]
    fn no_ready_items_means_processing() {
        let status = aggregate(OrderStatus::Processing, &[Processing, Processing]).unwrap();
        assert_eq!(status, OrderStatus::Processing);
    }

    #[test]
    fn mixed_items_mean_partially_delivered() {
        let status = aggregate(OrderStatus::Processing, &[Ready, Processing]).unwrap();
        assert_eq!(status, OrderStatus::PartiallyDelivered);
    }

    #[test]
    fn all_ready_means_vendor_ready() {
        let status = aggregate(OrderStatus::PartiallyDelivered, &[Ready, Ready, Ready]).unwrap();
        assert_eq!(status, OrderStatus::VendorReady);
    }

    #[test]
    fn single_item_order_skips_partially_delivered() {
        let status = aggregate(OrderStatus::Processing, &[Ready]).unwrap();
        assert_eq!(status, OrderStatus::VendorReady);
    }

    #[test]
    fn empty_orders_are_an_error_not_processing() {
        let result = aggregate(OrderStatus::Processing, &[]);
        assert!(matches!(result, Err(AggregationError::EmptyOrder)));
    }

    #[test]
    fn terminal_statuses_are_returned_unchanged() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Canceled] {
            assert_eq!(aggregate(terminal, &[Processing]).unwrap(), terminal);
            assert_eq!(aggregate(terminal, &[Ready, Ready]).unwrap(), terminal);
            assert_eq!(aggregate(terminal, &[]).unwrap(), terminal);
        }
    }

    #[test]
    fn result_is_independent_of_item_order() {
        // Every multiset over {Processing, Ready} up to 4 items, compared
        // against its reversal and a rotation.
        let pool = [Processing, Ready];
        for n in 1..=4usize {
            for mask in 0..(1 << n) {
                let mut items: Vec<VendorStatus> =
                    (0..n).map(|i| pool[(mask >> i) & 1]).collect();
                let expected = aggregate(OrderStatus::Processing, &items).unwrap();

                items.reverse();
                assert_eq!(aggregate(OrderStatus::Processing, &items).unwrap(), expected);

                items.rotate_left(1);
                assert_eq!(aggregate(OrderStatus::Processing, &items).unwrap(), expected);
            }
        }
    }

    #[test]
    fn truth_table_depends_only_on_counts() {
        for n in 1..=5usize {
            for r in 0..=n {
                let mut items = vec![Ready; r];
                items.extend(vec![Processing; n - r]);
                let status = aggregate(OrderStatus::Processing, &items).unwrap();
                let expected = if r == 0 {
                    OrderStatus::Processing
                } else if r == n {
                    OrderStatus::VendorReady
                } else {
                    OrderStatus::PartiallyDelivered
                };
                assert_eq!(status, expected, "n={n} r={r}");
            }
        }
    }
}
