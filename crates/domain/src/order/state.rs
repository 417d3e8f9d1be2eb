//! Order status state machine.
//!
//! ```text
//! Pending ──┬──► Confirmed ──► Shipped ──► Delivered
//!           │
//!           └──► Cancelled
//! ```
//!
//! `Delivered` and `Cancelled` are terminal. A confirmed order cannot be
//! cancelled.

use order_store::OrderStatus;

use crate::error::OrderError;

/// Every legal edge, keyed by source status.
const TRANSITIONS: [(OrderStatus, &[OrderStatus]); 5] = [
    (
        OrderStatus::Pending,
        &[OrderStatus::Confirmed, OrderStatus::Cancelled],
    ),
    (OrderStatus::Confirmed, &[OrderStatus::Shipped]),
    (OrderStatus::Shipped, &[OrderStatus::Delivered]),
    (OrderStatus::Delivered, &[]),
    (OrderStatus::Cancelled, &[]),
];

/// Transition queries on [`OrderStatus`].
pub trait OrderStatusExt {
    /// Statuses reachable in one step.
    fn allowed_transitions(&self) -> &'static [OrderStatus];

    /// Returns true if moving to `target` is legal.
    fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl OrderStatusExt for OrderStatus {
    fn allowed_transitions(&self) -> &'static [OrderStatus] {
        TRANSITIONS
            .iter()
            .find(|(from, _)| from == self)
            .map(|(_, targets)| *targets)
            .unwrap_or(&[])
    }
}

/// Checks a requested status, given as text, against the table.
///
/// Unknown status names are reported as an illegal transition.
pub fn validate_transition(from: OrderStatus, requested: &str) -> Result<OrderStatus, OrderError> {
    match requested.parse::<OrderStatus>() {
        Ok(target) if from.can_transition_to(target) => Ok(target),
        _ => Err(OrderError::IllegalTransition {
            from,
            to: requested.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use OrderStatus::*;

    #[test]
    fn test_table_covers_every_status() {
        for status in OrderStatus::ALL {
            assert!(TRANSITIONS.iter().any(|(from, _)| *from == status));
        }
    }

    #[test]
    fn test_every_pair_against_the_table() {
        let legal = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Shipped),
            (Shipped, Delivered),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!Pending.is_terminal());
        assert!(!Confirmed.is_terminal());
        assert!(!Shipped.is_terminal());
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn test_confirmed_cannot_be_cancelled() {
        assert!(!Confirmed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_validate_transition_accepts_any_case() {
        assert_eq!(validate_transition(Pending, "Confirmed").unwrap(), Confirmed);
        assert_eq!(validate_transition(Shipped, "delivered").unwrap(), Delivered);
    }

    #[test]
    fn test_validate_transition_rejects_illegal_and_unknown() {
        let err = validate_transition(Pending, "Shipped").unwrap_err();
        assert!(matches!(
            err,
            OrderError::IllegalTransition { from: Pending, ref to } if to == "Shipped"
        ));

        let err = validate_transition(Pending, "teleported").unwrap_err();
        assert!(matches!(
            err,
            OrderError::IllegalTransition { from: Pending, ref to } if to == "teleported"
        ));

        assert!(validate_transition(Pending, "pending").is_err());
    }
}
