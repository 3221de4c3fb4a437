use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event_sourcing::core::Aggregate;
use super::aggregate::OrderSnapshot;
use super::commands::AdjustmentRequest;
use super::errors::FieldError;
use super::events::{OrderEvent, OrderUpdated};
use super::value_objects::Principal;

// ============================================================================
// Order Adjustment Rule
// ============================================================================
//
// Decides whether a discount/tax adjustment may be applied to an order and
// computes the resulting totals. Pure: no I/O, no logging, no shared state.
// Persisting the new snapshot and publishing the event is up to the caller.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdjustmentResult {
    Accepted {
        updated_order: OrderSnapshot,
        event: OrderUpdated,
    },
    Rejected(FieldError),
}

impl AdjustmentResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AdjustmentResult::Accepted { .. })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderAdjustmentRule;

impl OrderAdjustmentRule {
    /// Validate `request` against `order` and compute the adjusted snapshot.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// editable status, then discount sign and ceiling, then tax sign.
    pub fn apply(
        &self,
        order: &OrderSnapshot,
        request: &AdjustmentRequest,
        principal: Principal,
        at: DateTime<Utc>,
    ) -> AdjustmentResult {
        let adjusted = order.adjustment_event(request, principal, at).and_then(|event| {
            let mut updated_order = order.clone();
            updated_order.apply_event(&OrderEvent::Updated(event.clone()))?;
            Ok((updated_order, event))
        });

        match adjusted {
            Ok((updated_order, event)) => AdjustmentResult::Accepted { updated_order, event },
            Err(error) => AdjustmentResult::Rejected(FieldError::from(error)),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
