use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::event_sourcing::core::DomainEvent;
use super::value_objects::Principal;

// ============================================================================
// Order Events - Domain Events for Order Aggregate
// ============================================================================

/// Order Event - Union type for all order events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Updated(OrderUpdated),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Updated(_) => "OrderUpdated",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Updated - discount/tax totals overwritten and net recomputed
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderUpdated {
    pub order_id: Uuid,
    pub principal: Principal,
    pub occurred_at: DateTime<Utc>,

    pub discount_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub net_amount: Decimal,

    pub previous_discount_amount: Option<Decimal>,
    pub previous_tax_amount: Option<Decimal>,
}
