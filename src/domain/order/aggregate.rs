use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::event_sourcing::core::Aggregate;
use super::value_objects::{OrderStatus, Principal};
use super::events::*;
use super::commands::{AdjustmentRequest, OrderCommand};
use super::errors::OrderError;

// ============================================================================
// Order Snapshot - Aggregate state as loaded from storage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    // Identity
    pub id: Uuid,
    pub version: i64,

    pub status: OrderStatus,
    pub channel_id: Uuid,

    // Totals
    pub total_gross_amount: Decimal,
    pub total_discount_amount: Option<Decimal>,
    pub total_tax_amount: Option<Decimal>,
    pub total_net_amount: Decimal,

    pub updated_at: DateTime<Utc>,
}

/// The columns an adjustment is allowed to write back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTotalsUpdate {
    pub total_discount_amount: Option<Decimal>,
    pub total_tax_amount: Option<Decimal>,
    pub total_net_amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl OrderSnapshot {
    /// New order at version 0 with net derived from gross
    pub fn new(id: Uuid, status: OrderStatus, channel_id: Uuid, total_gross_amount: Decimal) -> Self {
        Self {
            id,
            version: 0,
            status,
            channel_id,
            total_gross_amount,
            total_discount_amount: None,
            total_tax_amount: None,
            total_net_amount: total_gross_amount,
            updated_at: Utc::now(),
        }
    }

    pub fn with_discount(mut self, amount: Decimal) -> Self {
        self.total_discount_amount = Some(amount);
        self.total_net_amount = self.expected_net_amount();
        self
    }

    pub fn with_tax(mut self, amount: Decimal) -> Self {
        self.total_tax_amount = Some(amount);
        self.total_net_amount = self.expected_net_amount();
        self
    }

    /// gross - discount - tax, absent amounts counting as zero
    pub fn expected_net_amount(&self) -> Decimal {
        self.total_gross_amount
            - self.total_discount_amount.unwrap_or(Decimal::ZERO)
            - self.total_tax_amount.unwrap_or(Decimal::ZERO)
    }

    pub fn totals_update(&self) -> OrderTotalsUpdate {
        OrderTotalsUpdate {
            total_discount_amount: self.total_discount_amount,
            total_tax_amount: self.total_tax_amount,
            total_net_amount: self.total_net_amount,
            updated_at: self.updated_at,
        }
    }

    /// Validate `request` and build the resulting `OrderUpdated` event.
    /// Amounts missing from the request keep their current values.
    pub fn adjustment_event(
        &self,
        request: &AdjustmentRequest,
        requested_by: Principal,
        requested_at: DateTime<Utc>,
    ) -> Result<OrderUpdated, OrderError> {
        self.validate_adjustment(request)?;

        let discount_amount = request.discount_amount.or(self.total_discount_amount);
        let tax_amount = request.tax_amount.or(self.total_tax_amount);
        let net_amount = self.total_gross_amount
            - discount_amount.unwrap_or(Decimal::ZERO)
            - tax_amount.unwrap_or(Decimal::ZERO);

        Ok(OrderUpdated {
            order_id: self.id,
            principal: requested_by,
            occurred_at: requested_at,
            discount_amount,
            tax_amount,
            net_amount,
            previous_discount_amount: self.total_discount_amount,
            previous_tax_amount: self.total_tax_amount,
        })
    }

    fn validate_adjustment(&self, request: &AdjustmentRequest) -> Result<(), OrderError> {
        if !self.status.is_editable() {
            return Err(OrderError::NotEditable(self.status));
        }

        if let Some(discount) = request.discount_amount {
            if discount < Decimal::ZERO {
                return Err(OrderError::NegativeDiscount);
            }
            if discount > self.total_gross_amount {
                return Err(OrderError::DiscountExceedsTotal);
            }
        }

        if let Some(tax) = request.tax_amount {
            if tax < Decimal::ZERO {
                return Err(OrderError::NegativeTax);
            }
        }

        Ok(())
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderSnapshot {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Updated(e) => {
                self.total_discount_amount = e.discount_amount;
                self.total_tax_amount = e.tax_amount;
                self.total_net_amount = e.net_amount;
                self.updated_at = e.occurred_at;
                Ok(())
            }
        }
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::UpdateDiscountAndTax { request, requested_by, requested_at } => {
                let event = self.adjustment_event(request, *requested_by, *requested_at)?;
                Ok(vec![OrderEvent::Updated(event)])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
