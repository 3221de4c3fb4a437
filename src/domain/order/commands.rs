use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::Principal;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Requested discount/tax amounts; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub discount_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
}

impl AdjustmentRequest {
    pub fn discount(amount: Decimal) -> Self {
        Self { discount_amount: Some(amount), tax_amount: None }
    }

    pub fn tax(amount: Decimal) -> Self {
        Self { discount_amount: None, tax_amount: Some(amount) }
    }
}

#[derive(Debug, Clone)]
pub enum OrderCommand {
    UpdateDiscountAndTax {
        request: AdjustmentRequest,
        requested_by: Principal,
        requested_at: DateTime<Utc>,
    },
}
