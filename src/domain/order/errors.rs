use serde::{Deserialize, Serialize};

use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

/// Error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderErrorCode {
    NotEditable,
    Invalid,
    NotFound,
}

impl OrderErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderErrorCode::NotEditable => "NOT_EDITABLE",
            OrderErrorCode::Invalid => "INVALID",
            OrderErrorCode::NotFound => "NOT_FOUND",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Only draft and unconfirmed orders can be modified.")]
    NotEditable(OrderStatus),

    #[error("Discount amount cannot be negative.")]
    NegativeDiscount,

    #[error("Discount amount cannot be greater than order total.")]
    DiscountExceedsTotal,

    #[error("Tax amount cannot be negative.")]
    NegativeTax,

    #[error("Couldn't resolve id: {0}.")]
    InvalidId(String),

    #[error("Couldn't resolve to a node: {0}")]
    NotFound(String),
}

impl OrderError {
    /// Input field the error is reported against
    pub fn field(&self) -> &'static str {
        match self {
            OrderError::NotEditable(_) | OrderError::InvalidId(_) | OrderError::NotFound(_) => "order",
            OrderError::NegativeDiscount | OrderError::DiscountExceedsTotal => "discountAmount",
            OrderError::NegativeTax => "taxAmount",
        }
    }

    pub fn code(&self) -> OrderErrorCode {
        match self {
            OrderError::NotEditable(_) => OrderErrorCode::NotEditable,
            OrderError::NotFound(_) => OrderErrorCode::NotFound,
            OrderError::NegativeDiscount
            | OrderError::DiscountExceedsTotal
            | OrderError::NegativeTax
            | OrderError::InvalidId(_) => OrderErrorCode::Invalid,
        }
    }
}

/// Field-scoped error as surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: OrderErrorCode,
}

impl From<&OrderError> for FieldError {
    fn from(error: &OrderError) -> Self {
        Self {
            field: error.field().to_string(),
            message: error.to_string(),
            code: error.code(),
        }
    }
}

impl From<OrderError> for FieldError {
    fn from(error: OrderError) -> Self {
        Self::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_mapping() {
        let error = FieldError::from(OrderError::DiscountExceedsTotal);

        assert_eq!(error.field, "discountAmount");
        assert_eq!(error.message, "Discount amount cannot be greater than order total.");
        assert_eq!(error.code, OrderErrorCode::Invalid);
    }

    #[test]
    fn test_not_editable_hides_status() {
        let error = FieldError::from(OrderError::NotEditable(OrderStatus::Fulfilled));

        assert_eq!(error.field, "order");
        assert_eq!(error.code, OrderErrorCode::NotEditable);
        assert!(!error.message.contains("Fulfilled"));
    }

    #[test]
    fn test_tax_and_lookup_errors() {
        assert_eq!(OrderError::NegativeTax.field(), "taxAmount");
        assert_eq!(OrderError::NotFound("T3JkZXI6MQ==".into()).code(), OrderErrorCode::NotFound);
        assert_eq!(OrderError::InvalidId("nope".into()).code(), OrderErrorCode::Invalid);
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_string(&OrderErrorCode::NotEditable).unwrap();
        assert_eq!(json, "\"NOT_EDITABLE\"");
        assert_eq!(OrderErrorCode::NotFound.as_str(), "NOT_FOUND");
    }
}
