use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,
    Unconfirmed,
    Unfulfilled,
    PartiallyFulfilled,
    Fulfilled,
    PartiallyReturned,
    Returned,
    Canceled,
    Expired,
}

impl OrderStatus {
    /// Only orders not yet committed to fulfillment can have their totals edited.
    pub fn is_editable(&self) -> bool {
        matches!(self, OrderStatus::Draft | OrderStatus::Unconfirmed)
    }
}

/// Who is acting on an order: a staff user or an installed app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum Principal {
    User(Uuid),
    App(Uuid),
}

impl Principal {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::User(id) => Some(*id),
            Principal::App(_) => None,
        }
    }

    pub fn app_id(&self) -> Option<Uuid> {
        match self {
            Principal::App(id) => Some(*id),
            Principal::User(_) => None,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
