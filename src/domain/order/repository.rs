use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::utils::IsTransient;
use super::aggregate::{OrderSnapshot, OrderTotalsUpdate};

// ============================================================================
// Order Repository - Snapshot persistence
// ============================================================================
//
// Orders are loaded as snapshots and written back column-wise. Every write
// carries the version it was computed from; a mismatch means someone else
// wrote in between and the caller has to reload.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Concurrency conflict: expected version {expected}, but current is {actual}")]
    ConcurrencyConflict { expected: i64, actual: i64 },

    #[error("Order storage unavailable: {0}")]
    Unavailable(String),
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. } | StoreError::Unavailable(_))
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Load an order snapshot, `None` if the id is unknown
    async fn fetch(&self, order_id: Uuid) -> Result<Option<OrderSnapshot>, StoreError>;

    /// Write the adjusted totals if the stored version still equals
    /// `expected_version`. Returns the new version.
    async fn update_totals(
        &self,
        order_id: Uuid,
        expected_version: i64,
        update: OrderTotalsUpdate,
    ) -> Result<i64, StoreError>;
}

/// In-process repository used by tests and the demo binary
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, OrderSnapshot>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: OrderSnapshot) {
        self.orders.write().await.insert(order.id, order);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn fetch(&self, order_id: Uuid) -> Result<Option<OrderSnapshot>, StoreError> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn update_totals(
        &self,
        order_id: Uuid,
        expected_version: i64,
        update: OrderTotalsUpdate,
    ) -> Result<i64, StoreError> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&order_id).ok_or(StoreError::NotFound(order_id))?;

        if order.version != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                expected: expected_version,
                actual: order.version,
            });
        }

        order.total_discount_amount = update.total_discount_amount;
        order.total_tax_amount = update.total_tax_amount;
        order.total_net_amount = update.total_net_amount;
        order.updated_at = update.updated_at;
        order.version += 1;

        Ok(order.version)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::value_objects::OrderStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn draft() -> OrderSnapshot {
        OrderSnapshot::new(Uuid::new_v4(), OrderStatus::Draft, Uuid::new_v4(), Decimal::new(10_000, 2))
    }

    fn totals(net: i64) -> OrderTotalsUpdate {
        OrderTotalsUpdate {
            total_discount_amount: Some(Decimal::new(100 - net, 0)),
            total_tax_amount: None,
            total_net_amount: Decimal::new(net, 0),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_update_writes_only_totals_and_bumps_version() {
        let repo = InMemoryOrderRepository::new();
        let order = draft();
        repo.insert(order.clone()).await;

        let version = repo.update_totals(order.id, 0, totals(80)).await.unwrap();
        assert_eq!(version, 1);

        let stored = repo.fetch(order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_net_amount, Decimal::new(80, 0));
        assert_eq!(stored.total_discount_amount, Some(Decimal::new(20, 0)));
        assert_eq!(stored.status, order.status);
        assert_eq!(stored.total_gross_amount, order.total_gross_amount);
        assert_eq!(stored.channel_id, order.channel_id);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let repo = InMemoryOrderRepository::new();
        let order = draft();
        repo.insert(order.clone()).await;

        repo.update_totals(order.id, 0, totals(80)).await.unwrap();
        let result = repo.update_totals(order.id, 0, totals(70)).await;

        assert_eq!(result.unwrap_err(), StoreError::ConcurrencyConflict { expected: 0, actual: 1 });
        let stored = repo.fetch(order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_net_amount, Decimal::new(80, 0));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let repo = InMemoryOrderRepository::new();
        let id = Uuid::new_v4();

        assert!(repo.fetch(id).await.unwrap().is_none());
        assert_eq!(repo.update_totals(id, 0, totals(1)).await.unwrap_err(), StoreError::NotFound(id));
    }

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::ConcurrencyConflict { expected: 1, actual: 2 }.is_transient());
        assert!(StoreError::Unavailable("timeout".into()).is_transient());
        assert!(!StoreError::NotFound(Uuid::new_v4()).is_transient());
    }
}
