use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::event_sourcing::{EventEnvelope, EventStore};
use crate::global_id::GlobalId;
use crate::metrics::{outcome, Metrics};
use crate::permissions::{OrderPermissions, PermissionChecker};
use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

use super::aggregate::OrderSnapshot;
use super::commands::AdjustmentRequest;
use super::errors::{FieldError, OrderError};
use super::events::{OrderEvent, OrderUpdated};
use super::repository::{OrderRepository, StoreError};
use super::rule::{AdjustmentResult, OrderAdjustmentRule};
use super::value_objects::Principal;

// ============================================================================
// Order Discount/Tax Update Handler
// ============================================================================
//
// Orchestrates: decode id → fetch → authorize → rule → persist → history
//
// Business rejections come back as field errors in the payload. Permission
// denial and storage failures are errors. Fetch through persist is retried
// when storage reports a transient failure, such as a version conflict.
//
// Each committed version N is recorded as history event N. The commit and
// the history append for one order run under that order's write lock, so
// history follows commit order. A failed append does not undo the commit:
// the request still succeeds and the failure is logged and counted.
//
// ============================================================================

pub const ORDER_TYPE_NAME: &str = "Order";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDiscountAndTaxUpdateInput {
    /// Global ID of the order
    pub order: String,
    pub discount_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDiscountAndTaxUpdatePayload {
    pub order: Option<OrderSnapshot>,
    pub errors: Vec<FieldError>,
}

impl OrderDiscountAndTaxUpdatePayload {
    fn accepted(order: OrderSnapshot) -> Self {
        Self { order: Some(order), errors: Vec::new() }
    }

    fn rejected(error: FieldError) -> Self {
        Self { order: None, errors: vec![error] }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("You need one of the following permissions: {}", .0.name())]
    PermissionDenied(OrderPermissions),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl IsTransient for HandlerError {
    fn is_transient(&self) -> bool {
        match self {
            HandlerError::Storage(e) => e.is_transient(),
            HandlerError::PermissionDenied(_) => false,
        }
    }
}

/// Per-order locks held from the storage commit through the history append
#[derive(Default)]
struct OrderWriteLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl OrderWriteLocks {
    async fn acquire(&self, order_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self.locks.lock().await.entry(order_id).or_default().clone();
        lock.lock_owned().await
    }

    /// Drop the guard and forget locks nobody else is holding or waiting on
    async fn release(&self, guard: OwnedMutexGuard<()>) {
        drop(guard);
        self.locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

pub struct OrderAdjustmentHandler {
    orders: Arc<dyn OrderRepository>,
    permissions: Arc<dyn PermissionChecker>,
    history: Arc<EventStore<OrderEvent>>,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
    rule: OrderAdjustmentRule,
    write_locks: OrderWriteLocks,
}

impl OrderAdjustmentHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        permissions: Arc<dyn PermissionChecker>,
        history: Arc<EventStore<OrderEvent>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            orders,
            permissions,
            history,
            metrics,
            retry: RetryConfig::default(),
            rule: OrderAdjustmentRule,
            write_locks: OrderWriteLocks::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Handle an `orderDiscountAndTaxUpdate` request on behalf of `principal`
    pub async fn handle(
        &self,
        principal: Principal,
        input: OrderDiscountAndTaxUpdateInput,
        correlation_id: Uuid,
    ) -> Result<OrderDiscountAndTaxUpdatePayload, HandlerError> {
        let started = Instant::now();

        let result = match GlobalId::decode_as(&input.order, ORDER_TYPE_NAME) {
            Ok(order_id) => {
                let request = AdjustmentRequest {
                    discount_amount: input.discount_amount,
                    tax_amount: input.tax_amount,
                };
                let raw_id = input.order.as_str();
                let request = &request;

                retry_on_transient(self.retry.clone(), |attempt| {
                    if attempt > 1 {
                        self.metrics.record_retry_attempt("update_totals");
                    }
                    self.try_update(principal, order_id, raw_id, request, correlation_id)
                })
                .await
                .into_result()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Order id could not be decoded");
                Ok(OrderDiscountAndTaxUpdatePayload::rejected(
                    OrderError::InvalidId(input.order.clone()).into(),
                ))
            }
        };

        self.record(&result, started);
        result
    }

    async fn try_update(
        &self,
        principal: Principal,
        order_id: Uuid,
        raw_id: &str,
        request: &AdjustmentRequest,
        correlation_id: Uuid,
    ) -> Result<OrderDiscountAndTaxUpdatePayload, HandlerError> {
        let Some(order) = self.orders.fetch(order_id).await? else {
            return Ok(OrderDiscountAndTaxUpdatePayload::rejected(
                OrderError::NotFound(raw_id.to_string()).into(),
            ));
        };

        if !self.permissions.has_channel_permission(
            &principal,
            OrderPermissions::ManageOrders,
            order.channel_id,
        ) {
            tracing::warn!(
                order_id = %order.id,
                channel_id = %order.channel_id,
                "Principal lacks MANAGE_ORDERS for channel"
            );
            return Err(HandlerError::PermissionDenied(OrderPermissions::ManageOrders));
        }

        let (updated, event) = match self.rule.apply(&order, request, principal, Utc::now()) {
            AdjustmentResult::Accepted { updated_order, event } => (updated_order, event),
            AdjustmentResult::Rejected(error) => {
                tracing::debug!(
                    order_id = %order.id,
                    field = %error.field,
                    code = error.code.as_str(),
                    "Adjustment rejected"
                );
                return Ok(OrderDiscountAndTaxUpdatePayload::rejected(error));
            }
        };

        let guard = self.write_locks.acquire(order.id).await;
        let committed = self.commit(&order, &updated, event, principal, correlation_id).await;
        self.write_locks.release(guard).await;
        let version = committed?;

        tracing::info!(
            order_id = %order.id,
            version = version,
            net_amount = %updated.total_net_amount,
            "Order discount and tax updated"
        );

        Ok(OrderDiscountAndTaxUpdatePayload::accepted(OrderSnapshot { version, ..updated }))
    }

    /// Write the new totals, then append the event as history entry `version`.
    /// Must run under the order's write lock.
    async fn commit(
        &self,
        order: &OrderSnapshot,
        updated: &OrderSnapshot,
        event: OrderUpdated,
        principal: Principal,
        correlation_id: Uuid,
    ) -> Result<i64, HandlerError> {
        let version = self
            .orders
            .update_totals(order.id, order.version, updated.totals_update())
            .await?;

        let mut envelope = EventEnvelope::new(order.id, OrderEvent::Updated(event), correlation_id)
            .with_timestamp(updated.updated_at);
        if let Some(user_id) = principal.user_id() {
            envelope = envelope.with_user(user_id);
        }
        if let Some(app_id) = principal.app_id() {
            envelope = envelope.with_metadata("app_id", app_id.to_string());
        }

        if let Err(e) = self.history.append_events(order.id, version - 1, vec![envelope]).await {
            tracing::error!(
                order_id = %order.id,
                version = version,
                error = %e,
                "Order totals committed but history append failed"
            );
            self.metrics.record_history_failure();
        }

        Ok(version)
    }

    fn record(&self, result: &Result<OrderDiscountAndTaxUpdatePayload, HandlerError>, started: Instant) {
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(payload) if payload.is_success() => {
                self.metrics.record_outcome(outcome::ACCEPTED, elapsed);
            }
            Ok(payload) => {
                for error in &payload.errors {
                    self.metrics.record_rejection(&error.field, error.code.as_str());
                }
                self.metrics.record_outcome(outcome::REJECTED, elapsed);
            }
            Err(HandlerError::PermissionDenied(_)) => {
                self.metrics.record_outcome(outcome::DENIED, elapsed);
            }
            Err(e) => {
                tracing::error!(error = %e, "Order adjustment failed");
                self.metrics.record_outcome(outcome::FAILED, elapsed);
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
