use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use order_adjustments::config::AppConfig;
use order_adjustments::domain::order::{
    InMemoryOrderRepository, OrderAdjustmentHandler, OrderDiscountAndTaxUpdateInput,
    OrderSnapshot, OrderStatus, Principal, HandlerError, ORDER_TYPE_NAME,
};
use order_adjustments::event_sourcing::EventStore;
use order_adjustments::global_id::GlobalId;
use order_adjustments::metrics::Metrics;
use order_adjustments::permissions::{ChannelPermissionTable, ChannelScope, OrderPermissions};
use order_adjustments::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(&config.log_filter);

    tracing::info!("Starting order adjustment demo");

    // === 1. Collaborators: storage, permissions, history, metrics ===
    let orders = Arc::new(InMemoryOrderRepository::new());
    let history = Arc::new(EventStore::new(ORDER_TYPE_NAME));
    let metrics = Arc::new(Metrics::new()?);

    let channel_id = Uuid::new_v4();
    let staff = Principal::User(Uuid::new_v4());
    let outsider = Principal::User(Uuid::new_v4());
    let permissions = ChannelPermissionTable::new()
        .grant(staff, OrderPermissions::ManageOrders, ChannelScope::Only(vec![channel_id]));

    let handler = OrderAdjustmentHandler::new(
        orders.clone(),
        Arc::new(permissions),
        history.clone(),
        metrics.clone(),
    )
    .with_retry(config.retry());

    // === 2. Seed orders ===
    let draft = OrderSnapshot::new(Uuid::new_v4(), OrderStatus::Draft, channel_id, Decimal::new(10_000, 2));
    let fulfilled = OrderSnapshot::new(Uuid::new_v4(), OrderStatus::Fulfilled, channel_id, Decimal::new(10_000, 2));
    orders.insert(draft.clone()).await;
    orders.insert(fulfilled.clone()).await;

    let request = |order: &OrderSnapshot, discount: Option<Decimal>, tax: Option<Decimal>| {
        OrderDiscountAndTaxUpdateInput {
            order: GlobalId::new(ORDER_TYPE_NAME, order.id).encode(),
            discount_amount: discount,
            tax_amount: tax,
        }
    };

    // === 3. Run a few adjustments ===
    let attempts = vec![
        ("discount on draft", staff, request(&draft, Some(Decimal::new(2_000, 2)), None)),
        ("tax on draft", staff, request(&draft, None, Some(Decimal::new(300, 2)))),
        ("discount above total", staff, request(&draft, Some(Decimal::new(15_000, 2)), None)),
        ("discount on fulfilled", staff, request(&fulfilled, Some(Decimal::new(500, 2)), None)),
        ("outsider", outsider, request(&draft, Some(Decimal::ZERO), None)),
    ];

    for (label, principal, input) in attempts {
        match handler.handle(principal, input, Uuid::new_v4()).await {
            Ok(payload) => {
                tracing::info!(
                    label,
                    payload = %serde_json::to_string(&payload)?,
                    "Adjustment handled"
                );
            }
            Err(e @ HandlerError::PermissionDenied(_)) => {
                tracing::warn!(label, error = %e, "Adjustment denied");
            }
            Err(e) => return Err(e.into()),
        }
    }

    // === 4. Show what was recorded ===
    tracing::info!(
        order_id = %draft.id,
        sequence = history.get_current_sequence(draft.id).await,
        "Order history length"
    );
    for envelope in history.load_events(draft.id).await {
        tracing::info!(
            sequence = envelope.sequence_number,
            event = %serde_json::to_string(&envelope.event_data)?,
            "Order history"
        );
    }

    println!("{}", metrics.encode_text()?);

    tracing::info!("Demo complete");

    Ok(())
}
