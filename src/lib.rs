//! Order discount/tax adjustments.
//!
//! [`domain::order::OrderAdjustmentRule`] decides whether an order's discount
//! and tax totals may be overwritten and recomputes its net total.
//! [`domain::order::OrderAdjustmentHandler`] runs the full mutation around it:
//! id decoding, channel-scoped authorization, optimistic persistence and the
//! order-history log.

pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod global_id;
pub mod metrics;
pub mod permissions;
pub mod telemetry;
pub mod utils;
