// ============================================================================
// Order Domain - Discount/Tax adjustments
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderStatus, Principal)
// - Events (OrderUpdated)
// - Commands (UpdateDiscountAndTax, AdjustmentRequest)
// - Errors (OrderError, FieldError, OrderErrorCode)
// - Aggregate (OrderSnapshot)
// - Rule (OrderAdjustmentRule, pure validation and recomputation)
// - Repository (snapshot persistence with optimistic versioning)
// - Command Handler (OrderAdjustmentHandler)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod rule;
pub mod repository;
pub mod command_handler;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use rule::*;
pub use repository::*;
pub use command_handler::*;
