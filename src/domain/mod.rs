// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with value objects, events,
// commands, errors, the aggregate itself and its command handler.
//
// This layer is separate from the event sourcing infrastructure.
//
// ============================================================================

pub mod order;
