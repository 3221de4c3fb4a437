// ============================================================================
// Event Sourcing Store - Generic Persistence Layer
// ============================================================================
//
// Works with ANY event type implementing DomainEvent.
//
// ============================================================================

pub mod event_store;

pub use event_store::EventStore;
