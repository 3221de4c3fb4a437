use uuid::Uuid;

// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// Key Principles:
// 1. Commands are validated before emitting events
// 2. Events represent facts that have already happened
// 3. Aggregates enforce business invariants
// 4. All state changes flow through events
//
// Aggregates here are loaded as snapshots by the caller; there is no event
// replay. `execute` runs a command against a copy so the loaded snapshot is
// never touched when a command is rejected.
//
// ============================================================================

/// Generic Aggregate trait
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Clone + Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Apply an event to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Get aggregate ID
    fn aggregate_id(&self) -> Uuid;

    /// Get current version (storage revision)
    fn version(&self) -> i64;

    /// Handle a command and fold the resulting events into a new state.
    ///
    /// `self` is left as it was whether the command succeeds or not.
    fn execute(&self, command: &Self::Command) -> Result<(Self, Vec<Self::Event>), Self::Error> {
        let events = self.handle_command(command)?;

        let mut next = self.clone();
        for event in &events {
            next.apply_event(event)?;
        }

        Ok((next, events))
    }
}
