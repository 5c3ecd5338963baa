// ============================================================================
// Event Sourcing Store - Generic Persistence Layer
// ============================================================================
//
// In-process, append-only event store. Works with ANY aggregate/event type.
//
// ============================================================================

pub mod event_store;

pub use event_store::{ConcurrencyConflict, EventStore};
