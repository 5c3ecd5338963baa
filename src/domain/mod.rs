// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with value objects, events,
// commands, errors, the aggregate itself and its command handler.
//
// `user` holds no aggregate of its own: users are identified by id, and
// their course counts are derived from the course event streams.
//
// ============================================================================

pub mod course;
pub mod user;
