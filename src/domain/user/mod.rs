// ============================================================================
// User Domain - identity, request contexts and course statistics
// ============================================================================

pub mod value_objects;
pub mod context;
pub mod stats;

pub use value_objects::*;
pub use context::*;
pub use stats::*;
