// ============================================================================
// Course Domain - Business Logic for Course Aggregate
// ============================================================================
//
// This module contains ALL Course-specific code:
// - Value objects (CourseState, Price, CurrencyCode)
// - Enrollment records owned by a course
// - Events (CourseCreated, StudentEnrolled, etc.)
// - Commands (CreateCourse, Enroll, Publish, etc.)
// - Errors (CourseError enum)
// - Aggregate (CourseAggregate with business logic)
// - Read side (CourseView, CourseQueries)
// - Command Handler (CourseCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod enrollment;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod view;
pub mod queries;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use enrollment::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use view::*;
pub use queries::*;
pub use command_handler::*;
