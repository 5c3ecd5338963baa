use uuid::Uuid;

// ============================================================================
// Course Business Rule Errors
// ============================================================================
//
// Messages are shown to end users as-is.
//

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CourseError {
    #[error("Course must be published to enroll")]
    NotPublished,

    #[error("You can't enroll in your own course")]
    TeacherCannotEnroll,

    #[error("You are already enrolled in this course")]
    AlreadyEnrolled,

    #[error("You are not enrolled in this course")]
    NotEnrolled,

    #[error("Teacher can't be a student of this course")]
    TeacherIsStudent,

    #[error("Price must be greater than 0")]
    NegativePrice,

    #[error("Course name is required")]
    EmptyName,

    #[error("Course description is required")]
    EmptyDescription,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Enrollment not found: {0}")]
    EnrollmentNotFound(Uuid),

    #[error("Course has been deleted")]
    Deleted,

    #[error("Course already exists")]
    AlreadyExists,

    #[error("Aggregate not initialized")]
    NotInitialized,
}

impl CourseError {
    /// Stable label for metrics
    pub fn code(&self) -> &'static str {
        match self {
            CourseError::NotPublished => "not_published",
            CourseError::TeacherCannotEnroll => "is_teacher",
            CourseError::AlreadyEnrolled => "already_enrolled",
            CourseError::NotEnrolled => "not_enrolled",
            CourseError::TeacherIsStudent => "teacher_is_student",
            CourseError::NegativePrice => "negative_price",
            CourseError::EmptyName => "empty_name",
            CourseError::EmptyDescription => "empty_description",
            CourseError::InvalidCurrency(_) => "invalid_currency",
            CourseError::EnrollmentNotFound(_) => "enrollment_not_found",
            CourseError::Deleted => "deleted",
            CourseError::AlreadyExists => "already_exists",
            CourseError::NotInitialized => "not_initialized",
        }
    }
}
