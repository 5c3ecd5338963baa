use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;

// ============================================================================
// Enrollment - child entity owned by a course
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    Enrolled,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Completed => "completed",
        }
    }
}

/// A student's place in a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: UserId,
    pub enrolled_on: NaiveDate,
    pub status: EnrollmentStatus,
}

impl Enrollment {
    pub fn new(id: Uuid, student_id: UserId, enrolled_on: NaiveDate, status: EnrollmentStatus) -> Self {
        Self { id, student_id, enrolled_on, status }
    }

    pub fn belongs_to(&self, user: UserId) -> bool {
        self.student_id == user
    }
}
