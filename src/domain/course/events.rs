use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;
use crate::event_sourcing::core::DomainEvent;
use super::enrollment::EnrollmentStatus;
use super::value_objects::{CurrencyCode, Price};

// ============================================================================
// Course Events - Domain Events for the Course Aggregate
// ============================================================================

/// Course Event - Union type for all course events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CourseEvent {
    Created(CourseCreated),
    DetailsUpdated(CourseDetailsUpdated),
    PriceChanged(CoursePriceChanged),
    CurrencyChanged(CourseCurrencyChanged),
    TeacherChanged(CourseTeacherChanged),
    Published(CoursePublished),
    Unpublished(CourseUnpublished),
    Archived(CourseArchived),
    Unarchived(CourseUnarchived),
    StudentEnrolled(StudentEnrolled),
    StudentUnenrolled(StudentUnenrolled),
    EnrollmentStatusChanged(EnrollmentStatusChanged),
    Deleted(CourseDeleted),
}

impl DomainEvent for CourseEvent {
    fn variant_name(&self) -> &'static str {
        match self {
            CourseEvent::Created(_) => "CourseCreated",
            CourseEvent::DetailsUpdated(_) => "CourseDetailsUpdated",
            CourseEvent::PriceChanged(_) => "CoursePriceChanged",
            CourseEvent::CurrencyChanged(_) => "CourseCurrencyChanged",
            CourseEvent::TeacherChanged(_) => "CourseTeacherChanged",
            CourseEvent::Published(_) => "CoursePublished",
            CourseEvent::Unpublished(_) => "CourseUnpublished",
            CourseEvent::Archived(_) => "CourseArchived",
            CourseEvent::Unarchived(_) => "CourseUnarchived",
            CourseEvent::StudentEnrolled(_) => "StudentEnrolled",
            CourseEvent::StudentUnenrolled(_) => "StudentUnenrolled",
            CourseEvent::EnrollmentStatusChanged(_) => "EnrollmentStatusChanged",
            CourseEvent::Deleted(_) => "CourseDeleted",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Course Created - Initial event in course lifecycle
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseCreated {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub currency: CurrencyCode,
    pub teacher_id: UserId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseDetailsUpdated {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CoursePriceChanged {
    pub old_price: Price,
    pub new_price: Price,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseCurrencyChanged {
    pub currency: CurrencyCode,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseTeacherChanged {
    pub old_teacher_id: UserId,
    pub new_teacher_id: UserId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CoursePublished {
    pub published_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseUnpublished {}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseArchived {
    pub archived_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseUnarchived {}

/// Student Enrolled - written under a privileged context
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StudentEnrolled {
    pub enrollment_id: Uuid,
    pub student_id: UserId,
    pub enrolled_on: NaiveDate,
    pub status: EnrollmentStatus,
    /// User the privileged write was performed for
    pub granted_for: UserId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StudentUnenrolled {
    pub enrollment_id: Uuid,
    pub student_id: UserId,
    pub granted_for: UserId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnrollmentStatusChanged {
    pub enrollment_id: Uuid,
    pub old_status: EnrollmentStatus,
    pub new_status: EnrollmentStatus,
}

/// Course Deleted - cascades to every enrollment of the course
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseDeleted {
    pub removed_enrollments: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = CourseEvent::Unpublished(CourseUnpublished {});
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Unpublished");
    }

    #[test]
    fn test_enrollment_event_survives_storage_format() {
        let event = CourseEvent::StudentEnrolled(StudentEnrolled {
            enrollment_id: Uuid::new_v4(),
            student_id: UserId::new(),
            enrolled_on: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            status: EnrollmentStatus::Enrolled,
            granted_for: UserId::new(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"enrolled_on\":\"2024-02-29\""));
        let decoded: CourseEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.variant_name(), "StudentEnrolled");
    }
}
