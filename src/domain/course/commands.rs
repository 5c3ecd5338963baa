use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::user::{PrivilegedContext, UserId};
use super::enrollment::EnrollmentStatus;

// ============================================================================
// Course Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum CourseCommand {
    CreateCourse {
        name: String,
        description: String,
        price: f64,
        currency: String,
        teacher_id: UserId,
    },
    UpdateDetails {
        name: Option<String>,
        description: Option<String>,
    },
    SetPrice {
        price: f64,
    },
    SetCurrency {
        currency: String,
    },
    ChangeTeacher {
        teacher_id: UserId,
    },
    Publish,
    Unpublish,
    Archive,
    Unarchive,
    /// Self-service enrollment of the privileged context's user
    Enroll {
        privilege: PrivilegedContext,
        enrolled_on: NaiveDate,
    },
    /// Self-service removal of the privileged context's user
    Unenroll {
        privilege: PrivilegedContext,
    },
    /// Direct write of an enrollment record
    AddEnrollment {
        privilege: PrivilegedContext,
        student_id: UserId,
        status: EnrollmentStatus,
        enrolled_on: NaiveDate,
    },
    SetEnrollmentStatus {
        privilege: PrivilegedContext,
        enrollment_id: Uuid,
        status: EnrollmentStatus,
    },
    DeleteCourse,
}

impl CourseCommand {
    /// Label used for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            CourseCommand::CreateCourse { .. } => "create_course",
            CourseCommand::UpdateDetails { .. } => "update_details",
            CourseCommand::SetPrice { .. } => "set_price",
            CourseCommand::SetCurrency { .. } => "set_currency",
            CourseCommand::ChangeTeacher { .. } => "change_teacher",
            CourseCommand::Publish => "publish",
            CourseCommand::Unpublish => "unpublish",
            CourseCommand::Archive => "archive",
            CourseCommand::Unarchive => "unarchive",
            CourseCommand::Enroll { .. } => "enroll",
            CourseCommand::Unenroll { .. } => "unenroll",
            CourseCommand::AddEnrollment { .. } => "add_enrollment",
            CourseCommand::SetEnrollmentStatus { .. } => "set_enrollment_status",
            CourseCommand::DeleteCourse => "delete_course",
        }
    }
}
