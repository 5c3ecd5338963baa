use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;
use crate::event_sourcing::core::Aggregate;
use super::commands::CourseCommand;
use super::enrollment::{Enrollment, EnrollmentStatus};
use super::errors::CourseError;
use super::events::*;
use super::value_objects::{CourseState, CurrencyCode, Price};

// ============================================================================
// Course Aggregate - Domain Logic
// ============================================================================
//
// The course owns its enrollments. Every rule about who may enroll, and
// when, is decided here against the loaded state.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Current State (derived from events)
    pub name: String,
    pub description: String,
    pub price: Price,
    pub currency: CurrencyCode,
    pub teacher_id: UserId,
    pub state: CourseState,
    pub enrollments: Vec<Enrollment>,
    pub deleted: bool,

    pub published_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl CourseAggregate {
    /// Decide the events that open a new course
    pub fn decide_create(command: &CourseCommand) -> Result<Vec<CourseEvent>, CourseError> {
        match command {
            CourseCommand::CreateCourse { name, description, price, currency, teacher_id } => {
                Self::validate_name(name)?;
                Self::validate_description(description)?;

                Ok(vec![CourseEvent::Created(CourseCreated {
                    name: name.trim().to_string(),
                    description: description.clone(),
                    price: Price::new(*price)?,
                    currency: CurrencyCode::parse(currency)?,
                    teacher_id: *teacher_id,
                })])
            }
            _ => Err(CourseError::NotInitialized),
        }
    }

    /// Whether `user` holds an enrollment in this course
    pub fn is_enrolled(&self, user: UserId) -> bool {
        self.enrollment_of(user).is_some()
    }

    /// Whether `user` may enroll right now
    pub fn can_enroll(&self, user: UserId) -> bool {
        self.state == CourseState::Published
            && self.teacher_id != user
            && !self.is_enrolled(user)
    }

    pub fn enrollment_of(&self, user: UserId) -> Option<&Enrollment> {
        self.enrollments.iter().find(|e| e.belongs_to(user))
    }

    pub fn enrollment(&self, enrollment_id: Uuid) -> Option<&Enrollment> {
        self.enrollments.iter().find(|e| e.id == enrollment_id)
    }

    pub fn is_taught_by(&self, user: UserId) -> bool {
        self.teacher_id == user
    }

    /// Apply a batch of freshly decided events
    pub fn apply_all(&mut self, events: &[CourseEvent]) -> Result<(), CourseError> {
        for event in events {
            self.apply_event(event)?;
        }
        Ok(())
    }

    fn validate_name(name: &str) -> Result<(), CourseError> {
        if name.trim().is_empty() {
            return Err(CourseError::EmptyName);
        }
        Ok(())
    }

    fn validate_description(description: &str) -> Result<(), CourseError> {
        if description.trim().is_empty() {
            return Err(CourseError::EmptyDescription);
        }
        Ok(())
    }

    fn ensure_not_deleted(&self) -> Result<(), CourseError> {
        if self.deleted {
            return Err(CourseError::Deleted);
        }
        Ok(())
    }

    /// Only a published course takes "enrolled" records
    fn ensure_accepts_enrolled(&self, status: EnrollmentStatus) -> Result<(), CourseError> {
        if status == EnrollmentStatus::Enrolled && self.state != CourseState::Published {
            return Err(CourseError::NotPublished);
        }
        Ok(())
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for CourseAggregate {
    type Event = CourseEvent;
    type Command = CourseCommand;
    type Error = CourseError;

    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            CourseEvent::Created(e) => Ok(Self {
                id: aggregate_id,
                version: 0,
                name: e.name.clone(),
                description: e.description.clone(),
                price: e.price,
                currency: e.currency.clone(),
                teacher_id: e.teacher_id,
                state: CourseState::Draft,
                enrollments: Vec::new(),
                deleted: false,
                published_at: None,
                archived_at: None,
            }),
            _ => Err(CourseError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            CourseEvent::Created(_) => {
                // First event already applied
            }
            CourseEvent::DetailsUpdated(e) => {
                if let Some(ref name) = e.name {
                    self.name = name.clone();
                }
                if let Some(ref description) = e.description {
                    self.description = description.clone();
                }
            }
            CourseEvent::PriceChanged(e) => {
                self.price = e.new_price;
            }
            CourseEvent::CurrencyChanged(e) => {
                self.currency = e.currency.clone();
            }
            CourseEvent::TeacherChanged(e) => {
                self.teacher_id = e.new_teacher_id;
            }
            CourseEvent::Published(e) => {
                self.state = CourseState::Published;
                self.published_at = Some(e.published_at);
            }
            CourseEvent::Unpublished(_) | CourseEvent::Unarchived(_) => {
                self.state = CourseState::Draft;
            }
            CourseEvent::Archived(e) => {
                self.state = CourseState::Archived;
                self.archived_at = Some(e.archived_at);
            }
            CourseEvent::StudentEnrolled(e) => {
                self.enrollments.push(Enrollment::new(
                    e.enrollment_id,
                    e.student_id,
                    e.enrolled_on,
                    e.status,
                ));
            }
            CourseEvent::StudentUnenrolled(e) => {
                self.enrollments.retain(|enrollment| enrollment.id != e.enrollment_id);
            }
            CourseEvent::EnrollmentStatusChanged(e) => {
                let enrollment = self
                    .enrollments
                    .iter_mut()
                    .find(|enrollment| enrollment.id == e.enrollment_id)
                    .ok_or(CourseError::EnrollmentNotFound(e.enrollment_id))?;
                enrollment.status = e.new_status;
            }
            CourseEvent::Deleted(_) => {
                self.deleted = true;
                self.enrollments.clear();
            }
        }

        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_not_deleted()?;

        match command {
            CourseCommand::CreateCourse { .. } => Err(CourseError::AlreadyExists),

            CourseCommand::UpdateDetails { name, description } => {
                if let Some(name) = name {
                    Self::validate_name(name)?;
                }
                if let Some(description) = description {
                    Self::validate_description(description)?;
                }
                if name.is_none() && description.is_none() {
                    return Ok(vec![]); // No change
                }

                Ok(vec![CourseEvent::DetailsUpdated(CourseDetailsUpdated {
                    name: name.as_ref().map(|n| n.trim().to_string()),
                    description: description.clone(),
                })])
            }

            CourseCommand::SetPrice { price } => {
                let new_price = Price::new(*price)?;
                if new_price == self.price {
                    return Ok(vec![]);
                }

                Ok(vec![CourseEvent::PriceChanged(CoursePriceChanged {
                    old_price: self.price,
                    new_price,
                })])
            }

            CourseCommand::SetCurrency { currency } => {
                let currency = CurrencyCode::parse(currency)?;
                if currency == self.currency {
                    return Ok(vec![]);
                }

                Ok(vec![CourseEvent::CurrencyChanged(CourseCurrencyChanged { currency })])
            }

            CourseCommand::ChangeTeacher { teacher_id } => {
                if self.is_enrolled(*teacher_id) {
                    return Err(CourseError::TeacherIsStudent);
                }
                if *teacher_id == self.teacher_id {
                    return Ok(vec![]);
                }

                Ok(vec![CourseEvent::TeacherChanged(CourseTeacherChanged {
                    old_teacher_id: self.teacher_id,
                    new_teacher_id: *teacher_id,
                })])
            }

            CourseCommand::Publish => {
                Price::validate(self.price.amount())?;

                Ok(vec![CourseEvent::Published(CoursePublished {
                    published_at: Utc::now(),
                })])
            }

            CourseCommand::Unpublish => Ok(vec![CourseEvent::Unpublished(CourseUnpublished {})]),

            CourseCommand::Archive => Ok(vec![CourseEvent::Archived(CourseArchived {
                archived_at: Utc::now(),
            })]),

            CourseCommand::Unarchive => Ok(vec![CourseEvent::Unarchived(CourseUnarchived {})]),

            CourseCommand::Enroll { privilege, enrolled_on } => {
                let student = privilege.acting_user();

                if self.state != CourseState::Published {
                    return Err(CourseError::NotPublished);
                }
                if self.is_taught_by(student) {
                    return Err(CourseError::TeacherCannotEnroll);
                }
                if self.is_enrolled(student) {
                    return Err(CourseError::AlreadyEnrolled);
                }

                Ok(vec![CourseEvent::StudentEnrolled(StudentEnrolled {
                    enrollment_id: Uuid::new_v4(),
                    student_id: student,
                    enrolled_on: *enrolled_on,
                    status: EnrollmentStatus::Enrolled,
                    granted_for: student,
                })])
            }

            CourseCommand::Unenroll { privilege } => {
                let student = privilege.acting_user();
                let enrollment = self.enrollment_of(student).ok_or(CourseError::NotEnrolled)?;

                Ok(vec![CourseEvent::StudentUnenrolled(StudentUnenrolled {
                    enrollment_id: enrollment.id,
                    student_id: student,
                    granted_for: student,
                })])
            }

            CourseCommand::AddEnrollment { privilege, student_id, status, enrolled_on } => {
                if self.is_taught_by(*student_id) {
                    return Err(CourseError::TeacherIsStudent);
                }
                if self.is_enrolled(*student_id) {
                    return Err(CourseError::AlreadyEnrolled);
                }
                self.ensure_accepts_enrolled(*status)?;

                Ok(vec![CourseEvent::StudentEnrolled(StudentEnrolled {
                    enrollment_id: Uuid::new_v4(),
                    student_id: *student_id,
                    enrolled_on: *enrolled_on,
                    status: *status,
                    granted_for: privilege.acting_user(),
                })])
            }

            CourseCommand::SetEnrollmentStatus { enrollment_id, status, .. } => {
                let enrollment = self
                    .enrollment(*enrollment_id)
                    .ok_or(CourseError::EnrollmentNotFound(*enrollment_id))?;
                self.ensure_accepts_enrolled(*status)?;
                if enrollment.status == *status {
                    return Ok(vec![]);
                }

                Ok(vec![CourseEvent::EnrollmentStatusChanged(EnrollmentStatusChanged {
                    enrollment_id: *enrollment_id,
                    old_status: enrollment.status,
                    new_status: *status,
                })])
            }

            CourseCommand::DeleteCourse => Ok(vec![CourseEvent::Deleted(CourseDeleted {
                removed_enrollments: self.enrollments.iter().map(|e| e.id).collect(),
            })]),
        }
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
