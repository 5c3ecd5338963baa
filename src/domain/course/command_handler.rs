use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::actions::ClientAction;
use crate::domain::user::{PrivilegedContext, RequestContext, UserId};
use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};
use crate::event_sourcing::store::{ConcurrencyConflict, EventStore};
use crate::metrics::Metrics;
use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

use super::aggregate::CourseAggregate;
use super::commands::CourseCommand;
use super::enrollment::EnrollmentStatus;
use super::errors::CourseError;
use super::events::CourseEvent;
use super::value_objects::CourseState;
use super::view::CourseView;

// ============================================================================
// Course Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Event Store
//
// A command either appends all of its events or none. Commands on one course
// run one at a time within a handler (load, decide and append under a
// per-course lock). A lost version race against another writer of the same
// store is retried against the reloaded course, so the decision is always
// made on current state.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CourseServiceError {
    #[error(transparent)]
    Domain(#[from] CourseError),

    #[error("Course not found: {0}")]
    NotFound(Uuid),

    #[error("You are not allowed to modify enrollments directly")]
    AccessDenied,

    #[error(transparent)]
    Conflict(#[from] ConcurrencyConflict),

    #[error("Event store failure: {0:#}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for CourseServiceError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<ConcurrencyConflict>() {
            Ok(conflict) => CourseServiceError::Conflict(conflict),
            Err(other) => CourseServiceError::Store(other),
        }
    }
}

impl IsTransient for CourseServiceError {
    fn is_transient(&self) -> bool {
        matches!(self, CourseServiceError::Conflict(_))
    }
}

impl CourseServiceError {
    /// Stable label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            CourseServiceError::Domain(e) => e.code(),
            CourseServiceError::NotFound(_) => "not_found",
            CourseServiceError::AccessDenied => "access_denied",
            CourseServiceError::Conflict(_) => "conflict",
            CourseServiceError::Store(_) => "store",
        }
    }
}

/// Input for a new course
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub name: String,
    pub description: String,
    pub price: f64,
    /// Falls back to the handler's default currency
    pub currency: Option<String>,
    /// Falls back to the requesting user
    pub teacher_id: Option<UserId>,
}

impl NewCourse {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
            currency: None,
            teacher_id: None,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_teacher(mut self, teacher_id: UserId) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }
}

pub struct CourseCommandHandler {
    event_store: Arc<EventStore<CourseEvent>>,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
    default_currency: String,
    course_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl CourseCommandHandler {
    pub fn new(event_store: Arc<EventStore<CourseEvent>>, metrics: Arc<Metrics>) -> Self {
        Self {
            event_store,
            metrics,
            retry: RetryConfig::default(),
            default_currency: "EUR".to_string(),
            course_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = currency.into();
        self
    }

    /// Handle a command and persist resulting events.
    /// Returns the course as it stands after the command.
    pub async fn handle(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        command: CourseCommand,
    ) -> Result<CourseAggregate, CourseServiceError> {
        self.execute(ctx, course_id, None, command).await
    }

    /// Handle a command against a course the caller already loaded.
    /// If the course moved on since, the command is decided again on the
    /// current state.
    pub async fn handle_loaded(
        &self,
        ctx: &RequestContext,
        course: CourseAggregate,
        command: CourseCommand,
    ) -> Result<CourseAggregate, CourseServiceError> {
        self.execute(ctx, course.id, Some(course), command).await
    }

    async fn course_lock(&self, course_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.course_locks.lock().await;
        locks.entry(course_id).or_default().clone()
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        snapshot: Option<CourseAggregate>,
        command: CourseCommand,
    ) -> Result<CourseAggregate, CourseServiceError> {
        let command_name = command.name();
        let started = Instant::now();
        let command = &command;
        let mut snapshot = snapshot;

        let lock = self.course_lock(course_id).await;
        let _guard = lock.lock().await;

        let result = retry_on_transient(self.retry.clone(), move |attempt| {
            if attempt > 1 {
                self.metrics.record_retry(command_name);
            }
            // Only the first attempt may use the caller's copy
            self.handle_once(ctx, course_id, snapshot.take(), command.clone())
        })
        .await
        .into_result();

        let rejection = result.as_ref().err().map(CourseServiceError::reason);
        self.metrics
            .record_command(command_name, started.elapsed().as_secs_f64(), rejection);

        if let Err(ref error) = result {
            tracing::debug!(
                course_id = %course_id,
                user_id = %ctx.user_id(),
                command = command_name,
                error = %error,
                "Course command rejected"
            );
        }

        result
    }

    async fn handle_once(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        snapshot: Option<CourseAggregate>,
        command: CourseCommand,
    ) -> Result<CourseAggregate, CourseServiceError> {
        // Load current aggregate state unless the caller supplied it
        let course = match snapshot {
            Some(course) => Some(course),
            None if self.event_store.aggregate_exists(course_id).await? => {
                let course = self.event_store.load_aggregate::<CourseAggregate>(course_id).await?;
                tracing::debug!(course_id = %course_id, version = course.version(), "Loaded course");
                Some(course)
            }
            None => None,
        };

        let domain_events = match (&course, &command) {
            (Some(course), _) => course.handle_command(&command)?,
            (None, CourseCommand::CreateCourse { .. }) => CourseAggregate::decide_create(&command)?,
            (None, _) => return Err(CourseServiceError::NotFound(course_id)),
        };

        let expected_version = course.as_ref().map(|c| c.version()).unwrap_or(0);

        if domain_events.is_empty() {
            // Nothing changed; `course` is always loaded on this path
            return course.ok_or(CourseServiceError::NotFound(course_id));
        }

        // Wrap in envelopes
        let correlation_id = Uuid::new_v4();
        let envelopes: Vec<EventEnvelope<CourseEvent>> = domain_events
            .iter()
            .cloned()
            .zip(expected_version + 1..)
            .map(|(event, seq)| {
                EventEnvelope::new(
                    course_id,
                    seq,
                    event.variant_name().to_string(),
                    event,
                    correlation_id,
                )
                .with_user(ctx.user_id().as_uuid())
                .with_metadata("command", command.name())
            })
            .collect();

        let new_version = self
            .event_store
            .append_events(course_id, expected_version, envelopes)
            .await?;

        let mut course = match course {
            Some(mut course) => {
                course.apply_all(&domain_events)?;
                course
            }
            None => {
                let (first, rest) = domain_events.split_first().ok_or(CourseError::NotInitialized)?;
                let mut course = CourseAggregate::apply_first_event(course_id, first)?;
                course.apply_all(rest)?;
                course
            }
        };
        course.set_version(new_version);

        self.observe(&course, &domain_events);
        Ok(course)
    }

    /// Log the applied events and update enrollment counters
    fn observe(&self, course: &CourseAggregate, events: &[CourseEvent]) {
        let mut created = 0;
        let mut removed = 0;

        for event in events {
            match event {
                CourseEvent::StudentEnrolled(e) => {
                    created += 1;
                    tracing::info!(
                        course_id = %course.id,
                        student_id = %e.student_id,
                        enrollment_id = %e.enrollment_id,
                        status = e.status.as_str(),
                        "Student enrolled"
                    );
                }
                CourseEvent::StudentUnenrolled(e) => {
                    removed += 1;
                    tracing::info!(
                        course_id = %course.id,
                        student_id = %e.student_id,
                        enrollment_id = %e.enrollment_id,
                        "Student unenrolled"
                    );
                }
                CourseEvent::Deleted(e) => {
                    removed += e.removed_enrollments.len();
                    tracing::info!(
                        course_id = %course.id,
                        removed_enrollments = e.removed_enrollments.len(),
                        "Course deleted"
                    );
                }
                other => {
                    tracing::info!(
                        course_id = %course.id,
                        event = other.variant_name(),
                        state = %course.state,
                        "Course updated"
                    );
                }
            }
        }

        self.metrics.record_enrollments(created, removed);
    }

    fn require_manager(ctx: &RequestContext) -> Result<PrivilegedContext, CourseServiceError> {
        if !ctx.is_manager() {
            return Err(CourseServiceError::AccessDenied);
        }
        Ok(ctx.sudo())
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    pub async fn create_course(
        &self,
        ctx: &RequestContext,
        course: NewCourse,
    ) -> Result<Uuid, CourseServiceError> {
        let course_id = Uuid::new_v4();
        let command = CourseCommand::CreateCourse {
            name: course.name,
            description: course.description,
            price: course.price,
            currency: course.currency.unwrap_or_else(|| self.default_currency.clone()),
            teacher_id: course.teacher_id.unwrap_or_else(|| ctx.user_id()),
        };

        self.handle(ctx, course_id, command).await?;
        Ok(course_id)
    }

    /// Enroll the requesting user
    pub async fn enroll(&self, ctx: &RequestContext, course_id: Uuid) -> Result<ClientAction, CourseServiceError> {
        let command = CourseCommand::Enroll {
            privilege: ctx.sudo(),
            enrolled_on: Utc::now().date_naive(),
        };
        let course = self.handle(ctx, course_id, command).await?;

        Ok(ClientAction::success_notification(
            "Enrollment Successful",
            format!("You have been enrolled in {} course", course.name),
        ))
    }

    /// Remove the requesting user's enrollment
    pub async fn unenroll(&self, ctx: &RequestContext, course_id: Uuid) -> Result<ClientAction, CourseServiceError> {
        let command = CourseCommand::Unenroll { privilege: ctx.sudo() };
        let course = self.handle(ctx, course_id, command).await?;

        Ok(ClientAction::success_notification(
            "Unenrollment Successful",
            format!("You have been unenrolled from {} course", course.name),
        ))
    }

    pub async fn publish(&self, ctx: &RequestContext, course_id: Uuid) -> Result<CourseState, CourseServiceError> {
        Ok(self.handle(ctx, course_id, CourseCommand::Publish).await?.state)
    }

    pub async fn unpublish(&self, ctx: &RequestContext, course_id: Uuid) -> Result<CourseState, CourseServiceError> {
        Ok(self.handle(ctx, course_id, CourseCommand::Unpublish).await?.state)
    }

    pub async fn archive(&self, ctx: &RequestContext, course_id: Uuid) -> Result<CourseState, CourseServiceError> {
        Ok(self.handle(ctx, course_id, CourseCommand::Archive).await?.state)
    }

    pub async fn unarchive(&self, ctx: &RequestContext, course_id: Uuid) -> Result<CourseState, CourseServiceError> {
        Ok(self.handle(ctx, course_id, CourseCommand::Unarchive).await?.state)
    }

    pub async fn update_details(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<CourseAggregate, CourseServiceError> {
        self.handle(ctx, course_id, CourseCommand::UpdateDetails { name, description }).await
    }

    pub async fn set_price(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        price: f64,
    ) -> Result<CourseAggregate, CourseServiceError> {
        self.handle(ctx, course_id, CourseCommand::SetPrice { price }).await
    }

    pub async fn set_currency(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        currency: impl Into<String>,
    ) -> Result<CourseAggregate, CourseServiceError> {
        let currency = currency.into();
        self.handle(ctx, course_id, CourseCommand::SetCurrency { currency }).await
    }

    pub async fn change_teacher(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        teacher_id: UserId,
    ) -> Result<CourseAggregate, CourseServiceError> {
        self.handle(ctx, course_id, CourseCommand::ChangeTeacher { teacher_id }).await
    }

    /// Delete the course together with its enrollments
    pub async fn delete(&self, ctx: &RequestContext, course_id: Uuid) -> Result<(), CourseServiceError> {
        self.handle(ctx, course_id, CourseCommand::DeleteCourse).await?;
        Ok(())
    }

    /// Direct enrollment write, managers only. Returns the new enrollment id.
    pub async fn add_enrollment(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        student_id: UserId,
        status: EnrollmentStatus,
    ) -> Result<Uuid, CourseServiceError> {
        let privilege = Self::require_manager(ctx)?;
        let command = CourseCommand::AddEnrollment {
            privilege,
            student_id,
            status,
            enrolled_on: Utc::now().date_naive(),
        };

        let course = self.handle(ctx, course_id, command).await?;
        course
            .enrollment_of(student_id)
            .map(|e| e.id)
            .ok_or(CourseServiceError::Domain(CourseError::NotEnrolled))
    }

    /// Direct status write, managers only
    pub async fn set_enrollment_status(
        &self,
        ctx: &RequestContext,
        course_id: Uuid,
        enrollment_id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<(), CourseServiceError> {
        let privilege = Self::require_manager(ctx)?;
        let command = CourseCommand::SetEnrollmentStatus { privilege, enrollment_id, status };
        self.handle(ctx, course_id, command).await?;
        Ok(())
    }

    pub async fn load(&self, course_id: Uuid) -> Result<CourseAggregate, CourseServiceError> {
        if !self.event_store.aggregate_exists(course_id).await? {
            return Err(CourseServiceError::NotFound(course_id));
        }
        Ok(self.event_store.load_aggregate::<CourseAggregate>(course_id).await?)
    }

    /// The course as seen by the requesting user
    pub async fn view(&self, ctx: &RequestContext, course_id: Uuid) -> Result<CourseView, CourseServiceError> {
        let course = self.load(course_id).await?;
        if course.deleted {
            return Err(CourseError::Deleted.into());
        }
        Ok(CourseView::for_viewer(&course, ctx.user_id()))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
