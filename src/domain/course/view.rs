use serde::Serialize;
use uuid::Uuid;

use crate::domain::user::UserId;
use super::aggregate::CourseAggregate;
use super::value_objects::CourseState;

// ============================================================================
// Course View - read projection for one viewing user
// ============================================================================
//
// `is_enrolled` and `can_enroll` are plain fields. They depend on the
// course state, teacher and enrollment students, and on the viewer; call
// `refresh` after any of those change.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseView {
    pub course_id: Uuid,
    pub viewer: UserId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    pub teacher_id: UserId,
    pub state: CourseState,
    pub enrollment_count: usize,
    pub is_enrolled: bool,
    pub can_enroll: bool,
}

impl CourseView {
    pub fn for_viewer(course: &CourseAggregate, viewer: UserId) -> Self {
        let mut view = Self {
            course_id: course.id,
            viewer,
            name: String::new(),
            description: String::new(),
            price: 0.0,
            currency: String::new(),
            teacher_id: course.teacher_id,
            state: course.state,
            enrollment_count: 0,
            is_enrolled: false,
            can_enroll: false,
        };
        view.refresh(course);
        view
    }

    /// Recompute every field from the current course
    pub fn refresh(&mut self, course: &CourseAggregate) {
        self.course_id = course.id;
        self.name = course.name.clone();
        self.description = course.description.clone();
        self.price = course.price.amount();
        self.currency = course.currency.to_string();
        self.teacher_id = course.teacher_id;
        self.state = course.state;
        self.enrollment_count = course.enrollments.len();
        self.is_enrolled = course.is_enrolled(self.viewer);
        self.can_enroll = course.can_enroll(self.viewer);
    }
}
