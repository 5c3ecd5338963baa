use std::sync::Arc;
use anyhow::Result;
use serde::Serialize;

use crate::actions::ClientAction;
use crate::domain::course::{CourseAggregate, CourseEvent, CourseFilter, CourseQueries};
use crate::event_sourcing::store::EventStore;
use super::value_objects::UserId;

// ============================================================================
// User Course Statistics
// ============================================================================
//
// Counts are recomputed from the course streams on every call.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UserCourseStats {
    /// Enrollment records where the user is the student
    pub enrolled_course_count: usize,
    /// Courses where the user is the teacher
    pub taught_course_count: usize,
}

pub struct UserCourses {
    queries: CourseQueries,
}

impl UserCourses {
    pub fn new(event_store: Arc<EventStore<CourseEvent>>) -> Self {
        Self {
            queries: CourseQueries::new(event_store),
        }
    }

    pub async fn user_stats(&self, user: UserId) -> Result<UserCourseStats> {
        let stats = UserCourseStats {
            enrolled_course_count: self.queries.enrollment_count(user).await?,
            taught_course_count: self.queries.count(CourseFilter::TaughtBy(user)).await?,
        };
        tracing::debug!(
            user_id = %user,
            enrolled = stats.enrolled_course_count,
            taught = stats.taught_course_count,
            "Computed user course stats"
        );
        Ok(stats)
    }

    pub async fn list_courses(&self, filter: CourseFilter) -> Result<Vec<CourseAggregate>> {
        self.queries.list(filter).await
    }

    pub fn view_taught_courses(&self, user: UserId) -> ClientAction {
        ClientAction::course_list(CourseFilter::TaughtBy(user))
    }

    pub fn view_enrolled_courses(&self, user: UserId) -> ClientAction {
        ClientAction::course_list(CourseFilter::EnrolledBy(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::course::{CourseCommandHandler, NewCourse};
    use crate::domain::user::RequestContext;
    use crate::metrics::Metrics;

    #[tokio::test]
    async fn test_stats_follow_enrollments_and_teaching() {
        let store = Arc::new(EventStore::new("Course"));
        let handler = CourseCommandHandler::new(store.clone(), Arc::new(Metrics::new().unwrap()));
        let users = UserCourses::new(store);

        let teacher = RequestContext::new(UserId::new());
        let student = RequestContext::new(UserId::new());
        assert_eq!(users.user_stats(student.user_id()).await.unwrap(), UserCourseStats::default());

        let rust = handler.create_course(&teacher, NewCourse::new("Rust", "Ownership", 20.0)).await.unwrap();
        let go = handler.create_course(&teacher, NewCourse::new("Go", "Channels", 0.0)).await.unwrap();
        handler.publish(&teacher, rust).await.unwrap();
        handler.publish(&teacher, go).await.unwrap();
        handler.enroll(&student, rust).await.unwrap();
        handler.enroll(&student, go).await.unwrap();

        let teacher_stats = users.user_stats(teacher.user_id()).await.unwrap();
        assert_eq!(teacher_stats.taught_course_count, 2);
        assert_eq!(teacher_stats.enrolled_course_count, 0);

        let student_stats = users.user_stats(student.user_id()).await.unwrap();
        assert_eq!(student_stats.enrolled_course_count, 2);
        assert_eq!(student_stats.taught_course_count, 0);

        handler.unenroll(&student, go).await.unwrap();
        let names: Vec<String> = users
            .list_courses(CourseFilter::EnrolledBy(student.user_id()))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Rust".to_string()]);

        handler.delete(&teacher, rust).await.unwrap();
        let student_stats = users.user_stats(student.user_id()).await.unwrap();
        assert_eq!(student_stats.enrolled_course_count, 0);
        assert_eq!(users.user_stats(teacher.user_id()).await.unwrap().taught_course_count, 1);
    }

    #[test]
    fn test_view_actions_filter_by_user() {
        let users = UserCourses::new(Arc::new(EventStore::new("Course")));
        let user = UserId::new();

        let json = serde_json::to_value(users.view_enrolled_courses(user)).unwrap();
        assert_eq!(json["type"], "ir.actions.act_window");
        assert_eq!(json["name"], "Courses");
        assert_eq!(json["res_model"], "online_course.course");
        assert_eq!(json["domain"]["field"], "enrolled_by");
        assert_eq!(json["domain"]["user_id"], user.to_string());
        assert_eq!(json["context"]["create"], false);

        match users.view_taught_courses(user) {
            ClientAction::Window(window) => assert_eq!(window.domain, CourseFilter::TaughtBy(user)),
            other => panic!("expected a window action, got {:?}", other),
        }
    }
}
