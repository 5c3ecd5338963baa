use std::sync::Arc;
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;
use crate::event_sourcing::store::EventStore;
use super::aggregate::CourseAggregate;
use super::events::CourseEvent;

// ============================================================================
// Course Queries - read side over the event store
// ============================================================================
//
// Every query rebuilds courses from their events and scans them. Deleted
// courses never match.
//
// ============================================================================

/// Which courses a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "user_id", rename_all = "snake_case")]
pub enum CourseFilter {
    All,
    TaughtBy(UserId),
    EnrolledBy(UserId),
}

impl CourseFilter {
    pub fn matches(&self, course: &CourseAggregate) -> bool {
        if course.deleted {
            return false;
        }
        match self {
            CourseFilter::All => true,
            CourseFilter::TaughtBy(user) => course.is_taught_by(*user),
            CourseFilter::EnrolledBy(user) => course.is_enrolled(*user),
        }
    }
}

pub struct CourseQueries {
    event_store: Arc<EventStore<CourseEvent>>,
}

impl CourseQueries {
    pub fn new(event_store: Arc<EventStore<CourseEvent>>) -> Self {
        Self { event_store }
    }

    /// Courses matching `filter`, sorted by name
    pub async fn list(&self, filter: CourseFilter) -> Result<Vec<CourseAggregate>> {
        let mut courses: Vec<CourseAggregate> = self
            .event_store
            .load_all::<CourseAggregate>()
            .await?
            .into_iter()
            .filter(|course| filter.matches(course))
            .collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(courses)
    }

    pub async fn count(&self, filter: CourseFilter) -> Result<usize> {
        Ok(self.list(filter).await?.len())
    }

    /// Enrollment records held by `student` across all courses
    pub async fn enrollment_count(&self, student: UserId) -> Result<usize> {
        let courses = self.event_store.load_all::<CourseAggregate>().await?;
        Ok(courses
            .iter()
            .filter(|course| !course.deleted)
            .flat_map(|course| course.enrollments.iter())
            .filter(|enrollment| enrollment.belongs_to(student))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::course::{CourseCommand, CourseCommandHandler};
    use crate::domain::user::RequestContext;
    use crate::metrics::Metrics;
    use crate::domain::course::NewCourse;

    async fn setup() -> (Arc<EventStore<CourseEvent>>, CourseCommandHandler) {
        let store = Arc::new(EventStore::new("Course"));
        let handler = CourseCommandHandler::new(store.clone(), Arc::new(Metrics::new().unwrap()));
        (store, handler)
    }

    #[test]
    fn test_filter_serialization() {
        let user = UserId::new();
        let value = serde_json::to_value(CourseFilter::EnrolledBy(user)).unwrap();
        assert_eq!(value["field"], "enrolled_by");
        assert_eq!(value["user_id"], user.to_string());
    }

    #[tokio::test]
    async fn test_list_by_teacher_and_student() {
        let (store, handler) = setup().await;
        let queries = CourseQueries::new(store);
        let teacher = RequestContext::new(UserId::new());
        let student = RequestContext::new(UserId::new());

        let algebra = handler.create_course(&teacher, NewCourse::new("Algebra", "Numbers", 10.0)).await.unwrap();
        let biology = handler.create_course(&teacher, NewCourse::new("Biology", "Cells", 0.0)).await.unwrap();
        handler.create_course(&student, NewCourse::new("Chess", "Openings", 5.0)).await.unwrap();

        handler.publish(&teacher, algebra).await.unwrap();
        handler.enroll(&student, algebra).await.unwrap();

        let taught = queries.list(CourseFilter::TaughtBy(teacher.user_id())).await.unwrap();
        let names: Vec<&str> = taught.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Algebra", "Biology"]);

        let enrolled = queries.list(CourseFilter::EnrolledBy(student.user_id())).await.unwrap();
        assert_eq!(enrolled.len(), 1);
        assert_eq!(enrolled[0].id, algebra);
        assert_eq!(queries.enrollment_count(student.user_id()).await.unwrap(), 1);

        handler.delete(&teacher, biology).await.unwrap();
        assert_eq!(queries.count(CourseFilter::TaughtBy(teacher.user_id())).await.unwrap(), 1);
        assert_eq!(queries.count(CourseFilter::All).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_deleted_course_drops_enrollments_from_counts() {
        let (store, handler) = setup().await;
        let queries = CourseQueries::new(store);
        let teacher = RequestContext::new(UserId::new());
        let student = RequestContext::new(UserId::new());

        let course = handler.create_course(&teacher, NewCourse::new("Art", "Colour", 1.0)).await.unwrap();
        handler.handle(&teacher, course, CourseCommand::Publish).await.unwrap();
        handler.enroll(&student, course).await.unwrap();
        handler.delete(&teacher, course).await.unwrap();

        assert_eq!(queries.enrollment_count(student.user_id()).await.unwrap(), 0);
    }
}
