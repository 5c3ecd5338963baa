use std::sync::Arc;
use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use online_course::config::AppConfig;
use online_course::domain::course::{CourseCommandHandler, CourseEvent, NewCourse};
use online_course::domain::user::{RequestContext, UserCourses, UserId};
use online_course::event_sourcing::store::EventStore;
use online_course::metrics::{self, Metrics};
use online_course::utils::RetryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    // RUST_LOG wins over the configured filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
        )
        .init();

    tracing::info!(
        default_currency = %config.default_currency,
        metrics_port = ?config.metrics_port,
        "Starting online course demo"
    );

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);

    if let Some(port) = config.metrics_port {
        let registry = Arc::new(metrics.registry().clone());
        std::thread::spawn(move || {
            let system = actix_web::rt::System::new();
            if let Err(e) = system.block_on(metrics::start_metrics_server(registry, port)) {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    }

    // === 2. Event store and handlers ===
    let store = Arc::new(EventStore::<CourseEvent>::new("Course"));
    let handler = CourseCommandHandler::new(store.clone(), metrics.clone())
        .with_retry(RetryConfig::from(&config.retry))
        .with_default_currency(config.default_currency.clone());
    let users = UserCourses::new(store.clone());

    let teacher = RequestContext::new(UserId::new());
    let student = RequestContext::new(UserId::new());

    // === 3. Course lifecycle ===
    let course_id = handler
        .create_course(
            &teacher,
            NewCourse::new("Rust Fundamentals", "Ownership, borrowing and traits", 100.0),
        )
        .await?;
    tracing::info!(course_id = %course_id, "Course created as draft");

    if let Err(e) = handler.enroll(&student, course_id).await {
        tracing::info!(course_id = %course_id, "Enrollment refused: {}", e);
    }

    let state = handler.publish(&teacher, course_id).await?;
    tracing::info!(course_id = %course_id, state = %state, "Course published");

    let action = handler.enroll(&student, course_id).await?;
    tracing::info!(action = %serde_json::to_string(&action)?, "Enroll action result");

    if let Err(e) = handler.enroll(&student, course_id).await {
        tracing::info!(course_id = %course_id, "Second enrollment refused: {}", e);
    }

    let view = handler.view(&student, course_id).await?;
    tracing::info!(
        is_enrolled = view.is_enrolled,
        can_enroll = view.can_enroll,
        enrollment_count = view.enrollment_count,
        "Student view"
    );

    let stats = users.user_stats(student.user_id()).await?;
    tracing::info!(
        enrolled = stats.enrolled_course_count,
        taught = stats.taught_course_count,
        "Student stats"
    );
    let list = users.view_enrolled_courses(student.user_id());
    tracing::info!(action = %serde_json::to_string(&list)?, "Enrolled courses action");

    handler.unenroll(&student, course_id).await?;
    let state = handler.archive(&teacher, course_id).await?;
    tracing::info!(course_id = %course_id, state = %state, "Course archived");

    let version = store.get_current_version(course_id).await?;
    tracing::info!(course_id = %course_id, version = version, "Demo complete");

    // Keep serving /metrics and /health until interrupted
    if let Some(port) = config.metrics_port {
        tracing::info!(port = port, "Metrics server running, press Ctrl+C to exit");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        tracing::info!("Shutting down");
    }

    Ok(())
}
