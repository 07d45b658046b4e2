mod attendance;
pub mod error;
mod students;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

/// Student routes, relative to wherever they are mounted
fn student_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(students::list_students).post(students::create_student),
        )
        .route("/login", post(students::login))
        .route(
            "/:id",
            get(students::get_student)
                .patch(students::update_student)
                .delete(students::delete_student),
        )
}

fn attendance_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(attendance::list_attendance).post(attendance::create_attendance),
        )
        .route(
            "/student/:student_id",
            get(attendance::student_attendance),
        )
        .route(
            "/:id",
            get(attendance::get_attendance)
                .put(attendance::update_attendance)
                .delete(attendance::delete_attendance),
        )
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Students answer both at the root and under /student
    Router::new()
        .route("/health", get(health_check))
        .nest("/attendance", attendance_routes())
        .nest("/student", student_routes())
        .merge(student_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
