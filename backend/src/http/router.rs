//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Assignment
        .route(
            "/slots",
            post(handlers::assign_slot).delete(handlers::clear_slot),
        )
        .route("/spans", post(handlers::assign_span))
        .route("/spans/{span_id}", delete(handlers::clear_span))
        .route("/lab-groups", post(handlers::assign_lab_groups))
        // Electives
        .route("/electives", post(handlers::schedule_elective))
        .route(
            "/electives/{group_id}",
            put(handlers::update_elective).delete(handlers::clear_elective),
        )
        // Queries
        .route(
            "/availability/teachers/{teacher_id}",
            get(handlers::teacher_availability),
        )
        .route(
            "/availability/rooms/{room_id}",
            get(handlers::room_availability),
        )
        .route(
            "/routines/{program}/{semester}/{section}",
            get(handlers::section_routine).delete(handlers::clear_section),
        )
        .route(
            "/teachers/{teacher_id}/schedule",
            get(handlers::teacher_schedule),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
