//! HTTP handlers for the REST API.
//!
//! Each handler decodes its input, delegates to the scheduling engine and
//! maps the outcome to a response. No scheduling rule lives here.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    AssignLabGroupsRequest, AssignOutcome, AssignSlotRequest, AssignSpanRequest, Availability,
    AvailabilityQuery, ClearOutcome, ElectiveOutcome, ElectiveRequest, HealthResponse,
    LabGroupsOutcome, RoutineQuery, RoutineResponse, SlotKeyQuery, SpanOutcome,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{ElectiveGroupId, ProgramId, RoomId, Section, SpanId, TeacherId};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create resources.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
        notifications: state.engine.notifier().stats(),
    }))
}

// =============================================================================
// Assignment
// =============================================================================

/// POST /v1/slots
///
/// Responds 201 when a record was created and 200 when one was updated.
pub async fn assign_slot(
    State(state): State<AppState>,
    Json(request): Json<AssignSlotRequest>,
) -> CreatedResult<AssignOutcome> {
    let outcome = state.engine.assign_slot(request).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

/// DELETE /v1/slots?program=..&semester=..&section=..&day=..&slot=..
pub async fn clear_slot(
    State(state): State<AppState>,
    Query(query): Query<SlotKeyQuery>,
) -> HandlerResult<ClearOutcome> {
    Ok(Json(state.engine.clear_slot(query).await?))
}

/// POST /v1/spans
pub async fn assign_span(
    State(state): State<AppState>,
    Json(request): Json<AssignSpanRequest>,
) -> CreatedResult<SpanOutcome> {
    let outcome = state.engine.assign_spanned(request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// DELETE /v1/spans/{span_id}
pub async fn clear_span(
    State(state): State<AppState>,
    Path(span_id): Path<String>,
) -> HandlerResult<ClearOutcome> {
    let span_id: SpanId = span_id
        .parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid span id: {}", e)))?;
    Ok(Json(state.engine.clear_span(span_id).await?))
}

/// POST /v1/lab-groups
pub async fn assign_lab_groups(
    State(state): State<AppState>,
    Json(request): Json<AssignLabGroupsRequest>,
) -> CreatedResult<LabGroupsOutcome> {
    let outcome = state.engine.assign_both_lab_groups(request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

// =============================================================================
// Electives
// =============================================================================

fn parse_group_id(raw: &str) -> Result<ElectiveGroupId, AppError> {
    raw.parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid elective group id: {}", e)))
}

/// POST /v1/electives
pub async fn schedule_elective(
    State(state): State<AppState>,
    Json(request): Json<ElectiveRequest>,
) -> CreatedResult<ElectiveOutcome> {
    let outcome = state.engine.schedule_elective(request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PUT /v1/electives/{group_id}
pub async fn update_elective(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(request): Json<ElectiveRequest>,
) -> HandlerResult<ElectiveOutcome> {
    let group_id = parse_group_id(&group_id)?;
    Ok(Json(state.engine.update_elective(group_id, request).await?))
}

/// DELETE /v1/electives/{group_id}
pub async fn clear_elective(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> HandlerResult<ClearOutcome> {
    let group_id = parse_group_id(&group_id)?;
    Ok(Json(state.engine.clear_elective(group_id).await?))
}

// =============================================================================
// Availability
// =============================================================================

/// GET /v1/availability/teachers/{teacher_id}?day=..&slot=..&semester=..
pub async fn teacher_availability(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> HandlerResult<Availability> {
    let availability = state
        .engine
        .check_teacher_availability(
            TeacherId::new(teacher_id),
            query.day,
            query.slot,
            query.semester,
        )
        .await?;
    Ok(Json(availability))
}

/// GET /v1/availability/rooms/{room_id}?day=..&slot=..&semester=..
pub async fn room_availability(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> HandlerResult<Availability> {
    let availability = state
        .engine
        .check_room_availability(RoomId::new(room_id), query.day, query.slot, query.semester)
        .await?;
    Ok(Json(availability))
}

// =============================================================================
// Routines
// =============================================================================

fn parse_section(raw: &str) -> Result<Section, AppError> {
    raw.parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid section: {}", e)))
}

/// GET /v1/routines/{program}/{semester}/{section}
pub async fn section_routine(
    State(state): State<AppState>,
    Path((program, semester, section)): Path<(i64, u8, String)>,
    Query(query): Query<RoutineQuery>,
) -> HandlerResult<RoutineResponse> {
    let section = parse_section(&section)?;
    let entries = state
        .engine
        .section_routine(ProgramId::new(program), semester, section, query.academic_year)
        .await?;
    Ok(Json(entries.into()))
}

/// DELETE /v1/routines/{program}/{semester}/{section}
pub async fn clear_section(
    State(state): State<AppState>,
    Path((program, semester, section)): Path<(i64, u8, String)>,
    Query(query): Query<RoutineQuery>,
) -> HandlerResult<ClearOutcome> {
    let section = parse_section(&section)?;
    let outcome = state
        .engine
        .clear_section(ProgramId::new(program), semester, section, query.academic_year)
        .await?;
    Ok(Json(outcome))
}

/// GET /v1/teachers/{teacher_id}/schedule
pub async fn teacher_schedule(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> HandlerResult<RoutineResponse> {
    let entries = state
        .engine
        .teacher_schedule(TeacherId::new(teacher_id))
        .await?;
    Ok(Json(entries.into()))
}
