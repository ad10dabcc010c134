//! /menu-schedules 路由

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::AppState;
use crate::core::MenuError;
use crate::model::{LocationKind, MenuSchedule};
use crate::scheduling::{
    AssignRequest, AssignmentSummary, DeletedSchedule, MenuLookup, ScheduleDetailed, UpdateRequest,
};
use crate::store::ScheduleFilter;

#[derive(Debug, Deserialize)]
pub struct ReasonQuery {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CitizenMenuQuery {
    pub location_id: String,
    pub location_type: LocationKind,
    pub date: NaiveDate,
}

/// POST /menu-schedules/assign
pub async fn assign(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AssignRequest>,
) -> Result<(StatusCode, Json<AssignmentSummary>), MenuError> {
    let summary = state.scheduling.assign(req).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /menu-schedules
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ScheduleFilter>,
) -> Result<Json<Vec<MenuSchedule>>, MenuError> {
    Ok(Json(state.scheduling.list(&filter).await?))
}

/// GET /menu-schedules/:id
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MenuSchedule>, MenuError> {
    Ok(Json(state.scheduling.get(&id).await?))
}

/// GET /menu-schedules/:id/detailed
pub async fn detailed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ScheduleDetailed>, MenuError> {
    Ok(Json(state.scheduling.detailed(&id).await?))
}

/// PATCH /menu-schedules/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<MenuSchedule>, MenuError> {
    Ok(Json(state.scheduling.update(&id, req).await?))
}

/// PATCH /menu-schedules/:id/cancel?reason=
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<ReasonQuery>,
) -> Result<Json<MenuSchedule>, MenuError> {
    Ok(Json(state.scheduling.cancel(&id, q.reason).await?))
}

/// PATCH /menu-schedules/:id/uncancel?reason=
pub async fn uncancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<ReasonQuery>,
) -> Result<Json<MenuSchedule>, MenuError> {
    Ok(Json(state.scheduling.uncancel(&id, q.reason).await?))
}

/// DELETE /menu-schedules/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedSchedule>, MenuError> {
    Ok(Json(state.scheduling.delete(&id).await?))
}

/// GET /menu-schedules/citizen/menu?location_id&location_type&date
pub async fn citizen_menu(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CitizenMenuQuery>,
) -> Result<Json<MenuLookup>, MenuError> {
    let lookup = state
        .scheduling
        .resolve_effective_menu(&q.location_id, q.location_type, q.date)
        .await?;
    Ok(Json(lookup))
}
