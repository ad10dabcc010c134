//! /menu-cycles 路由

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::core::MenuError;
use crate::model::{CycleStatus, MenuCycle, NewMenuCycle};

#[derive(Debug, Deserialize)]
pub struct CycleListQuery {
    #[serde(default)]
    pub status: Option<CycleStatus>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<NewMenuCycle>,
) -> Result<(StatusCode, Json<MenuCycle>), MenuError> {
    let cycle = state.cycles.create(draft).await?;
    Ok((StatusCode::CREATED, Json(cycle)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CycleListQuery>,
) -> Result<Json<Vec<MenuCycle>>, MenuError> {
    Ok(Json(state.cycles.list(q.status, q.skip, q.limit).await?))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MenuCycle>, MenuError> {
    Ok(Json(state.cycles.get(&id).await?))
}
