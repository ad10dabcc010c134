//! /nutritional-analysis 路由

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::core::MenuError;
use crate::nutrition::{
    ComparisonReport, FoodGroupAnalysis, NutrientAnalysis, NutritionalAnalysisReport, SimplifiedSummary,
};

#[derive(Debug, Deserialize)]
pub struct AgeGroupQuery {
    #[serde(default)]
    pub age_group: Option<String>,
}

pub async fn report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NutritionalAnalysisReport>, MenuError> {
    Ok(Json(state.nutrition.analyze(&id).await?))
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SimplifiedSummary>, MenuError> {
    Ok(Json(state.nutrition.simplified_summary(&id).await?))
}

pub async fn comparison(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<AgeGroupQuery>,
) -> Result<Json<ComparisonReport>, MenuError> {
    let report = state
        .nutrition
        .compare_with_requirements(&id, q.age_group.as_deref())
        .await?;
    Ok(Json(report))
}

pub async fn food_groups(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FoodGroupAnalysis>, MenuError> {
    Ok(Json(state.nutrition.food_group_analysis(&id).await?))
}

pub async fn nutrients(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NutrientAnalysis>, MenuError> {
    Ok(Json(state.nutrition.nutrient_analysis(&id).await?))
}
