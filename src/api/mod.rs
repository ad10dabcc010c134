//! HTTP 接口（axum）
//!
//! 需要 `web` feature。路由只做参数提取与响应封装，业务逻辑都在引擎中。

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::cycles::MenuCycleService;
use crate::nutrition::NutritionEngine;
use crate::scheduling::SchedulingEngine;

pub mod cycles;
pub mod error;
pub mod nutrition;
pub mod schedules;

/// 路由共享状态
pub struct AppState {
    pub scheduling: Arc<SchedulingEngine>,
    pub nutrition: Arc<NutritionEngine>,
    pub cycles: Arc<MenuCycleService>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/menu-schedules", get(schedules::list))
        .route("/menu-schedules/assign", post(schedules::assign))
        .route("/menu-schedules/citizen/menu", get(schedules::citizen_menu))
        .route(
            "/menu-schedules/:id",
            get(schedules::get_one)
                .patch(schedules::update)
                .delete(schedules::delete),
        )
        .route("/menu-schedules/:id/detailed", get(schedules::detailed))
        .route("/menu-schedules/:id/cancel", patch(schedules::cancel))
        .route("/menu-schedules/:id/uncancel", patch(schedules::uncancel))
        .route("/nutritional-analysis/report/:id", get(nutrition::report))
        .route("/nutritional-analysis/summary/:id", get(nutrition::summary))
        .route("/nutritional-analysis/comparison/:id", get(nutrition::comparison))
        .route("/nutritional-analysis/food-groups/:id", get(nutrition::food_groups))
        .route("/nutritional-analysis/nutrients/:id", get(nutrition::nutrients))
        .route("/menu-cycles", get(cycles::list).post(cycles::create))
        .route("/menu-cycles/:id", get(cycles::get_one))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}
