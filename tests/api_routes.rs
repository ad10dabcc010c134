//! HTTP 路由测试（tower oneshot，不监听端口）

#![cfg(feature = "web")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::*;
use pae_menus::api::{create_router, AppState};
use pae_menus::config::NutritionSection;
use pae_menus::cycles::MenuCycleService;
use pae_menus::nutrition::NutritionEngine;
use pae_menus::scheduling::SchedulingEngine;
use pae_menus::store::DishCatalog;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn app() -> Router {
    let store = store_with_cycles(&[cycle("weekly", "Weekly-7", 7)]).await;
    for day in 1..=7 {
        store
            .upsert_dish(dish(&format!("dish-{}", day), None, 900.0))
            .await
            .unwrap();
    }
    let clock = clock_on(2024, 1, 1);
    let state = Arc::new(AppState {
        scheduling: Arc::new(SchedulingEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            directory(),
            clock.clone(),
            TIMEOUT,
        )),
        nutrition: Arc::new(NutritionEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
            TIMEOUT,
            NutritionSection::default(),
        )),
        cycles: Arc::new(MenuCycleService::new(store, clock, TIMEOUT)),
    });
    create_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn assignment(campus: &str, start: &str, end: &str) -> Value {
    json!({
        "menu_cycle_id": "weekly",
        "campus_ids": [campus],
        "start_date": start,
        "end_date": end,
    })
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_assign_conflict_and_citizen_menu() {
    let app = app().await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/menu-schedules/assign",
        Some(assignment("C1", "2024-01-01", "2024-01-14")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["duration_days"], 14);
    assert_eq!(created["status"], "active");

    let (status, body) = send(
        &app,
        Method::POST,
        "/menu-schedules/assign",
        Some(assignment("C1", "2024-01-10", "2024-01-12")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("Sede Central"));
    assert_eq!(body["conflicting_locations"], json!(["Sede Central"]));

    let (status, menu) = send(
        &app,
        Method::GET,
        "/menu-schedules/citizen/menu?location_id=C1&location_type=campus&date=2024-01-08",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menu["availability"], "available");
    assert_eq!(menu["cycle_day"], 1);
    assert_eq!(menu["lunch"][0]["id"], "dish-1");

    let (status, menu) = send(
        &app,
        Method::GET,
        "/menu-schedules/citizen/menu?location_id=C2&location_type=campus&date=2024-01-08",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menu["availability"], "unavailable");
    assert_eq!(menu["location_name"], "Sede Norte");
}

#[tokio::test]
async fn test_validation_and_not_found_statuses() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/menu-schedules/assign",
        Some(json!({
            "menu_cycle_id": "weekly",
            "start_date": "2024-01-01",
            "end_date": "2024-01-14",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "At least one campus or town must be selected");

    let (status, body) = send(&app, Method::GET, "/menu-schedules/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Menu schedule with id 'missing' not found");

    let (status, _) = send(&app, Method::GET, "/nutritional-analysis/report/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_uncancel_and_delete_routes() {
    let app = app().await;
    let (_, created) = send(
        &app,
        Method::POST,
        "/menu-schedules/assign",
        Some(assignment("C1", "2024-01-01", "2024-01-14")),
    )
    .await;
    let id = created["schedule_id"].as_str().unwrap().to_string();

    let (status, cancelled) = send(
        &app,
        Method::PATCH,
        &format!("/menu-schedules/{}/cancel?reason=paro", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancellation"]["reason"], "paro");

    let (status, _) = send(&app, Method::PATCH, &format!("/menu-schedules/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, restored) = send(&app, Method::PATCH, &format!("/menu-schedules/{}/uncancel", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restored["status"], "active");

    let (status, list) = send(&app, Method::GET, "/menu-schedules?location_id=C1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, deleted) = send(&app, Method::DELETE, &format!("/menu-schedules/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["coverage_count"], 1);

    let (status, _) = send(&app, Method::GET, &format!("/menu-schedules/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_nutrition_routes() {
    let app = app().await;
    let (_, created) = send(
        &app,
        Method::POST,
        "/menu-schedules/assign",
        Some(assignment("C1", "2024-01-01", "2024-01-07")),
    )
    .await;
    let id = created["schedule_id"].as_str().unwrap().to_string();

    let (status, summary) = send(&app, Method::GET, &format!("/nutritional-analysis/summary/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_person_days"], 7);
    assert_eq!(summary["avg_daily_calories"], 900.0);

    let (status, cmp) = send(
        &app,
        Method::GET,
        &format!("/nutritional-analysis/comparison/{}?age_group=school_age_13_18", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cmp["age_group"], "school_age_13_18");

    for path in ["report", "food-groups", "nutrients"] {
        let (status, _) = send(&app, Method::GET, &format!("/nutritional-analysis/{}/{}", path, id), None).await;
        assert_eq!(status, StatusCode::OK, "route {}", path);
    }
}

#[tokio::test]
async fn test_menu_cycle_routes() {
    let app = app().await;
    let (status, created) = send(
        &app,
        Method::POST,
        "/menu-cycles",
        Some(json!({
            "name": "  Ciclo Corto  ",
            "duration_days": 1,
            "daily_menus": [{ "day": 1, "lunch_dish_ids": ["dish-1"] }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Ciclo Corto");

    let (status, body) = send(
        &app,
        Method::POST,
        "/menu-cycles",
        Some(json!({ "name": "Roto", "duration_days": 2, "daily_menus": [{ "day": 1, "lunch_dish_ids": ["dish-1"] }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Day 2 has no menu defined");

    let (status, list) = send(&app, Method::GET, "/menu-cycles?status=active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = send(&app, Method::GET, &format!("/menu-cycles/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["duration_days"], 1);
}
