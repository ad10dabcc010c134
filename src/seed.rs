//! 启动时导入种子数据（食材、菜品、菜单周期）
//!
//! 文件格式：`{"ingredients": [...], "dishes": [...], "menu_cycles": [...]}`。
//! 食材与菜品按 id 覆盖写入；已存在（同 id）的周期跳过，便于重复启动。

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{CycleStatus, DailyMenu, Dish, Ingredient, MenuCycle};
use crate::store::{DishCatalog, MenuCycleStore, StoreError};

#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub dishes: Vec<Dish>,
    #[serde(default)]
    pub menu_cycles: Vec<SeedCycle>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCycle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: CycleStatus,
    pub duration_days: u32,
    pub daily_menus: Vec<DailyMenu>,
}

impl SeedCycle {
    fn into_cycle(self, now: DateTime<Utc>) -> MenuCycle {
        MenuCycle {
            id: self.id,
            name: self.name.trim().to_string(),
            description: self.description,
            status: self.status,
            duration_days: self.duration_days,
            daily_menus: self.daily_menus,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub ingredients: usize,
    pub dishes: usize,
    pub cycles_created: usize,
    pub cycles_skipped: usize,
}

pub fn read_seed_file(path: &Path) -> anyhow::Result<SeedData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid seed file {}", path.display()))
}

pub async fn apply_seed(
    data: SeedData,
    catalog: &dyn DishCatalog,
    cycles: &dyn MenuCycleStore,
    now: DateTime<Utc>,
) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    for ingredient in data.ingredients {
        catalog.upsert_ingredient(ingredient).await?;
        report.ingredients += 1;
    }
    for dish in data.dishes {
        catalog.upsert_dish(dish).await?;
        report.dishes += 1;
    }

    for seed in data.menu_cycles {
        if cycles.get_cycle(&seed.id).await?.is_some() {
            report.cycles_skipped += 1;
            continue;
        }
        let cycle = seed.into_cycle(now);
        cycle
            .validate()
            .with_context(|| format!("Seed menu cycle '{}' is invalid", cycle.name))?;
        match cycles.insert_cycle(cycle).await {
            Ok(_) => report.cycles_created += 1,
            Err(StoreError::Duplicate(msg)) => {
                tracing::warn!("Skipping seed menu cycle: {}", msg);
                report.cycles_skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        ingredients = report.ingredients,
        dishes = report.dishes,
        cycles = report.cycles_created,
        skipped = report.cycles_skipped,
        "Seed data applied"
    );
    Ok(report)
}
