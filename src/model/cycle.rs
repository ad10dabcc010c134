//! 菜单周期：D 天循环的每日菜单

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::MenuError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    #[default]
    Active,
    Inactive,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Active => "active",
            CycleStatus::Inactive => "inactive",
        }
    }
}

/// 一餐的时段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Snack,
}

/// 周期中第 `day` 天的菜单（1 起始）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMenu {
    pub day: u32,
    #[serde(default)]
    pub breakfast_dish_ids: Vec<String>,
    #[serde(default)]
    pub lunch_dish_ids: Vec<String>,
    #[serde(default)]
    pub snack_dish_ids: Vec<String>,
}

impl DailyMenu {
    pub fn meal(&self, slot: MealSlot) -> &[String] {
        match slot {
            MealSlot::Breakfast => &self.breakfast_dish_ids,
            MealSlot::Lunch => &self.lunch_dish_ids,
            MealSlot::Snack => &self.snack_dish_ids,
        }
    }

    /// 按早餐、午餐、加餐顺序遍历全部菜品 id（重复出现的 id 会重复返回）
    pub fn dish_ids(&self) -> impl Iterator<Item = &String> {
        self.breakfast_dish_ids
            .iter()
            .chain(self.lunch_dish_ids.iter())
            .chain(self.snack_dish_ids.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.dish_ids().next().is_none()
    }
}

/// 新建周期的输入
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuCycle {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: CycleStatus,
    pub duration_days: u32,
    pub daily_menus: Vec<DailyMenu>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCycle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: CycleStatus,
    pub duration_days: u32,
    pub daily_menus: Vec<DailyMenu>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuCycle {
    pub fn from_draft(draft: NewMenuCycle, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            status: draft.status,
            duration_days: draft.duration_days,
            daily_menus: draft.daily_menus,
            created_at: now,
            updated_at: now,
        }
    }

    /// 校验：名称非空；D ≥ 1；1..=D 每天恰好一份菜单；每天至少一道菜
    pub fn validate(&self) -> Result<(), MenuError> {
        if self.name.trim().is_empty() {
            return Err(MenuError::validation("Name cannot be empty or just whitespace"));
        }
        if self.duration_days == 0 {
            return Err(MenuError::validation("Duration must be at least 1 day"));
        }

        let mut seen = HashSet::new();
        for menu in &self.daily_menus {
            if menu.day == 0 || menu.day > self.duration_days {
                return Err(MenuError::validation(format!(
                    "Day {} is outside the cycle duration of {} days",
                    menu.day, self.duration_days
                )));
            }
            if !seen.insert(menu.day) {
                return Err(MenuError::validation(format!("Day {} is defined more than once", menu.day)));
            }
            if menu.is_empty() {
                return Err(MenuError::validation(format!(
                    "Day {} must have at least one dish assigned",
                    menu.day
                )));
            }
        }

        if let Some(missing) = (1..=self.duration_days).find(|d| !seen.contains(d)) {
            return Err(MenuError::validation(format!("Day {} has no menu defined", missing)));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == CycleStatus::Active
    }

    pub fn day(&self, day: u32) -> Option<&DailyMenu> {
        self.daily_menus.iter().find(|m| m.day == day)
    }

    /// 周期内引用到的全部菜品 id（去重）
    pub fn dish_ids(&self) -> BTreeSet<String> {
        self.daily_menus
            .iter()
            .flat_map(|m| m.dish_ids().cloned())
            .collect()
    }
}
