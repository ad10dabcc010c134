//! 排期操作的请求与返回结构

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::LocationRef;
use crate::model::{Coverage, Dish, LocationKind, MenuSchedule, ScheduleStatus};

/// 分配请求：校区与乡镇 id 至少一个
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
    pub menu_cycle_id: String,
    #[serde(default)]
    pub campus_ids: Vec<String>,
    #[serde(default)]
    pub town_ids: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AssignRequest {
    /// 请求中的地点（去重，保持顺序）
    pub fn locations(&self) -> Vec<LocationRef> {
        let mut out: Vec<LocationRef> = Vec::new();
        let refs = self
            .campus_ids
            .iter()
            .map(|id| LocationRef::campus(id.trim()))
            .chain(self.town_ids.iter().map(|id| LocationRef::town(id.trim())));
        for r in refs {
            if !out.contains(&r) {
                out.push(r);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentSummary {
    pub schedule_id: String,
    pub menu_cycle_id: String,
    pub menu_cycle_name: String,
    pub locations: Vec<Coverage>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
    pub status: ScheduleStatus,
}

/// 部分更新：只允许修改覆盖地点与结束日期
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub coverage: Option<Vec<LocationRef>>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// 公众查询返回的菜品信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub photo_url: Option<String>,
}

impl From<&Dish> for DishInfo {
    fn from(d: &Dish) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            description: d.description.clone(),
            calories: d.nutritional_info.calories,
            protein: d.nutritional_info.protein,
            photo_url: d.nutritional_info.photo_url.clone(),
        }
    }
}

/// 某地点某日生效的菜单
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveMenu {
    pub location_id: String,
    pub location_type: LocationKind,
    pub location_name: String,
    pub date: NaiveDate,
    pub schedule_id: String,
    pub menu_cycle_id: String,
    pub menu_cycle_name: String,
    pub cycle_day: u32,
    pub breakfast: Vec<DishInfo>,
    pub lunch: Vec<DishInfo>,
    pub snack: Vec<DishInfo>,
}

/// 生效菜单查询结果；无排期、无周期、无当日菜单都不是错误
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "availability", rename_all = "snake_case")]
pub enum MenuLookup {
    Available(EffectiveMenu),
    Unavailable {
        location_id: String,
        location_type: LocationKind,
        location_name: String,
        date: NaiveDate,
        reason: String,
    },
}

impl MenuLookup {
    pub fn is_available(&self) -> bool {
        matches!(self, MenuLookup::Available(_))
    }
}

/// 排期明细中的一行：某地点某日
#[derive(Debug, Clone, Serialize)]
pub struct DailyEntry {
    pub location_id: String,
    pub location_type: LocationKind,
    pub location_name: String,
    pub date: NaiveDate,
    pub cycle_day: u32,
    pub breakfast: Vec<DishInfo>,
    pub lunch: Vec<DishInfo>,
    pub snack: Vec<DishInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDetailed {
    #[serde(flatten)]
    pub schedule: MenuSchedule,
    pub menu_cycle_name: String,
    pub duration_days: i64,
    pub entries: Vec<DailyEntry>,
}

/// 删除后返回的审计摘要
#[derive(Debug, Clone, Serialize)]
pub struct DeletedSchedule {
    pub id: String,
    pub menu_cycle_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
    pub coverage_count: usize,
    pub deleted_at: DateTime<Utc>,
    pub message: String,
}
