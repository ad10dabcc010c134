//! 存储层：排期、菜单周期、菜品目录
//!
//! - **MemoryStore**: 进程内存储（测试与无数据库部署）
//! - **SqliteStore**: sqlx + SQLite 持久化（需 `async-sqlite` feature）
//!
//! 冲突检测与写入必须是一个原子单元：`insert_exclusive` / `replace_exclusive`
//! 在同一把写锁（或同一事务）内完成检查和写入。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::MenuError;
use crate::model::{CycleStatus, Dish, Ingredient, LocationKind, MenuCycle, MenuSchedule, ScheduleStatus};

pub mod memory;
#[cfg(feature = "async-sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "async-sqlite")]
pub use sqlite::SqliteStore;

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const MAX_LIST_LIMIT: usize = 1000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// 与已有 active / future 排期冲突的地点名称
    #[error("Conflicting schedules for locations: {}", .0.join(", "))]
    Conflict(Vec<String>),

    #[error("{0}")]
    Duplicate(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored document could not be decoded: {0}")]
    Codec(String),

    /// 覆盖写入时记录已被其他请求修改
    #[error("Menu schedule {0} was modified by another request; reload it and try again")]
    Stale(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}

impl From<StoreError> for MenuError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(names) => MenuError::Conflict(names),
            StoreError::Duplicate(msg) => MenuError::Validation(msg),
            StoreError::NotFound(msg) => MenuError::NotFound(msg),
            StoreError::Backend(msg) => MenuError::ServiceUnavailable(msg),
            StoreError::Codec(msg) => MenuError::Internal(msg),
            StoreError::Stale(_) => MenuError::Validation(e.to_string()),
        }
    }
}

/// 排期列表筛选；所有条件取交集
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleFilter {
    pub status: Option<ScheduleStatus>,
    pub menu_cycle_id: Option<String>,
    pub location_id: Option<String>,
    pub location_type: Option<LocationKind>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
    pub end_date_from: Option<NaiveDate>,
    pub end_date_to: Option<NaiveDate>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl ScheduleFilter {
    pub fn matches(&self, s: &MenuSchedule) -> bool {
        if self.status.is_some_and(|st| st != s.status) {
            return false;
        }
        if self.menu_cycle_id.as_deref().is_some_and(|id| id != s.menu_cycle_id) {
            return false;
        }
        if let Some(ref loc) = self.location_id {
            let hit = s.coverage.iter().any(|c| {
                c.location_id == *loc && self.location_type.map_or(true, |k| k == c.location_type)
            });
            if !hit {
                return false;
            }
        } else if let Some(kind) = self.location_type {
            if !s.coverage.iter().any(|c| c.location_type == kind) {
                return false;
            }
        }
        if self.start_date_from.is_some_and(|d| s.start_date < d)
            || self.start_date_to.is_some_and(|d| s.start_date > d)
            || self.end_date_from.is_some_and(|d| s.end_date < d)
            || self.end_date_to.is_some_and(|d| s.end_date > d)
        {
            return false;
        }
        true
    }

    /// 最新创建在前，再按 skip / limit 截取
    pub fn paginate(&self, mut items: Vec<MenuSchedule>) -> Vec<MenuSchedule> {
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        let limit = self.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        items.into_iter().skip(self.skip.unwrap_or(0)).take(limit).collect()
    }
}

/// 状态刷新中发生的一次变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub schedule_id: String,
    pub from: ScheduleStatus,
    pub to: ScheduleStatus,
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<MenuSchedule>, StoreError>;

    async fn list(&self, filter: &ScheduleFilter) -> Result<Vec<MenuSchedule>, StoreError>;

    /// 覆盖该地点、日期落在区间内、状态为 active / future 的排期
    async fn find_covering(
        &self,
        location_id: &str,
        kind: LocationKind,
        date: NaiveDate,
    ) -> Result<Option<MenuSchedule>, StoreError>;

    /// 冲突检测 + 插入（原子）；冲突时返回 StoreError::Conflict
    async fn insert_exclusive(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError>;

    /// 冲突检测（排除自身 id）+ 覆盖写入（原子）
    ///
    /// `schedule.revision` 必须等于存储中的当前值，否则返回 Stale；写入后 revision 加一。
    async fn replace_exclusive(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError>;

    /// 不做冲突检测的覆盖写入（取消等不扩大占用的变更）；revision 规则同上
    async fn replace(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError>;

    async fn delete(&self, id: &str) -> Result<Option<MenuSchedule>, StoreError>;

    /// 按 today 推进 future → active → completed
    async fn refresh_statuses(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<StatusChange>, StoreError>;
}

#[async_trait]
pub trait MenuCycleStore: Send + Sync {
    async fn get_cycle(&self, id: &str) -> Result<Option<MenuCycle>, StoreError>;

    async fn list_cycles(&self, status: Option<CycleStatus>) -> Result<Vec<MenuCycle>, StoreError>;

    /// 名称唯一；重名返回 Duplicate
    async fn insert_cycle(&self, cycle: MenuCycle) -> Result<MenuCycle, StoreError>;
}

/// 菜品 / 食材目录；按 id 批量查询，缺失的 id 直接不返回
#[async_trait]
pub trait DishCatalog: Send + Sync {
    async fn dishes_by_ids(&self, ids: &[String]) -> Result<Vec<Dish>, StoreError>;

    async fn ingredients_by_ids(&self, ids: &[String]) -> Result<Vec<Ingredient>, StoreError>;

    async fn upsert_dish(&self, dish: Dish) -> Result<(), StoreError>;

    async fn upsert_ingredient(&self, ingredient: Ingredient) -> Result<(), StoreError>;
}

/// 校验读取时的 revision 仍是当前值，返回待写入的下一版本
pub(crate) fn next_revision(stored: &MenuSchedule, mut incoming: MenuSchedule) -> Result<MenuSchedule, StoreError> {
    if stored.revision != incoming.revision {
        return Err(StoreError::Stale(incoming.id));
    }
    incoming.revision = stored.revision + 1;
    Ok(incoming)
}

/// 计算一次状态刷新的变更（两种存储共用）
pub(crate) fn plan_status_changes<'a>(
    schedules: impl Iterator<Item = &'a MenuSchedule>,
    today: NaiveDate,
) -> Vec<StatusChange> {
    schedules
        .filter_map(|s| {
            let next = s.status_as_of(today);
            (next != s.status).then(|| StatusChange {
                schedule_id: s.id.clone(),
                from: s.status,
                to: next,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coverage;

    fn schedule(id: &str, loc: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> MenuSchedule {
        MenuSchedule {
            id: id.into(),
            menu_cycle_id: "c1".into(),
            coverage: vec![Coverage {
                location_id: loc.into(),
                location_type: LocationKind::Campus,
                location_name: format!("Sede {}", loc),
            }],
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            status: ScheduleStatus::Active,
            cancellation: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            revision: 0,
        }
    }

    #[test]
    fn test_filter_by_location_and_dates() {
        let s = schedule("s1", "10", (2024, 1, 1), (2024, 1, 31));
        let mut f = ScheduleFilter {
            location_id: Some("10".into()),
            ..Default::default()
        };
        assert!(f.matches(&s));
        f.location_type = Some(LocationKind::Town);
        assert!(!f.matches(&s));
        f.location_type = None;
        f.start_date_from = NaiveDate::from_ymd_opt(2024, 1, 2);
        assert!(!f.matches(&s));
    }

    #[test]
    fn test_paginate_newest_first() {
        let mut a = schedule("a", "1", (2024, 1, 1), (2024, 1, 2));
        let mut b = schedule("b", "1", (2024, 1, 1), (2024, 1, 2));
        a.created_at = Utc::now() - chrono::Duration::hours(1);
        b.created_at = Utc::now();
        let f = ScheduleFilter {
            limit: Some(1),
            ..Default::default()
        };
        let page = f.paginate(vec![a, b]);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "b");
    }

    #[test]
    fn test_plan_status_changes() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let done = schedule("done", "1", (2024, 1, 1), (2024, 1, 31));
        let running = schedule("running", "2", (2024, 2, 1), (2024, 2, 28));
        let mut upcoming = schedule("upcoming", "3", (2024, 2, 10), (2024, 3, 10));
        upcoming.status = ScheduleStatus::Future;
        let changes = plan_status_changes([done, running, upcoming].iter(), today);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].to, ScheduleStatus::Completed);
        assert_eq!(changes[1].schedule_id, "upcoming");
        assert_eq!(changes[1].to, ScheduleStatus::Active);
    }
}
