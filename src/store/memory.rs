//! 进程内存储
//!
//! 排期表由一把 RwLock 保护；写操作在持有写锁期间完成冲突检测与写入。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;

use super::{
    next_revision, plan_status_changes, DishCatalog, MenuCycleStore, ScheduleFilter, ScheduleStore,
    StatusChange, StoreError,
};
use crate::model::{CycleStatus, Dish, Ingredient, LocationKind, MenuCycle, MenuSchedule};
use crate::scheduling::overlap::find_conflicts;

#[derive(Default)]
pub struct MemoryStore {
    schedules: RwLock<HashMap<String, MenuSchedule>>,
    cycles: RwLock<HashMap<String, MenuCycle>>,
    dishes: RwLock<HashMap<String, Dish>>,
    ingredients: RwLock<HashMap<String, Ingredient>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<MenuSchedule>, StoreError> {
        Ok(self.schedules.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &ScheduleFilter) -> Result<Vec<MenuSchedule>, StoreError> {
        let schedules = self.schedules.read().await;
        let hits = schedules.values().filter(|s| filter.matches(s)).cloned().collect();
        Ok(filter.paginate(hits))
    }

    async fn find_covering(
        &self,
        location_id: &str,
        kind: LocationKind,
        date: NaiveDate,
    ) -> Result<Option<MenuSchedule>, StoreError> {
        let schedules = self.schedules.read().await;
        Ok(schedules
            .values()
            .filter(|s| s.status.is_live() && s.range().contains(date) && s.covers(location_id, kind))
            .max_by(|a, b| a.created_at.cmp(&b.created_at))
            .cloned())
    }

    async fn insert_exclusive(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError> {
        let mut schedules = self.schedules.write().await;
        if schedules.contains_key(&schedule.id) {
            return Err(StoreError::Duplicate(format!("Schedule {} already exists", schedule.id)));
        }
        let conflicts = find_conflicts(&schedule, schedules.values());
        if !conflicts.is_empty() {
            return Err(StoreError::Conflict(conflicts));
        }
        schedules.insert(schedule.id.clone(), schedule.clone());
        Ok(schedule)
    }

    async fn replace_exclusive(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError> {
        let mut schedules = self.schedules.write().await;
        let Some(stored) = schedules.get(&schedule.id) else {
            return Err(StoreError::NotFound(format!("Menu schedule {}", schedule.id)));
        };
        let schedule = next_revision(stored, schedule)?;
        let conflicts = find_conflicts(&schedule, schedules.values());
        if !conflicts.is_empty() {
            return Err(StoreError::Conflict(conflicts));
        }
        schedules.insert(schedule.id.clone(), schedule.clone());
        Ok(schedule)
    }

    async fn replace(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError> {
        let mut schedules = self.schedules.write().await;
        let Some(slot) = schedules.get_mut(&schedule.id) else {
            return Err(StoreError::NotFound(format!("Menu schedule {}", schedule.id)));
        };
        let schedule = next_revision(slot, schedule)?;
        *slot = schedule.clone();
        Ok(schedule)
    }

    async fn delete(&self, id: &str) -> Result<Option<MenuSchedule>, StoreError> {
        Ok(self.schedules.write().await.remove(id))
    }

    async fn refresh_statuses(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<StatusChange>, StoreError> {
        let mut schedules = self.schedules.write().await;
        let changes = plan_status_changes(schedules.values(), today);
        for change in &changes {
            if let Some(s) = schedules.get_mut(&change.schedule_id) {
                s.status = change.to;
                s.updated_at = now;
                s.revision += 1;
            }
        }
        Ok(changes)
    }
}

#[async_trait]
impl MenuCycleStore for MemoryStore {
    async fn get_cycle(&self, id: &str) -> Result<Option<MenuCycle>, StoreError> {
        Ok(self.cycles.read().await.get(id).cloned())
    }

    async fn list_cycles(&self, status: Option<CycleStatus>) -> Result<Vec<MenuCycle>, StoreError> {
        let cycles = self.cycles.read().await;
        let mut out: Vec<MenuCycle> = cycles
            .values()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn insert_cycle(&self, cycle: MenuCycle) -> Result<MenuCycle, StoreError> {
        let mut cycles = self.cycles.write().await;
        if cycles.values().any(|c| c.name == cycle.name && c.id != cycle.id) {
            return Err(StoreError::Duplicate(format!(
                "Menu cycle with name '{}' already exists",
                cycle.name
            )));
        }
        cycles.insert(cycle.id.clone(), cycle.clone());
        Ok(cycle)
    }
}

#[async_trait]
impl DishCatalog for MemoryStore {
    async fn dishes_by_ids(&self, ids: &[String]) -> Result<Vec<Dish>, StoreError> {
        let dishes = self.dishes.read().await;
        Ok(ids.iter().filter_map(|id| dishes.get(id).cloned()).collect())
    }

    async fn ingredients_by_ids(&self, ids: &[String]) -> Result<Vec<Ingredient>, StoreError> {
        let ingredients = self.ingredients.read().await;
        Ok(ids.iter().filter_map(|id| ingredients.get(id).cloned()).collect())
    }

    async fn upsert_dish(&self, dish: Dish) -> Result<(), StoreError> {
        self.dishes.write().await.insert(dish.id.clone(), dish);
        Ok(())
    }

    async fn upsert_ingredient(&self, ingredient: Ingredient) -> Result<(), StoreError> {
        self.ingredients.write().await.insert(ingredient.id.clone(), ingredient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{Coverage, ScheduleStatus};

    fn schedule(id: &str, start: u32, end: u32) -> MenuSchedule {
        MenuSchedule {
            id: id.into(),
            menu_cycle_id: "c1".into(),
            coverage: vec![Coverage {
                location_id: "101".into(),
                location_type: LocationKind::Campus,
                location_name: "Sede Central".into(),
            }],
            start_date: NaiveDate::from_ymd_opt(2024, 5, start).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, end).unwrap(),
            status: ScheduleStatus::Future,
            cancellation: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            revision: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_exclusive_rejects_overlap() {
        let store = MemoryStore::new();
        store.insert_exclusive(schedule("a", 1, 10)).await.unwrap();
        let err = store.insert_exclusive(schedule("b", 10, 20)).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict(vec!["Sede Central".into()]));
        store.insert_exclusive(schedule("c", 11, 20)).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_exclusive_excludes_self() {
        let store = MemoryStore::new();
        let mut s = store.insert_exclusive(schedule("a", 1, 10)).await.unwrap();
        s.end_date = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let saved = store.replace_exclusive(s).await.unwrap();
        assert_eq!(saved.end_date.to_string(), "2024-05-15");
        assert_eq!(saved.revision, 1);
    }

    #[tokio::test]
    async fn test_replace_rejects_outdated_revision() {
        let store = MemoryStore::new();
        let read = store.insert_exclusive(schedule("a", 1, 10)).await.unwrap();

        let mut cancelled = read.clone();
        cancelled.status = ScheduleStatus::Cancelled;
        store.replace(cancelled).await.unwrap();

        let mut extended = read;
        extended.end_date = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let err = store.replace_exclusive(extended.clone()).await.unwrap_err();
        assert_eq!(err, StoreError::Stale("a".into()));
        assert!(matches!(store.replace(extended).await, Err(StoreError::Stale(_))));

        let current = store.get("a").await.unwrap().unwrap();
        assert_eq!(current.status, ScheduleStatus::Cancelled);
        assert_eq!(current.end_date.to_string(), "2024-05-10");
    }

    #[tokio::test]
    async fn test_concurrent_inserts_admit_exactly_one() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert_exclusive(schedule(&format!("s{}", i), 1, 31)).await
            }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_cycle_names_unique() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let cycle = |id: &str| MenuCycle {
            id: id.into(),
            name: "Semana A".into(),
            description: None,
            status: CycleStatus::Active,
            duration_days: 1,
            daily_menus: vec![],
            created_at: now,
            updated_at: now,
        };
        store.insert_cycle(cycle("c1")).await.unwrap();
        assert!(matches!(store.insert_cycle(cycle("c2")).await, Err(StoreError::Duplicate(_))));
    }
}
