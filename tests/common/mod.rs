//! 集成测试共用的构造工具与测试替身

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use pae_menus::core::FixedClock;
use pae_menus::directory::{CoverageDirectory, DirectoryError, ResolvedLocation, StaticCoverageDirectory};
use pae_menus::model::{
    CycleStatus, DailyMenu, Dish, DishType, Ingredient, LocationKind, MenuCycle, MenuSchedule,
    NutritionalInfo,
};
use pae_menus::store::{
    DishCatalog, MemoryStore, MenuCycleStore, ScheduleFilter, ScheduleStore, StatusChange, StoreError,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn clock_on(y: i32, m: u32, d: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock::on(date(y, m, d)))
}

pub fn directory() -> Arc<StaticCoverageDirectory> {
    Arc::new(
        StaticCoverageDirectory::new()
            .with_location(LocationKind::Campus, "C1", "Sede Central")
            .with_location(LocationKind::Campus, "C2", "Sede Norte")
            .with_location(LocationKind::Town, "T1", "Vereda El Carmen"),
    )
}

/// 每天午餐一道菜：day N → dish-N
pub fn cycle(id: &str, name: &str, days: u32) -> MenuCycle {
    let now = Utc.with_ymd_and_hms(2023, 12, 1, 8, 0, 0).unwrap();
    MenuCycle {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        status: CycleStatus::Active,
        duration_days: days,
        daily_menus: (1..=days)
            .map(|day| DailyMenu {
                day,
                breakfast_dish_ids: vec![],
                lunch_dish_ids: vec![format!("dish-{}", day)],
                snack_dish_ids: vec![],
            })
            .collect(),
        created_at: now,
        updated_at: now,
    }
}

pub fn dish(id: &str, kind: Option<DishType>, calories: f64) -> Dish {
    Dish {
        id: id.to_string(),
        name: format!("Plato {}", id),
        description: None,
        status: Default::default(),
        dish_type: kind,
        recipe: Default::default(),
        nutritional_info: NutritionalInfo {
            calories: Some(calories),
            ..Default::default()
        },
    }
}

pub fn ingredient(id: &str, category: &str) -> Ingredient {
    Ingredient {
        id: id.to_string(),
        name: id.to_string(),
        category: Some(category.to_string()),
        status: Default::default(),
    }
}

/// 内存存储 + 已登记的周期
pub async fn store_with_cycles(cycles: &[MenuCycle]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for c in cycles {
        store.insert_cycle(c.clone()).await.unwrap();
    }
    store
}

/// 统计调用次数的存储包装
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScheduleStore for CountingStore {
    async fn get(&self, id: &str) -> Result<Option<MenuSchedule>, StoreError> {
        self.hit();
        self.inner.get(id).await
    }

    async fn list(&self, filter: &ScheduleFilter) -> Result<Vec<MenuSchedule>, StoreError> {
        self.hit();
        self.inner.list(filter).await
    }

    async fn find_covering(
        &self,
        location_id: &str,
        kind: LocationKind,
        date: NaiveDate,
    ) -> Result<Option<MenuSchedule>, StoreError> {
        self.hit();
        self.inner.find_covering(location_id, kind, date).await
    }

    async fn insert_exclusive(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError> {
        self.hit();
        self.inner.insert_exclusive(schedule).await
    }

    async fn replace_exclusive(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError> {
        self.hit();
        self.inner.replace_exclusive(schedule).await
    }

    async fn replace(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError> {
        self.hit();
        self.inner.replace(schedule).await
    }

    async fn delete(&self, id: &str) -> Result<Option<MenuSchedule>, StoreError> {
        self.hit();
        self.inner.delete(id).await
    }

    async fn refresh_statuses(
        &self,
        today: NaiveDate,
        now: chrono::DateTime<Utc>,
    ) -> Result<Vec<StatusChange>, StoreError> {
        self.hit();
        self.inner.refresh_statuses(today, now).await
    }
}

#[async_trait]
impl MenuCycleStore for CountingStore {
    async fn get_cycle(&self, id: &str) -> Result<Option<MenuCycle>, StoreError> {
        self.hit();
        self.inner.get_cycle(id).await
    }

    async fn list_cycles(&self, status: Option<CycleStatus>) -> Result<Vec<MenuCycle>, StoreError> {
        self.hit();
        self.inner.list_cycles(status).await
    }

    async fn insert_cycle(&self, cycle: MenuCycle) -> Result<MenuCycle, StoreError> {
        self.hit();
        self.inner.insert_cycle(cycle).await
    }
}

/// 永远不返回的菜品目录，用于验证超时
pub struct StalledCatalog {
    pub delay: Duration,
}

#[async_trait]
impl DishCatalog for StalledCatalog {
    async fn dishes_by_ids(&self, _ids: &[String]) -> Result<Vec<Dish>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![])
    }

    async fn ingredients_by_ids(&self, _ids: &[String]) -> Result<Vec<Ingredient>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![])
    }

    async fn upsert_dish(&self, _dish: Dish) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_ingredient(&self, _ingredient: Ingredient) -> Result<(), StoreError> {
        Ok(())
    }
}

/// 每次查询先等待一段时间的目录，用于制造读写之间的并发窗口
pub struct SlowDirectory {
    pub inner: Arc<StaticCoverageDirectory>,
    pub delay: Duration,
}

#[async_trait]
impl CoverageDirectory for SlowDirectory {
    async fn get_campus(&self, id: &str) -> Result<Option<ResolvedLocation>, DirectoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_campus(id).await
    }

    async fn get_town(&self, id: &str) -> Result<Option<ResolvedLocation>, DirectoryError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_town(id).await
    }
}
