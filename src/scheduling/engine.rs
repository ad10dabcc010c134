//! 排期引擎
//!
//! 所有协作方（排期存储、周期存储、菜品目录、覆盖范围目录、时钟）都通过构造函数注入。
//! 读取类调用带超时；冲突检测与写入交给存储层的原子操作完成，写入本身不加超时，
//! 避免「已提交但报告超时」。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::types::{
    AssignRequest, AssignmentSummary, DailyEntry, DeletedSchedule, DishInfo, EffectiveMenu, MenuLookup,
    ScheduleDetailed, UpdateRequest,
};
use crate::core::{within, Clock, MenuError};
use crate::directory::{resolve_all, CoverageDirectory, LocationRef};
use crate::model::{
    initial_status, CancellationInfo, DailyMenu, DateRange, Dish, LocationKind, MealSlot, MenuCycle,
    MenuSchedule, ScheduleStatus,
};
use crate::store::{DishCatalog, MenuCycleStore, ScheduleFilter, ScheduleStore, StatusChange};

const UNKNOWN_LOCATION: &str = "Unknown Location";

pub struct SchedulingEngine {
    schedules: Arc<dyn ScheduleStore>,
    cycles: Arc<dyn MenuCycleStore>,
    catalog: Arc<dyn DishCatalog>,
    directory: Arc<dyn CoverageDirectory>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl SchedulingEngine {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        cycles: Arc<dyn MenuCycleStore>,
        catalog: Arc<dyn DishCatalog>,
        directory: Arc<dyn CoverageDirectory>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            schedules,
            cycles,
            catalog,
            directory,
            clock,
            timeout,
        }
    }

    /// 将周期分配到一组地点的日期区间
    ///
    /// 顺序：本地校验（不触碰存储）→ 周期存在且启用 → 解析全部地点 → 原子冲突检测 + 写入。
    pub async fn assign(&self, req: AssignRequest) -> Result<AssignmentSummary, MenuError> {
        let range = DateRange::new(req.start_date, req.end_date)?;
        if req.campus_ids.is_empty() && req.town_ids.is_empty() {
            return Err(MenuError::validation("At least one campus or town must be selected"));
        }
        let locations = req.locations();
        if locations.iter().any(|l| l.id.is_empty()) {
            return Err(MenuError::validation("Location IDs cannot be empty"));
        }

        let cycle = self.require_cycle(&req.menu_cycle_id).await?;
        if !cycle.is_active() {
            return Err(MenuError::validation("Cannot assign inactive menu cycle"));
        }

        let coverage = within(
            self.timeout,
            "coverage lookup",
            resolve_all(self.directory.as_ref(), &locations),
        )
        .await?;

        let now = self.clock.now();
        let schedule = MenuSchedule {
            id: uuid::Uuid::new_v4().to_string(),
            menu_cycle_id: cycle.id.clone(),
            coverage,
            start_date: range.start,
            end_date: range.end,
            status: initial_status(range.start, self.clock.today()),
            cancellation: None,
            created_at: now,
            updated_at: now,
            revision: 0,
        };

        let saved = self.schedules.insert_exclusive(schedule).await.map_err(|e| {
            let err = MenuError::from(e);
            if let MenuError::Conflict(ref names) = err {
                tracing::info!(cycle = %cycle.id, locations = ?names, "Assignment rejected: schedule conflict");
            }
            err
        })?;

        tracing::info!(
            schedule = %saved.id,
            cycle = %cycle.name,
            locations = saved.coverage.len(),
            start = %saved.start_date,
            end = %saved.end_date,
            status = %saved.status,
            "Menu cycle assigned"
        );

        Ok(AssignmentSummary {
            schedule_id: saved.id,
            menu_cycle_id: cycle.id,
            menu_cycle_name: cycle.name,
            locations: saved.coverage,
            start_date: saved.start_date,
            end_date: saved.end_date,
            duration_days: range.len_days(),
            status: saved.status,
        })
    }

    pub async fn get(&self, id: &str) -> Result<MenuSchedule, MenuError> {
        within(self.timeout, "schedule read", self.schedules.get(id))
            .await?
            .ok_or_else(|| MenuError::not_found(format!("Menu schedule with id '{}' not found", id)))
    }

    pub async fn list(&self, filter: &ScheduleFilter) -> Result<Vec<MenuSchedule>, MenuError> {
        within(self.timeout, "schedule list", self.schedules.list(filter)).await
    }

    /// 逐地点、逐日展开排期（含周期日与三餐菜品）
    pub async fn detailed(&self, id: &str) -> Result<ScheduleDetailed, MenuError> {
        let schedule = self.get(id).await?;
        let cycle = self.require_cycle(&schedule.menu_cycle_id).await?;
        let ids: Vec<String> = cycle.dish_ids().into_iter().collect();
        let dishes = self.load_dishes(&ids).await?;

        let range = schedule.range();
        let mut entries = Vec::new();
        for cov in &schedule.coverage {
            for date in range.days() {
                let cycle_day = schedule.cyclic_day(date, cycle.duration_days);
                let menu = cycle.day(cycle_day);
                entries.push(DailyEntry {
                    location_id: cov.location_id.clone(),
                    location_type: cov.location_type,
                    location_name: cov.location_name.clone(),
                    date,
                    cycle_day,
                    breakfast: meal_dishes(menu, MealSlot::Breakfast, &dishes),
                    lunch: meal_dishes(menu, MealSlot::Lunch, &dishes),
                    snack: meal_dishes(menu, MealSlot::Snack, &dishes),
                });
            }
        }

        Ok(ScheduleDetailed {
            duration_days: range.len_days(),
            menu_cycle_name: cycle.name,
            schedule,
            entries,
        })
    }

    /// 修改覆盖地点和/或结束日期；任一变化都会重新做冲突检测（排除自身）
    ///
    /// 写入时校验 revision：读取后若被取消或刷新过状态，本次修改被拒绝。
    pub async fn update(&self, id: &str, req: UpdateRequest) -> Result<MenuSchedule, MenuError> {
        let current = self.get(id).await?;
        if !current.status.is_live() {
            return Err(MenuError::validation(format!(
                "Cannot edit schedule with status '{}'",
                current.status
            )));
        }

        let mut next = current.clone();
        if let Some(end) = req.end_date {
            DateRange::new(current.start_date, end)?;
            next.end_date = end;
        }
        if let Some(refs) = req.coverage {
            if refs.is_empty() {
                return Err(MenuError::validation("At least one location must be selected"));
            }
            let mut unique: Vec<LocationRef> = Vec::with_capacity(refs.len());
            for r in refs {
                let r = LocationRef {
                    id: r.id.trim().to_string(),
                    kind: r.kind,
                };
                if r.id.is_empty() {
                    return Err(MenuError::validation("Location IDs cannot be empty"));
                }
                if !unique.contains(&r) {
                    unique.push(r);
                }
            }
            next.coverage = within(
                self.timeout,
                "coverage lookup",
                resolve_all(self.directory.as_ref(), &unique),
            )
            .await?;
        }

        let changed = next.coverage != current.coverage || next.end_date != current.end_date;
        next.updated_at = self.clock.now();
        let saved = if changed {
            self.schedules.replace_exclusive(next).await?
        } else {
            self.schedules.replace(next).await?
        };

        tracing::info!(schedule = %saved.id, rechecked = changed, "Menu schedule updated");
        Ok(saved)
    }

    pub async fn cancel(&self, id: &str, reason: Option<String>) -> Result<MenuSchedule, MenuError> {
        let mut schedule = self.get(id).await?;
        match schedule.status {
            ScheduleStatus::Cancelled => return Err(MenuError::validation("Schedule is already cancelled")),
            ScheduleStatus::Completed => return Err(MenuError::validation("Cannot cancel completed schedule")),
            ScheduleStatus::Active | ScheduleStatus::Future => {}
        }

        let now = self.clock.now();
        schedule.status = ScheduleStatus::Cancelled;
        schedule.cancellation = Some(CancellationInfo {
            reason: normalize_reason(reason),
            cancelled_at: now,
        });
        schedule.updated_at = now;

        let saved = self.schedules.replace(schedule).await?;
        tracing::info!(schedule = %saved.id, "Menu schedule cancelled");
        Ok(saved)
    }

    /// 恢复已取消的排期；与其他 active / future 排期冲突时拒绝
    pub async fn uncancel(&self, id: &str, reason: Option<String>) -> Result<MenuSchedule, MenuError> {
        let mut schedule = self.get(id).await?;
        if schedule.status != ScheduleStatus::Cancelled {
            return Err(MenuError::validation(format!(
                "Only cancelled schedules can be uncancelled (current status: '{}')",
                schedule.status
            )));
        }

        schedule.status = initial_status(schedule.start_date, self.clock.today());
        schedule.cancellation = None;
        schedule.updated_at = self.clock.now();

        let saved = self.schedules.replace_exclusive(schedule).await?;
        tracing::info!(
            schedule = %saved.id,
            status = %saved.status,
            reason = normalize_reason(reason).as_deref().unwrap_or(""),
            "Menu schedule restored"
        );
        Ok(saved)
    }

    /// 无条件删除，返回审计摘要
    pub async fn delete(&self, id: &str) -> Result<DeletedSchedule, MenuError> {
        let removed = self
            .schedules
            .delete(id)
            .await?
            .ok_or_else(|| MenuError::not_found(format!("Menu schedule with id '{}' not found", id)))?;

        tracing::info!(schedule = %removed.id, status = %removed.status, "Menu schedule deleted");
        Ok(DeletedSchedule {
            message: format!("Menu schedule {} deleted successfully", removed.id),
            id: removed.id,
            menu_cycle_id: removed.menu_cycle_id,
            start_date: removed.start_date,
            end_date: removed.end_date,
            status: removed.status,
            coverage_count: removed.coverage.len(),
            deleted_at: self.clock.now(),
        })
    }

    /// 查询某地点某日生效的菜单
    ///
    /// 找不到排期、周期或当日菜单时返回 Unavailable，不报错；协作方故障仍报 ServiceUnavailable。
    pub async fn resolve_effective_menu(
        &self,
        location_id: &str,
        kind: LocationKind,
        date: NaiveDate,
    ) -> Result<MenuLookup, MenuError> {
        let location_id = location_id.trim();
        if location_id.is_empty() {
            return Err(MenuError::validation("Location ID cannot be empty"));
        }

        let found = within(
            self.timeout,
            "schedule lookup",
            self.schedules.find_covering(location_id, kind, date),
        )
        .await?;

        let Some(schedule) = found else {
            let name = self.best_effort_name(location_id, kind).await;
            return Ok(unavailable(
                location_id,
                kind,
                name,
                date,
                "No menu schedule found for this location and date. Please check if the date is within an active menu period.",
            ));
        };

        let location_name = schedule
            .coverage
            .iter()
            .find(|c| c.matches(location_id, kind))
            .map(|c| c.location_name.clone())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        let cycle = within(self.timeout, "menu cycle read", self.cycles.get_cycle(&schedule.menu_cycle_id)).await?;
        let Some(cycle) = cycle else {
            return Ok(unavailable(
                location_id,
                kind,
                location_name,
                date,
                "Menu cycle not found. Please contact administration.",
            ));
        };

        let cycle_day = schedule.cyclic_day(date, cycle.duration_days);
        let Some(menu) = cycle.day(cycle_day) else {
            return Ok(unavailable(
                location_id,
                kind,
                location_name,
                date,
                &format!("No menu configured for day {} of the cycle.", cycle_day),
            ));
        };

        let mut ids: Vec<String> = Vec::new();
        for id in menu.dish_ids() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        let dishes = self.load_dishes(&ids).await?;

        Ok(MenuLookup::Available(EffectiveMenu {
            location_id: location_id.to_string(),
            location_type: kind,
            location_name,
            date,
            schedule_id: schedule.id,
            menu_cycle_id: cycle.id.clone(),
            menu_cycle_name: cycle.name.clone(),
            cycle_day,
            breakfast: meal_dishes(Some(menu), MealSlot::Breakfast, &dishes),
            lunch: meal_dishes(Some(menu), MealSlot::Lunch, &dishes),
            snack: meal_dishes(Some(menu), MealSlot::Snack, &dishes),
        }))
    }

    /// 生命周期刷新：future → active → completed
    pub async fn refresh_statuses(&self) -> Result<Vec<StatusChange>, MenuError> {
        let changes = self
            .schedules
            .refresh_statuses(self.clock.today(), self.clock.now())
            .await?;
        if !changes.is_empty() {
            tracing::info!(changed = changes.len(), "Schedule statuses refreshed");
        }
        Ok(changes)
    }

    /// 后台周期性刷新状态，token 取消后退出
    pub fn spawn_status_sweep(self: Arc<Self>, period: Duration, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Status sweep stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.refresh_statuses().await {
                            tracing::warn!("Status sweep failed: {}", e);
                        }
                    }
                }
            }
        })
    }

    async fn require_cycle(&self, id: &str) -> Result<MenuCycle, MenuError> {
        within(self.timeout, "menu cycle read", self.cycles.get_cycle(id))
            .await?
            .ok_or_else(|| MenuError::not_found(format!("Menu cycle with id '{}' not found", id)))
    }

    async fn load_dishes(&self, ids: &[String]) -> Result<HashMap<String, Dish>, MenuError> {
        let dishes = within(self.timeout, "dish catalog", self.catalog.dishes_by_ids(ids)).await?;
        Ok(dishes.into_iter().map(|d| (d.id.clone(), d)).collect())
    }

    /// 仅用于展示名称；目录不可用时退回默认名称
    async fn best_effort_name(&self, location_id: &str, kind: LocationKind) -> String {
        let lookup = LocationRef {
            id: location_id.to_string(),
            kind,
        };
        match within(self.timeout, "coverage lookup", self.directory.lookup(&lookup)).await {
            Ok(Some(found)) => found.name,
            Ok(None) => UNKNOWN_LOCATION.to_string(),
            Err(e) => {
                tracing::warn!(location = location_id, "Could not resolve location name: {}", e);
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

fn unavailable(
    location_id: &str,
    kind: LocationKind,
    location_name: String,
    date: NaiveDate,
    reason: &str,
) -> MenuLookup {
    MenuLookup::Unavailable {
        location_id: location_id.to_string(),
        location_type: kind,
        location_name,
        date,
        reason: reason.to_string(),
    }
}

/// 按菜单中列出的顺序取菜品详情；目录中缺失的 id 跳过
fn meal_dishes(menu: Option<&DailyMenu>, slot: MealSlot, dishes: &HashMap<String, Dish>) -> Vec<DishInfo> {
    let Some(menu) = menu else {
        return Vec::new();
    };
    menu.meal(slot)
        .iter()
        .filter_map(|id| match dishes.get(id) {
            Some(d) => Some(DishInfo::from(d)),
            None => {
                tracing::warn!(dish = %id, "Dish referenced by menu not found in catalog");
                None
            }
        })
        .collect()
}

fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())
}
