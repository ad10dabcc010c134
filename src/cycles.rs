//! 菜单周期服务：创建（校验 + 名称唯一）、查询、列表

use std::sync::Arc;
use std::time::Duration;

use crate::core::{within, Clock, MenuError};
use crate::model::{CycleStatus, MenuCycle, NewMenuCycle};
use crate::store::{MenuCycleStore, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

pub struct MenuCycleService {
    store: Arc<dyn MenuCycleStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl MenuCycleService {
    pub fn new(store: Arc<dyn MenuCycleStore>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self { store, clock, timeout }
    }

    pub async fn create(&self, draft: NewMenuCycle) -> Result<MenuCycle, MenuError> {
        let cycle = MenuCycle::from_draft(draft, self.clock.now());
        cycle.validate()?;
        let saved = self.store.insert_cycle(cycle).await?;
        tracing::info!(cycle = %saved.id, name = %saved.name, days = saved.duration_days, "Menu cycle created");
        Ok(saved)
    }

    pub async fn get(&self, id: &str) -> Result<MenuCycle, MenuError> {
        within(self.timeout, "menu cycle read", self.store.get_cycle(id))
            .await?
            .ok_or_else(|| MenuError::not_found(format!("Menu cycle with id '{}' not found", id)))
    }

    pub async fn list(
        &self,
        status: Option<CycleStatus>,
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<MenuCycle>, MenuError> {
        let all = within(self.timeout, "menu cycle list", self.store.list_cycles(status)).await?;
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        Ok(all.into_iter().skip(skip.unwrap_or(0)).take(limit).collect())
    }
}
