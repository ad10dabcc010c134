//! SQLite 持久化（sqlx）
//!
//! 每张表保存完整 JSON 文档，另存用于筛选的列（状态、日期为 ISO 文本，可按字典序比较）。
//! 排期写操作先取进程内写锁，再在同一事务中完成冲突检测与写入。

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tokio::sync::Mutex;

use super::{
    next_revision, plan_status_changes, DishCatalog, MenuCycleStore, ScheduleFilter, ScheduleStore,
    StatusChange, StoreError,
};
use crate::model::{CycleStatus, Dish, Ingredient, LocationKind, MenuCycle, MenuSchedule};
use crate::scheduling::overlap::find_conflicts;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

pub struct SqliteStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

fn decode<T: serde::de::DeserializeOwned>(row: &sqlx::sqlite::SqliteRow) -> Result<T, StoreError> {
    let doc: String = row.try_get("document")?;
    Ok(serde_json::from_str(&doc)?)
}

impl SqliteStore {
    /// 打开（必要时创建）数据库文件并建表
    pub async fn new(db_path: impl AsRef<Path>, max_connections: u32) -> Result<Self, StoreError> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(&db_url)
            .await?;

        let store = Self::from_pool(pool);
        store.init_tables().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn init_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS menu_schedules (
                id TEXT PRIMARY KEY,
                menu_cycle_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                document TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_schedules_status ON menu_schedules(status)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_schedules_dates ON menu_schedules(start_date, end_date)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS menu_cycles (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL,
                document TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE TABLE IF NOT EXISTS dishes (id TEXT PRIMARY KEY, document TEXT NOT NULL)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE TABLE IF NOT EXISTS ingredients (id TEXT PRIMARY KEY, document TEXT NOT NULL)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// 与候选区间相交的 active / future 排期
    async fn live_overlapping(
        conn: &mut SqliteConnection,
        candidate: &MenuSchedule,
    ) -> Result<Vec<MenuSchedule>, StoreError> {
        let rows = sqlx::query(
            "SELECT document FROM menu_schedules
             WHERE status IN ('active', 'future') AND start_date <= ? AND end_date >= ?",
        )
        .bind(candidate.end_date.to_string())
        .bind(candidate.start_date.to_string())
        .fetch_all(&mut *conn)
        .await?;
        rows.iter().map(decode).collect()
    }

    async fn write_schedule(conn: &mut SqliteConnection, s: &MenuSchedule) -> Result<(), StoreError> {
        let doc = serde_json::to_string(s)?;
        sqlx::query(
            "INSERT INTO menu_schedules (id, menu_cycle_id, start_date, end_date, status, created_at, document)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                menu_cycle_id = excluded.menu_cycle_id,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                status = excluded.status,
                document = excluded.document",
        )
        .bind(&s.id)
        .bind(&s.menu_cycle_id)
        .bind(s.start_date.to_string())
        .bind(s.end_date.to_string())
        .bind(s.status.as_str())
        .bind(s.created_at.to_rfc3339())
        .bind(doc)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn current(conn: &mut SqliteConnection, id: &str) -> Result<Option<MenuSchedule>, StoreError> {
        let row = sqlx::query("SELECT document FROM menu_schedules WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn exists(conn: &mut SqliteConnection, id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM menu_schedules WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn documents_by_ids<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        ids: &[String],
        id_of: impl Fn(&T) -> &str,
    ) -> Result<Vec<T>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT document FROM {} WHERE id IN (", table));
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id.clone());
        }
        sep.push_unseparated(")");
        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut by_id: HashMap<String, T> = HashMap::new();
        for row in &rows {
            let item: T = decode(row)?;
            by_id.insert(id_of(&item).to_string(), item);
        }
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

#[async_trait]
impl ScheduleStore for SqliteStore {
    async fn get(&self, id: &str) -> Result<Option<MenuSchedule>, StoreError> {
        let row = sqlx::query("SELECT document FROM menu_schedules WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn list(&self, filter: &ScheduleFilter) -> Result<Vec<MenuSchedule>, StoreError> {
        let rows = sqlx::query(
            "SELECT document FROM menu_schedules
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR menu_cycle_id = ?2)",
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.menu_cycle_id.as_deref())
        .fetch_all(&self.pool)
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let s: MenuSchedule = decode(row)?;
            if filter.matches(&s) {
                hits.push(s);
            }
        }
        Ok(filter.paginate(hits))
    }

    async fn find_covering(
        &self,
        location_id: &str,
        kind: LocationKind,
        date: NaiveDate,
    ) -> Result<Option<MenuSchedule>, StoreError> {
        let day = date.to_string();
        let rows = sqlx::query(
            "SELECT document FROM menu_schedules
             WHERE status IN ('active', 'future') AND start_date <= ? AND end_date >= ?
             ORDER BY created_at DESC",
        )
        .bind(&day)
        .bind(&day)
        .fetch_all(&self.pool)
        .await?;

        for row in &rows {
            let s: MenuSchedule = decode(row)?;
            if s.covers(location_id, kind) {
                return Ok(Some(s));
            }
        }
        Ok(None)
    }

    async fn insert_exclusive(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        if Self::exists(&mut tx, &schedule.id).await? {
            return Err(StoreError::Duplicate(format!("Schedule {} already exists", schedule.id)));
        }
        let existing = Self::live_overlapping(&mut tx, &schedule).await?;
        let conflicts = find_conflicts(&schedule, &existing);
        if !conflicts.is_empty() {
            return Err(StoreError::Conflict(conflicts));
        }
        Self::write_schedule(&mut tx, &schedule).await?;
        tx.commit().await?;
        Ok(schedule)
    }

    async fn replace_exclusive(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let Some(stored) = Self::current(&mut tx, &schedule.id).await? else {
            return Err(StoreError::NotFound(format!("Menu schedule {}", schedule.id)));
        };
        let schedule = next_revision(&stored, schedule)?;
        let existing = Self::live_overlapping(&mut tx, &schedule).await?;
        let conflicts = find_conflicts(&schedule, &existing);
        if !conflicts.is_empty() {
            return Err(StoreError::Conflict(conflicts));
        }
        Self::write_schedule(&mut tx, &schedule).await?;
        tx.commit().await?;
        Ok(schedule)
    }

    async fn replace(&self, schedule: MenuSchedule) -> Result<MenuSchedule, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let Some(stored) = Self::current(&mut tx, &schedule.id).await? else {
            return Err(StoreError::NotFound(format!("Menu schedule {}", schedule.id)));
        };
        let schedule = next_revision(&stored, schedule)?;
        Self::write_schedule(&mut tx, &schedule).await?;
        tx.commit().await?;
        Ok(schedule)
    }

    async fn delete(&self, id: &str) -> Result<Option<MenuSchedule>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT document FROM menu_schedules WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let schedule: MenuSchedule = decode(&row)?;
        sqlx::query("DELETE FROM menu_schedules WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(schedule))
    }

    async fn refresh_statuses(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<StatusChange>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query("SELECT document FROM menu_schedules WHERE status IN ('active', 'future')")
            .fetch_all(&mut *tx)
            .await?;
        let live: Vec<MenuSchedule> = rows.iter().map(decode).collect::<Result<_, _>>()?;

        let changes = plan_status_changes(live.iter(), today);
        for change in &changes {
            if let Some(s) = live.iter().find(|s| s.id == change.schedule_id) {
                let mut updated = s.clone();
                updated.status = change.to;
                updated.updated_at = now;
                updated.revision += 1;
                Self::write_schedule(&mut tx, &updated).await?;
            }
        }
        tx.commit().await?;
        Ok(changes)
    }
}

#[async_trait]
impl MenuCycleStore for SqliteStore {
    async fn get_cycle(&self, id: &str) -> Result<Option<MenuCycle>, StoreError> {
        let row = sqlx::query("SELECT document FROM menu_cycles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn list_cycles(&self, status: Option<CycleStatus>) -> Result<Vec<MenuCycle>, StoreError> {
        let rows = sqlx::query("SELECT document FROM menu_cycles WHERE (?1 IS NULL OR status = ?1) ORDER BY name")
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode).collect()
    }

    async fn insert_cycle(&self, cycle: MenuCycle) -> Result<MenuCycle, StoreError> {
        let doc = serde_json::to_string(&cycle)?;
        let result = sqlx::query("INSERT INTO menu_cycles (id, name, status, document) VALUES (?, ?, ?, ?)")
            .bind(&cycle.id)
            .bind(&cycle.name)
            .bind(cycle.status.as_str())
            .bind(doc)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(cycle),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Duplicate(format!(
                "Menu cycle with name '{}' already exists",
                cycle.name
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DishCatalog for SqliteStore {
    async fn dishes_by_ids(&self, ids: &[String]) -> Result<Vec<Dish>, StoreError> {
        self.documents_by_ids("dishes", ids, |d: &Dish| d.id.as_str()).await
    }

    async fn ingredients_by_ids(&self, ids: &[String]) -> Result<Vec<Ingredient>, StoreError> {
        self.documents_by_ids("ingredients", ids, |i: &Ingredient| i.id.as_str()).await
    }

    async fn upsert_dish(&self, dish: Dish) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO dishes (id, document) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET document = excluded.document",
        )
        .bind(&dish.id)
        .bind(serde_json::to_string(&dish)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_ingredient(&self, ingredient: Ingredient) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO ingredients (id, document) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET document = excluded.document",
        )
        .bind(&ingredient.id)
        .bind(serde_json::to_string(&ingredient)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
