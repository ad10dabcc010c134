//! 菜单排期：将周期分配到一组地点的具体日期区间

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::MenuError;

/// 覆盖地点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Campus,
    Town,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Campus => "campus",
            LocationKind::Town => "town",
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationKind {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "campus" => Ok(LocationKind::Campus),
            "town" => Ok(LocationKind::Town),
            other => Err(MenuError::validation(format!(
                "Invalid location type '{}'. Expected 'campus' or 'town'",
                other
            ))),
        }
    }
}

/// 排期覆盖的一个地点；名称在分配时记录，之后不再重新解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub location_id: String,
    pub location_type: LocationKind,
    pub location_name: String,
}

impl Coverage {
    pub fn matches(&self, location_id: &str, kind: LocationKind) -> bool {
        self.location_id == location_id && self.location_type == kind
    }

    pub fn same_location(&self, other: &Coverage) -> bool {
        self.matches(&other.location_id, other.location_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Future,
    Active,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Future => "future",
            ScheduleStatus::Active => "active",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }

    /// 只有 active / future 排期参与冲突检测，也只有它们可编辑
    pub fn is_live(&self) -> bool {
        matches!(self, ScheduleStatus::Active | ScheduleStatus::Future)
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "future" => Ok(ScheduleStatus::Future),
            "active" => Ok(ScheduleStatus::Active),
            "completed" => Ok(ScheduleStatus::Completed),
            "cancelled" => Ok(ScheduleStatus::Cancelled),
            other => Err(MenuError::validation(format!("Invalid schedule status '{}'", other))),
        }
    }
}

/// 分配时的初始状态：开始日期晚于今天为 future，否则 active
pub fn initial_status(start: NaiveDate, today: NaiveDate) -> ScheduleStatus {
    if start > today {
        ScheduleStatus::Future
    } else {
        ScheduleStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationInfo {
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

/// 闭区间 [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, MenuError> {
        if end < start {
            return Err(MenuError::validation("End date cannot be before start date"));
        }
        Ok(Self { start, end })
    }

    /// 闭区间相交：s1 ≤ e2 且 s2 ≤ e1（首尾相接的同一天也算重叠）
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// 包含首尾的天数
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.len_days()).map(move |offset| start + Duration::days(offset))
    }
}

/// 给定日期对应的周期日（1..=D）：((date − start) mod D) + 1
pub fn cyclic_day(start: NaiveDate, date: NaiveDate, duration_days: u32) -> u32 {
    let d = i64::from(duration_days.max(1));
    ((date - start).num_days().rem_euclid(d) + 1) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSchedule {
    pub id: String,
    pub menu_cycle_id: String,
    pub coverage: Vec<Coverage>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
    #[serde(default)]
    pub cancellation: Option<CancellationInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 每次写入递增；覆盖写入时必须与读取时一致
    #[serde(default)]
    pub revision: u64,
}

impl MenuSchedule {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn covers(&self, location_id: &str, kind: LocationKind) -> bool {
        self.coverage.iter().any(|c| c.matches(location_id, kind))
    }

    pub fn cyclic_day(&self, date: NaiveDate, duration_days: u32) -> u32 {
        cyclic_day(self.start_date, date, duration_days)
    }

    /// 按今天推算生命周期状态；已取消的排期保持不变
    pub fn status_as_of(&self, today: NaiveDate) -> ScheduleStatus {
        match self.status {
            ScheduleStatus::Cancelled => ScheduleStatus::Cancelled,
            _ if self.end_date < today => ScheduleStatus::Completed,
            ScheduleStatus::Completed => ScheduleStatus::Completed,
            _ => initial_status(self.start_date, today),
        }
    }
}
