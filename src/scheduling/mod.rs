//! 排期引擎：分配、冲突检测、周期日解析、生命周期管理

pub mod engine;
pub mod overlap;
pub mod types;

pub use engine::SchedulingEngine;
pub use overlap::find_conflicts;
pub use types::{
    AssignRequest, AssignmentSummary, DailyEntry, DeletedSchedule, DishInfo, EffectiveMenu, MenuLookup,
    ScheduleDetailed, UpdateRequest,
};
