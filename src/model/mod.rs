//! 领域模型：菜单周期、排期、菜品目录

pub mod catalog;
pub mod cycle;
pub mod schedule;

pub use catalog::{CatalogStatus, Dish, DishType, Ingredient, NutritionalInfo, Portion, Recipe};
pub use cycle::{CycleStatus, DailyMenu, MealSlot, MenuCycle, NewMenuCycle};
pub use schedule::{
    cyclic_day, initial_status, CancellationInfo, Coverage, DateRange, LocationKind, MenuSchedule,
    ScheduleStatus,
};
