//! PAE 菜单服务：学校供餐菜单排期与营养汇总
//!
//! 模块划分：
//! - **api**: axum HTTP 接口（`web` feature）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、时钟、超时包装、优雅关闭
//! - **cycles**: 菜单周期的创建与查询
//! - **directory**: 覆盖范围目录（校区 / 乡镇）
//! - **model**: 周期、排期、菜品、食材等领域类型
//! - **nutrition**: 营养汇总、食物组分类、评分与需求对比
//! - **observability**: tracing 日志初始化
//! - **scheduling**: 排期分配、冲突检测、状态流转、生效菜单查询
//! - **seed**: 启动时导入 JSON 种子数据
//! - **store**: 存储抽象与实现（内存 / SQLite）

#[cfg(feature = "web")]
pub mod api;
pub mod config;
pub mod core;
pub mod cycles;
pub mod directory;
pub mod model;
pub mod nutrition;
pub mod observability;
pub mod scheduling;
pub mod seed;
pub mod store;

pub use crate::core::MenuError;
