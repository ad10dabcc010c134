//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PAE__*` 覆盖（双下划线表示嵌套，如 `PAE__SERVER__BIND=0.0.0.0:9000`）。

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub seed: SeedSection,
    pub coverage: CoverageSection,
    pub collaborators: CollaboratorsSection,
    pub scheduling: SchedulingSection,
    pub nutrition: NutritionSection,
}

/// [server] 段：HTTP 监听地址
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// [database] 段：SQLite 文件路径；未设置时使用内存存储
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

/// [seed] 段：启动时导入的 JSON 数据（食材、菜品、菜单周期）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SeedSection {
    pub file: Option<PathBuf>,
}

/// [coverage] 段：覆盖范围目录服务
///
/// 配置了 `base_url` 时走 HTTP；否则使用 `locations` 中的静态条目。
#[derive(Debug, Clone, Deserialize)]
pub struct CoverageSection {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    #[serde(default = "default_coverage_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub locations: Vec<StaticLocation>,
}

impl Default for CoverageSection {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            timeout_secs: default_coverage_timeout_secs(),
            locations: Vec::new(),
        }
    }
}

fn default_coverage_timeout_secs() -> u64 {
    10
}

/// [[coverage.locations]] 条目
#[derive(Debug, Clone, Deserialize)]
pub struct StaticLocation {
    pub id: String,
    /// campus / town
    pub kind: String,
    pub name: String,
}

/// [collaborators] 段：存储、目录、菜品目录调用的统一超时
#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorsSection {
    #[serde(default = "default_collaborator_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CollaboratorsSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_collaborator_timeout_secs(),
        }
    }
}

fn default_collaborator_timeout_secs() -> u64 {
    15
}

/// [scheduling] 段：状态刷新周期（秒），0 表示关闭
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingSection {
    #[serde(default = "default_status_sweep_secs")]
    pub status_sweep_secs: u64,
}

impl Default for SchedulingSection {
    fn default() -> Self {
        Self {
            status_sweep_secs: default_status_sweep_secs(),
        }
    }
}

fn default_status_sweep_secs() -> u64 {
    3600
}

/// [nutrition] 段：充足度阈值、均衡目标、营养需求档案
#[derive(Debug, Clone, Deserialize)]
pub struct NutritionSection {
    #[serde(default = "default_age_group")]
    pub default_age_group: String,
    #[serde(default)]
    pub adequacy: AdequacyThresholds,
    #[serde(default)]
    pub balance: BalanceTargets,
    #[serde(default = "default_profiles")]
    pub profiles: HashMap<String, RequirementProfile>,
}

impl Default for NutritionSection {
    fn default() -> Self {
        Self {
            default_age_group: default_age_group(),
            adequacy: AdequacyThresholds::default(),
            balance: BalanceTargets::default(),
            profiles: default_profiles(),
        }
    }
}

fn default_age_group() -> String {
    "school_age_6_12".to_string()
}

/// 每人每日均值达到阈值才计分；`fiber` 只用于建议
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdequacyThresholds {
    pub calories: f64,
    pub protein: f64,
    pub calcium: f64,
    pub iron: f64,
    pub fiber: f64,
    /// 少于该数量的食物组时给出多样性提示
    pub min_food_groups: usize,
}

impl Default for AdequacyThresholds {
    fn default() -> Self {
        Self {
            calories: 1500.0,
            protein: 40.0,
            calcium: 800.0,
            iron: 8.0,
            fiber: 20.0,
            min_food_groups: 4,
        }
    }
}

/// 理想份数占比（均衡分）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BalanceTargets {
    pub grains: f64,
    pub protein: f64,
    pub vegetables: f64,
    pub fruits: f64,
    pub dairy: f64,
    pub legumes: f64,
    pub other: f64,
}

impl Default for BalanceTargets {
    fn default() -> Self {
        Self {
            grains: 0.30,
            protein: 0.25,
            vegetables: 0.25,
            fruits: 0.15,
            dairy: 0.15,
            legumes: 0.05,
            other: 0.05,
        }
    }
}

/// 某年龄段的每日营养需求
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequirementProfile {
    pub calories: f64,
    pub protein: f64,
    pub calcium: f64,
    pub iron: f64,
    pub vitamin_c: f64,
    pub vitamin_a: f64,
    #[serde(default)]
    pub fiber: Option<f64>,
    /// 钠是上限而非下限
    #[serde(default)]
    pub sodium_limit: Option<f64>,
    #[serde(default)]
    pub fat_limit: Option<f64>,
}

fn default_profiles() -> HashMap<String, RequirementProfile> {
    let mut profiles = HashMap::new();
    profiles.insert(
        "school_age_6_12".to_string(),
        RequirementProfile {
            calories: 1800.0,
            protein: 45.0,
            calcium: 1000.0,
            iron: 10.0,
            vitamin_c: 45.0,
            vitamin_a: 700.0,
            fiber: None,
            sodium_limit: Some(1900.0),
            fat_limit: Some(70.0),
        },
    );
    profiles.insert(
        "school_age_13_18".to_string(),
        RequirementProfile {
            calories: 2200.0,
            protein: 55.0,
            calcium: 1200.0,
            iron: 12.0,
            vitamin_c: 75.0,
            vitamin_a: 900.0,
            fiber: None,
            sodium_limit: Some(2300.0),
            fat_limit: Some(85.0),
        },
    );
    profiles
}

/// 从 config 目录加载配置，环境变量 PAE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 PAE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PAE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_complete() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.nutrition.default_age_group, "school_age_6_12");
        assert!(cfg.nutrition.profiles.contains_key("school_age_13_18"));
        assert_eq!(cfg.nutrition.adequacy.min_food_groups, 4);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "127.0.0.1:9999"

[nutrition.adequacy]
calories = 1200.0

[[coverage.locations]]
id = "101"
kind = "campus"
name = "Sede Central"
"#,
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:9999");
        assert_eq!(cfg.nutrition.adequacy.calories, 1200.0);
        assert_eq!(cfg.nutrition.adequacy.protein, 40.0);
        assert_eq!(cfg.coverage.locations.len(), 1);
        assert_eq!(cfg.coverage.locations[0].name, "Sede Central");
    }
}
