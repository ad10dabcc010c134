//! 营养汇总的数据结构

use std::collections::BTreeMap;
use std::ops::AddAssign;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RequirementProfile;
use crate::model::{LocationKind, NutritionalInfo};

/// 跟踪的十种营养素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbohydrates,
    Fat,
    Fiber,
    Sodium,
    Calcium,
    Iron,
    VitaminC,
    VitaminA,
}

impl Nutrient {
    pub fn label(&self) -> &'static str {
        match self {
            Nutrient::Calories => "Energy/Calories",
            Nutrient::Protein => "Protein",
            Nutrient::Carbohydrates => "Carbohydrates",
            Nutrient::Fat => "Fat",
            Nutrient::Fiber => "Fiber",
            Nutrient::Sodium => "Sodium",
            Nutrient::Calcium => "Calcium",
            Nutrient::Iron => "Iron",
            Nutrient::VitaminC => "Vitamin C",
            Nutrient::VitaminA => "Vitamin A",
        }
    }
}

/// 可累加的营养素向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientSummary {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbohydrates: f64,
    pub total_fat: f64,
    pub total_fiber: f64,
    pub total_sodium: f64,
    pub total_calcium: f64,
    pub total_iron: f64,
    pub total_vitamin_c: f64,
    pub total_vitamin_a: f64,
}

impl NutrientSummary {
    pub fn from_info(info: &NutritionalInfo) -> Self {
        Self {
            total_calories: info.calories.unwrap_or(0.0),
            total_protein: info.protein.unwrap_or(0.0),
            total_carbohydrates: info.carbohydrates.unwrap_or(0.0),
            total_fat: info.fat.unwrap_or(0.0),
            total_fiber: info.fiber.unwrap_or(0.0),
            total_sodium: info.sodium.unwrap_or(0.0),
            total_calcium: info.calcium.unwrap_or(0.0),
            total_iron: info.iron.unwrap_or(0.0),
            total_vitamin_c: info.vitamin_c.unwrap_or(0.0),
            total_vitamin_a: info.vitamin_a.unwrap_or(0.0),
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.total_calories,
            Nutrient::Protein => self.total_protein,
            Nutrient::Carbohydrates => self.total_carbohydrates,
            Nutrient::Fat => self.total_fat,
            Nutrient::Fiber => self.total_fiber,
            Nutrient::Sodium => self.total_sodium,
            Nutrient::Calcium => self.total_calcium,
            Nutrient::Iron => self.total_iron,
            Nutrient::VitaminC => self.total_vitamin_c,
            Nutrient::VitaminA => self.total_vitamin_a,
        }
    }

    /// 各项除以 divisor；divisor 为 0 时返回零向量
    pub fn per(&self, divisor: f64) -> Self {
        if divisor <= 0.0 {
            return Self::default();
        }
        Self {
            total_calories: self.total_calories / divisor,
            total_protein: self.total_protein / divisor,
            total_carbohydrates: self.total_carbohydrates / divisor,
            total_fat: self.total_fat / divisor,
            total_fiber: self.total_fiber / divisor,
            total_sodium: self.total_sodium / divisor,
            total_calcium: self.total_calcium / divisor,
            total_iron: self.total_iron / divisor,
            total_vitamin_c: self.total_vitamin_c / divisor,
            total_vitamin_a: self.total_vitamin_a / divisor,
        }
    }
}

impl AddAssign<&NutrientSummary> for NutrientSummary {
    fn add_assign(&mut self, rhs: &NutrientSummary) {
        self.total_calories += rhs.total_calories;
        self.total_protein += rhs.total_protein;
        self.total_carbohydrates += rhs.total_carbohydrates;
        self.total_fat += rhs.total_fat;
        self.total_fiber += rhs.total_fiber;
        self.total_sodium += rhs.total_sodium;
        self.total_calcium += rhs.total_calcium;
        self.total_iron += rhs.total_iron;
        self.total_vitamin_c += rhs.total_vitamin_c;
        self.total_vitamin_a += rhs.total_vitamin_a;
    }
}

/// 食物组；声明顺序即并列时的优先顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodGroup {
    Grains,
    Legumes,
    Dairy,
    Fruits,
    Vegetables,
    Protein,
    Other,
}

impl FoodGroup {
    pub const ALL: [FoodGroup; 7] = [
        FoodGroup::Grains,
        FoodGroup::Legumes,
        FoodGroup::Dairy,
        FoodGroup::Fruits,
        FoodGroup::Vegetables,
        FoodGroup::Protein,
        FoodGroup::Other,
    ];

    /// Other 是兜底组，不计入多样性
    pub fn is_real(&self) -> bool {
        *self != FoodGroup::Other
    }
}

/// 单个食物组的份数与菜品
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupTally {
    pub servings: u32,
    pub dish_count: usize,
    pub dish_names: Vec<String>,
    #[serde(skip)]
    dish_ids: Vec<String>,
}

impl GroupTally {
    fn record(&mut self, dish_id: &str, dish_name: &str) {
        self.servings += 1;
        self.note_dish(dish_id, dish_name);
    }

    fn note_dish(&mut self, dish_id: &str, dish_name: &str) {
        if !self.dish_ids.iter().any(|id| id == dish_id) {
            self.dish_ids.push(dish_id.to_string());
            self.dish_names.push(dish_name.to_string());
            self.dish_count = self.dish_ids.len();
        }
    }

    fn merge(&mut self, other: &GroupTally) {
        self.servings += other.servings;
        for (id, name) in other.dish_ids.iter().zip(other.dish_names.iter()) {
            self.note_dish(id, name);
        }
    }
}

/// 按食物组的汇总；总是包含全部七个组
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FoodGroupSummary {
    groups: BTreeMap<FoodGroup, GroupTally>,
}

impl Default for FoodGroupSummary {
    fn default() -> Self {
        Self {
            groups: FoodGroup::ALL.iter().map(|g| (*g, GroupTally::default())).collect(),
        }
    }
}

impl FoodGroupSummary {
    /// 记录一份菜品（同一菜品出现多次记多份）
    pub fn record(&mut self, group: FoodGroup, dish_id: &str, dish_name: &str) {
        self.groups.entry(group).or_default().record(dish_id, dish_name);
    }

    pub fn merge(&mut self, other: &FoodGroupSummary) {
        for (group, tally) in &other.groups {
            self.groups.entry(*group).or_default().merge(tally);
        }
    }

    pub fn get(&self, group: FoodGroup) -> Option<&GroupTally> {
        self.groups.get(&group)
    }

    pub fn servings(&self, group: FoodGroup) -> u32 {
        self.groups.get(&group).map_or(0, |t| t.servings)
    }

    pub fn total_servings(&self) -> u32 {
        self.groups.values().map(|t| t.servings).sum()
    }

    /// 不同菜品总数（每道菜只属于一个组）
    pub fn distinct_dishes(&self) -> usize {
        self.groups.values().map(|t| t.dish_count).sum()
    }

    /// 有份数的真实食物组（不含 Other）
    pub fn present_groups(&self) -> Vec<FoodGroup> {
        FoodGroup::ALL
            .iter()
            .copied()
            .filter(|g| g.is_real() && self.servings(*g) > 0)
            .collect()
    }

    pub fn servings_by_group(&self) -> BTreeMap<FoodGroup, u32> {
        FoodGroup::ALL.iter().map(|g| (*g, self.servings(*g))).collect()
    }

    /// 各组份数占比（百分比）；无份数时全为 0
    pub fn distribution(&self) -> BTreeMap<FoodGroup, f64> {
        let total = f64::from(self.total_servings());
        FoodGroup::ALL
            .iter()
            .map(|g| {
                let pct = if total > 0.0 {
                    f64::from(self.servings(*g)) / total * 100.0
                } else {
                    0.0
                };
                (*g, pct)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Nutrient,
    FoodGroup,
    Diversity,
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
}

impl Recommendation {
    pub fn new(kind: RecommendationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// 某地点某日
#[derive(Debug, Clone, Serialize)]
pub struct DailyNutrition {
    pub date: NaiveDate,
    pub cycle_day: u32,
    pub nutrients: NutrientSummary,
    pub food_groups: FoodGroupSummary,
    pub total_servings: u32,
}

/// 某地点整个排期区间
#[derive(Debug, Clone, Serialize)]
pub struct LocationNutrition {
    pub location_id: String,
    pub location_type: LocationKind,
    pub location_name: String,
    pub days: Vec<DailyNutrition>,
    pub period_total: NutrientSummary,
    pub food_groups: FoodGroupSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionalAnalysisReport {
    pub schedule_id: String,
    pub menu_cycle_id: String,
    pub menu_cycle_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: i64,
    pub location_count: usize,
    pub locations: Vec<LocationNutrition>,
    pub overall_summary: NutrientSummary,
    pub overall_food_groups: FoodGroupSummary,
    /// 每人每日均值：总量 ÷ (天数 × 地点数)
    pub average_daily_nutrients: NutrientSummary,
    pub adequacy_score: f64,
    pub recommendations: Vec<Recommendation>,
    pub analysis_date: DateTime<Utc>,
}

impl NutritionalAnalysisReport {
    pub fn person_days(&self) -> i64 {
        self.total_days * self.location_count as i64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimplifiedSummary {
    pub schedule_id: String,
    pub menu_cycle_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: i64,
    pub location_count: usize,
    pub total_person_days: i64,
    pub avg_daily_calories: f64,
    pub avg_daily_protein: f64,
    pub avg_daily_carbohydrates: f64,
    pub avg_daily_fat: f64,
    pub servings_by_group: BTreeMap<FoodGroup, u32>,
    pub food_group_distribution: BTreeMap<FoodGroup, f64>,
    pub distinct_dishes: usize,
    pub adequacy_score: f64,
    pub balance_score: f64,
    pub variety_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ComplianceStatus {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 90.0 {
            ComplianceStatus::Excellent
        } else if pct >= 80.0 {
            ComplianceStatus::Good
        } else if pct >= 70.0 {
            ComplianceStatus::Fair
        } else {
            ComplianceStatus::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientCompliance {
    pub nutrient: Nutrient,
    pub label: &'static str,
    pub actual: f64,
    pub required: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub schedule_id: String,
    /// 实际使用的需求档案（未知年龄段会回退到默认档案）
    pub age_group: String,
    pub requirements: RequirementProfile,
    pub actual_intake: NutrientSummary,
    pub compliance: Vec<NutrientCompliance>,
    pub overall_compliance: f64,
    pub compliance_status: ComplianceStatus,
    pub improvement_areas: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodGroupAnalysis {
    pub schedule_id: String,
    pub food_groups: FoodGroupSummary,
    pub diversity: usize,
    pub food_group_distribution: BTreeMap<FoodGroup, f64>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroDistribution {
    pub protein_pct: f64,
    pub carbohydrates_pct: f64,
    pub fat_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutrientAnalysis {
    pub schedule_id: String,
    pub average_daily_nutrients: NutrientSummary,
    pub macronutrient_distribution: MacroDistribution,
    pub adequacy_score: f64,
    pub recommendations: Vec<Recommendation>,
}
