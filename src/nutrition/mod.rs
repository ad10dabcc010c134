//! 营养汇总：按排期逐日、逐地点累加营养素与食物组，生成报告与评分

pub mod classify;
pub mod engine;
pub mod requirements;
pub mod scoring;
pub mod types;

pub use classify::{classify, Classification};
pub use engine::{macro_distribution, NutritionEngine};
pub use requirements::RequirementTable;
pub use types::{
    ComparisonReport, ComplianceStatus, DailyNutrition, FoodGroup, FoodGroupAnalysis, FoodGroupSummary,
    GroupTally, LocationNutrition, MacroDistribution, Nutrient, NutrientAnalysis, NutrientCompliance,
    NutrientSummary, NutritionalAnalysisReport, Recommendation, RecommendationKind, SimplifiedSummary,
};
