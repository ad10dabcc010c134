//! 营养汇总引擎
//!
//! 遍历排期区间的每一天、每个地点，解析当日生效菜单，累加营养素与食物组，
//! 再汇总为报告、简要摘要、需求比较等视图。菜品与食材各只查询一次。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use super::classify::{classify, needs_ingredients};
use super::requirements::{
    compliance, compliance_recommendations, improvement_areas, overall, RequirementTable,
};
use super::scoring::{
    adequacy_score, balance_score, food_group_recommendations, nutrient_recommendations, recommendations,
    variety_score,
};
use super::types::{
    ComparisonReport, DailyNutrition, FoodGroup, FoodGroupAnalysis, FoodGroupSummary, LocationNutrition,
    MacroDistribution, NutrientAnalysis, NutrientSummary, NutritionalAnalysisReport, SimplifiedSummary,
};
use crate::config::NutritionSection;
use crate::core::{within, Clock, MenuError};
use crate::model::{Dish, Ingredient, MenuCycle};
use crate::store::{DishCatalog, MenuCycleStore, ScheduleStore};

/// 一个周期日的汇总（所有地点共用同一份）
#[derive(Debug, Clone, Default)]
struct DayTally {
    nutrients: NutrientSummary,
    food_groups: FoodGroupSummary,
    servings: u32,
}

pub struct NutritionEngine {
    schedules: Arc<dyn ScheduleStore>,
    cycles: Arc<dyn MenuCycleStore>,
    catalog: Arc<dyn DishCatalog>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    settings: NutritionSection,
    requirements: RequirementTable,
}

impl NutritionEngine {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        cycles: Arc<dyn MenuCycleStore>,
        catalog: Arc<dyn DishCatalog>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
        settings: NutritionSection,
    ) -> Self {
        let requirements = RequirementTable::from_config(&settings);
        Self {
            schedules,
            cycles,
            catalog,
            clock,
            timeout,
            settings,
            requirements,
        }
    }

    /// 完整营养分析报告
    pub async fn analyze(&self, schedule_id: &str) -> Result<NutritionalAnalysisReport, MenuError> {
        let schedule = within(self.timeout, "schedule read", self.schedules.get(schedule_id))
            .await?
            .ok_or_else(|| MenuError::not_found(format!("Menu schedule with id '{}' not found", schedule_id)))?;
        let cycle = within(self.timeout, "menu cycle read", self.cycles.get_cycle(&schedule.menu_cycle_id))
            .await?
            .ok_or_else(|| {
                MenuError::not_found(format!("Menu cycle with id '{}' not found", schedule.menu_cycle_id))
            })?;

        let day_tallies = self.tally_cycle_days(&cycle).await?;
        let range = schedule.range();

        let mut locations = Vec::with_capacity(schedule.coverage.len());
        let mut overall_summary = NutrientSummary::default();
        let mut overall_food_groups = FoodGroupSummary::default();

        for cov in &schedule.coverage {
            let mut days = Vec::with_capacity(range.len_days() as usize);
            let mut period_total = NutrientSummary::default();
            let mut period_groups = FoodGroupSummary::default();

            for date in range.days() {
                let cycle_day = schedule.cyclic_day(date, cycle.duration_days);
                let tally = day_tallies.get(&cycle_day).cloned().unwrap_or_default();
                period_total += &tally.nutrients;
                period_groups.merge(&tally.food_groups);
                days.push(DailyNutrition {
                    date,
                    cycle_day,
                    nutrients: tally.nutrients,
                    food_groups: tally.food_groups,
                    total_servings: tally.servings,
                });
            }

            overall_summary += &period_total;
            overall_food_groups.merge(&period_groups);
            locations.push(LocationNutrition {
                location_id: cov.location_id.clone(),
                location_type: cov.location_type,
                location_name: cov.location_name.clone(),
                days,
                period_total,
                food_groups: period_groups,
            });
        }

        let total_days = range.len_days();
        let person_days = (total_days * schedule.coverage.len() as i64).max(1);
        let average_daily_nutrients = overall_summary.per(person_days as f64);
        let adequacy = adequacy_score(&average_daily_nutrients, &overall_food_groups, &self.settings.adequacy);
        let recs = recommendations(&average_daily_nutrients, &overall_food_groups, &self.settings.adequacy);

        tracing::info!(
            schedule = %schedule.id,
            days = total_days,
            locations = schedule.coverage.len(),
            adequacy,
            "Nutritional analysis generated"
        );

        Ok(NutritionalAnalysisReport {
            schedule_id: schedule.id.clone(),
            menu_cycle_id: cycle.id.clone(),
            menu_cycle_name: cycle.name.clone(),
            start_date: schedule.start_date,
            end_date: schedule.end_date,
            total_days,
            location_count: schedule.coverage.len(),
            locations,
            overall_summary,
            overall_food_groups,
            average_daily_nutrients,
            adequacy_score: adequacy,
            recommendations: recs,
            analysis_date: self.clock.now(),
        })
    }

    /// 简要摘要：每人每日均值、各组份数与占比、三项评分
    pub async fn simplified_summary(&self, schedule_id: &str) -> Result<SimplifiedSummary, MenuError> {
        let report = self.analyze(schedule_id).await?;
        let avg = &report.average_daily_nutrients;
        let groups = &report.overall_food_groups;
        Ok(SimplifiedSummary {
            total_person_days: report.person_days(),
            avg_daily_calories: avg.total_calories,
            avg_daily_protein: avg.total_protein,
            avg_daily_carbohydrates: avg.total_carbohydrates,
            avg_daily_fat: avg.total_fat,
            servings_by_group: groups.servings_by_group(),
            food_group_distribution: groups.distribution(),
            distinct_dishes: groups.distinct_dishes(),
            adequacy_score: report.adequacy_score,
            balance_score: balance_score(groups, &self.settings.balance),
            variety_score: variety_score(groups.distinct_dishes()),
            schedule_id: report.schedule_id.clone(),
            menu_cycle_name: report.menu_cycle_name.clone(),
            start_date: report.start_date,
            end_date: report.end_date,
            total_days: report.total_days,
            location_count: report.location_count,
        })
    }

    /// 与年龄段营养需求比较
    pub async fn compare_with_requirements(
        &self,
        schedule_id: &str,
        age_group: Option<&str>,
    ) -> Result<ComparisonReport, MenuError> {
        let report = self.analyze(schedule_id).await?;
        let (age_group, profile) = self.requirements.resolve(age_group);
        let actual = report.average_daily_nutrients;

        let items = compliance(&actual, &profile);
        let (overall_compliance, status) = overall(&items);
        let areas = improvement_areas(&items);
        let recs = compliance_recommendations(&items, &actual, &profile);

        Ok(ComparisonReport {
            schedule_id: report.schedule_id,
            age_group,
            requirements: profile,
            actual_intake: actual,
            compliance: items,
            overall_compliance,
            compliance_status: status,
            improvement_areas: areas,
            recommendations: recs,
        })
    }

    pub async fn food_group_analysis(&self, schedule_id: &str) -> Result<FoodGroupAnalysis, MenuError> {
        let report = self.analyze(schedule_id).await?;
        let groups = report.overall_food_groups;
        Ok(FoodGroupAnalysis {
            schedule_id: report.schedule_id,
            diversity: groups.present_groups().len(),
            food_group_distribution: groups.distribution(),
            recommendations: food_group_recommendations(&groups, &self.settings.adequacy),
            food_groups: groups,
        })
    }

    pub async fn nutrient_analysis(&self, schedule_id: &str) -> Result<NutrientAnalysis, MenuError> {
        let report = self.analyze(schedule_id).await?;
        let avg = report.average_daily_nutrients;
        Ok(NutrientAnalysis {
            schedule_id: report.schedule_id,
            macronutrient_distribution: macro_distribution(&avg),
            adequacy_score: report.adequacy_score,
            recommendations: nutrient_recommendations(&avg, &self.settings.adequacy),
            average_daily_nutrients: avg,
        })
    }

    /// 为周期的每一天计算一次汇总
    async fn tally_cycle_days(&self, cycle: &MenuCycle) -> Result<HashMap<u32, DayTally>, MenuError> {
        let dish_ids: Vec<String> = cycle.dish_ids().into_iter().collect();
        let dishes: HashMap<String, Dish> = within(self.timeout, "dish catalog", self.catalog.dishes_by_ids(&dish_ids))
            .await?
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        for id in dish_ids.iter().filter(|id| !dishes.contains_key(*id)) {
            tracing::warn!(dish = %id, cycle = %cycle.id, "Dish not found in catalog, skipped in analysis");
        }

        let ingredient_ids: Vec<String> = dishes
            .values()
            .filter(|d| needs_ingredients(d))
            .flat_map(|d| d.ingredient_ids().map(str::to_string))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let ingredients: HashMap<String, Ingredient> = if ingredient_ids.is_empty() {
            HashMap::new()
        } else {
            within(self.timeout, "ingredient catalog", self.catalog.ingredients_by_ids(&ingredient_ids))
                .await?
                .into_iter()
                .map(|i| (i.id.clone(), i))
                .collect()
        };

        let groups: HashMap<&str, FoodGroup> = dishes
            .values()
            .map(|d| (d.id.as_str(), classify(d, &ingredients).group()))
            .collect();

        let mut tallies = HashMap::new();
        for menu in &cycle.daily_menus {
            let mut tally = DayTally::default();
            for id in menu.dish_ids() {
                let Some(dish) = dishes.get(id) else { continue };
                tally.nutrients += &NutrientSummary::from_info(&dish.nutritional_info);
                let group = groups.get(dish.id.as_str()).copied().unwrap_or(FoodGroup::Other);
                tally.food_groups.record(group, &dish.id, &dish.name);
                tally.servings += 1;
            }
            tallies.insert(menu.day, tally);
        }
        Ok(tallies)
    }
}

/// 宏量营养素供能占比：蛋白质、碳水 4 kcal/g，脂肪 9 kcal/g
pub fn macro_distribution(avg: &NutrientSummary) -> MacroDistribution {
    if avg.total_calories <= 0.0 {
        return MacroDistribution {
            protein_pct: 0.0,
            carbohydrates_pct: 0.0,
            fat_pct: 0.0,
        };
    }
    MacroDistribution {
        protein_pct: avg.total_protein * 4.0 / avg.total_calories * 100.0,
        carbohydrates_pct: avg.total_carbohydrates * 4.0 / avg.total_calories * 100.0,
        fat_pct: avg.total_fat * 9.0 / avg.total_calories * 100.0,
    }
}
