//! 评分与建议：充足度、均衡度、多样性

use super::types::{FoodGroup, FoodGroupSummary, NutrientSummary, Recommendation, RecommendationKind};
use crate::config::{AdequacyThresholds, BalanceTargets};

const FOOD_GROUP_POINTS: [(FoodGroup, f64); 6] = [
    (FoodGroup::Grains, 10.0),
    (FoodGroup::Protein, 10.0),
    (FoodGroup::Vegetables, 10.0),
    (FoodGroup::Fruits, 10.0),
    (FoodGroup::Dairy, 5.0),
    (FoodGroup::Legumes, 5.0),
];

/// 充足度 0..=100：每人每日均值达到阈值的营养素得分 + 出现的食物组得分
pub fn adequacy_score(avg: &NutrientSummary, groups: &FoodGroupSummary, th: &AdequacyThresholds) -> f64 {
    let mut score = 0.0;
    if avg.total_calories >= th.calories {
        score += 15.0;
    }
    if avg.total_protein >= th.protein {
        score += 15.0;
    }
    if avg.total_calcium >= th.calcium {
        score += 10.0;
    }
    if avg.total_iron >= th.iron {
        score += 10.0;
    }
    for (group, points) in FOOD_GROUP_POINTS {
        if groups.servings(group) > 0 {
            score += points;
        }
    }
    f64::min(score, 100.0)
}

/// 营养素不足的建议
pub fn nutrient_recommendations(avg: &NutrientSummary, th: &AdequacyThresholds) -> Vec<Recommendation> {
    let checks = [
        (
            avg.total_calories < th.calories,
            "Consider increasing portion sizes or adding more calorie-dense foods to meet energy needs",
        ),
        (
            avg.total_protein < th.protein,
            "Include more protein-rich foods such as legumes, dairy, eggs, or meat",
        ),
        (
            avg.total_calcium < th.calcium,
            "Add more dairy products or calcium-rich foods like cheese, yogurt, or fortified foods",
        ),
        (
            avg.total_iron < th.iron,
            "Include iron-rich foods such as red meat, beans, or fortified cereals",
        ),
        (
            avg.total_fiber < th.fiber,
            "Increase fiber intake with more fruits, vegetables, and whole grains",
        ),
    ];
    checks
        .into_iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, msg)| Recommendation::new(RecommendationKind::Nutrient, msg))
        .collect()
}

/// 缺失食物组与多样性不足的建议
pub fn food_group_recommendations(groups: &FoodGroupSummary, th: &AdequacyThresholds) -> Vec<Recommendation> {
    let missing = [
        (FoodGroup::Fruits, "Add fresh fruits to provide vitamins, minerals, and fiber"),
        (FoodGroup::Vegetables, "Include more vegetables for essential vitamins and minerals"),
        (FoodGroup::Legumes, "Consider adding legumes (beans, lentils) for protein and fiber"),
        (FoodGroup::Dairy, "Include dairy products for calcium and protein"),
    ];
    let mut recs: Vec<Recommendation> = missing
        .into_iter()
        .filter(|(g, _)| groups.servings(*g) == 0)
        .map(|(_, msg)| Recommendation::new(RecommendationKind::FoodGroup, msg))
        .collect();

    if groups.present_groups().len() < th.min_food_groups {
        recs.push(Recommendation::new(
            RecommendationKind::Diversity,
            "Increase food group diversity to ensure balanced nutrition",
        ));
    }
    recs
}

/// 完整建议列表；没有任何问题时给出一条肯定意见
pub fn recommendations(
    avg: &NutrientSummary,
    groups: &FoodGroupSummary,
    th: &AdequacyThresholds,
) -> Vec<Recommendation> {
    let mut recs = nutrient_recommendations(avg, th);
    recs.extend(food_group_recommendations(groups, th));
    if recs.is_empty() {
        recs.push(Recommendation::new(
            RecommendationKind::Balanced,
            "The menu shows good nutritional balance. Continue with current planning",
        ));
    }
    recs
}

fn target_for(group: FoodGroup, targets: &BalanceTargets) -> f64 {
    match group {
        FoodGroup::Grains => targets.grains,
        FoodGroup::Protein => targets.protein,
        FoodGroup::Vegetables => targets.vegetables,
        FoodGroup::Fruits => targets.fruits,
        FoodGroup::Dairy => targets.dairy,
        FoodGroup::Legumes => targets.legumes,
        FoodGroup::Other => targets.other,
    }
}

/// 均衡度：max(0, 100 − 100·Σ|实际占比 − 理想占比|)；无份数时为 0
pub fn balance_score(groups: &FoodGroupSummary, targets: &BalanceTargets) -> f64 {
    let total = f64::from(groups.total_servings());
    if total == 0.0 {
        return 0.0;
    }
    let deviation: f64 = FoodGroup::ALL
        .iter()
        .map(|g| (f64::from(groups.servings(*g)) / total - target_for(*g, targets)).abs())
        .sum();
    f64::max(0.0, 100.0 - deviation * 100.0)
}

/// 多样性：n ≥ 20 → 100；n ≥ 10 → 50 + 4(n − 10)；否则 5n
pub fn variety_score(distinct_dishes: usize) -> f64 {
    let n = distinct_dishes as f64;
    if distinct_dishes >= 20 {
        100.0
    } else if distinct_dishes >= 10 {
        50.0 + (n - 10.0) * 4.0
    } else {
        n * 5.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(entries: &[(FoodGroup, u32)]) -> FoodGroupSummary {
        let mut s = FoodGroupSummary::default();
        for (g, n) in entries {
            for i in 0..*n {
                s.record(*g, &format!("{:?}-{}", g, i), "plato");
            }
        }
        s
    }

    fn avg(calories: f64, protein: f64, calcium: f64, iron: f64, fiber: f64) -> NutrientSummary {
        NutrientSummary {
            total_calories: calories,
            total_protein: protein,
            total_calcium: calcium,
            total_iron: iron,
            total_fiber: fiber,
            ..Default::default()
        }
    }

    #[test]
    fn test_adequacy_full_marks_capped() {
        let all = groups(&[
            (FoodGroup::Grains, 1),
            (FoodGroup::Protein, 1),
            (FoodGroup::Vegetables, 1),
            (FoodGroup::Fruits, 1),
            (FoodGroup::Dairy, 1),
            (FoodGroup::Legumes, 1),
        ]);
        let th = AdequacyThresholds::default();
        assert_eq!(adequacy_score(&avg(1500.0, 40.0, 800.0, 8.0, 25.0), &all, &th), 100.0);
        assert_eq!(adequacy_score(&avg(1499.0, 40.0, 0.0, 0.0, 0.0), &all, &th), 65.0);
        assert_eq!(adequacy_score(&NutrientSummary::default(), &FoodGroupSummary::default(), &th), 0.0);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let th = AdequacyThresholds::default();
        let none = FoodGroupSummary::default();
        assert_eq!(adequacy_score(&avg(1500.0, 40.0, 800.0, 8.0, 0.0), &none, &th), 50.0);
        assert_eq!(adequacy_score(&avg(1499.9, 39.9, 799.9, 7.9, 0.0), &none, &th), 0.0);
    }

    #[test]
    fn test_recommendations_for_poor_menu() {
        let th = AdequacyThresholds::default();
        let recs = recommendations(&avg(1000.0, 20.0, 100.0, 2.0, 5.0), &groups(&[(FoodGroup::Grains, 2)]), &th);
        let kinds: Vec<RecommendationKind> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(kinds.iter().filter(|k| **k == RecommendationKind::Nutrient).count(), 5);
        assert_eq!(kinds.iter().filter(|k| **k == RecommendationKind::FoodGroup).count(), 4);
        assert_eq!(kinds.last(), Some(&RecommendationKind::Diversity));
    }

    #[test]
    fn test_affirmative_note_when_nothing_to_fix() {
        let th = AdequacyThresholds::default();
        let all = groups(&[
            (FoodGroup::Grains, 1),
            (FoodGroup::Vegetables, 1),
            (FoodGroup::Fruits, 1),
            (FoodGroup::Dairy, 1),
            (FoodGroup::Legumes, 1),
        ]);
        let recs = recommendations(&avg(1600.0, 45.0, 900.0, 9.0, 22.0), &all, &th);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::Balanced);
    }

    #[test]
    fn test_balance_score() {
        let targets = BalanceTargets::default();
        assert_eq!(balance_score(&FoodGroupSummary::default(), &targets), 0.0);
        // 全部是谷物：偏差 0.7 + 0.25 + 0.25 + 0.15 + 0.15 + 0.05 + 0.05 = 1.6
        assert_eq!(balance_score(&groups(&[(FoodGroup::Grains, 4)]), &targets), 0.0);
        let mixed = groups(&[
            (FoodGroup::Grains, 6),
            (FoodGroup::Protein, 5),
            (FoodGroup::Vegetables, 5),
            (FoodGroup::Fruits, 2),
            (FoodGroup::Dairy, 2),
        ]);
        let score = balance_score(&mixed, &targets);
        assert!(score > 70.0 && score < 100.0, "score = {}", score);
    }

    #[test]
    fn test_variety_score_steps() {
        assert_eq!(variety_score(0), 0.0);
        assert_eq!(variety_score(4), 20.0);
        assert_eq!(variety_score(10), 50.0);
        assert_eq!(variety_score(15), 70.0);
        assert_eq!(variety_score(25), 100.0);
    }
}
