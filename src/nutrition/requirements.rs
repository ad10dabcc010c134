//! 营养需求档案与达标度比较

use std::collections::HashMap;

use super::types::{ComplianceStatus, Nutrient, NutrientCompliance, NutrientSummary};
use crate::config::{NutritionSection, RequirementProfile};

const IMPROVEMENT_THRESHOLD: f64 = 80.0;
const SEVERE_THRESHOLD: f64 = 50.0;
const EXCESS_THRESHOLD: f64 = 150.0;

/// 可选的需求档案表；未知年龄段回退到默认档案
pub struct RequirementTable {
    profiles: HashMap<String, RequirementProfile>,
    default_group: String,
}

impl RequirementTable {
    pub fn from_config(cfg: &NutritionSection) -> Self {
        let mut profiles = cfg.profiles.clone();
        if profiles.is_empty() {
            profiles = NutritionSection::default().profiles;
        }
        Self {
            profiles,
            default_group: cfg.default_age_group.clone(),
        }
    }

    /// 返回实际采用的 (年龄段, 档案)
    pub fn resolve(&self, age_group: Option<&str>) -> (String, RequirementProfile) {
        if let Some(group) = age_group {
            if let Some(p) = self.profiles.get(group) {
                return (group.to_string(), p.clone());
            }
            tracing::warn!(age_group = group, fallback = %self.default_group, "Unknown age group, using default profile");
        }
        if let Some(p) = self.profiles.get(&self.default_group) {
            return (self.default_group.clone(), p.clone());
        }
        // 默认档案名配置错误时取字典序最小的档案，保证结果稳定
        let mut names: Vec<&String> = self.profiles.keys().collect();
        names.sort();
        let name = names[0].clone();
        let profile = self.profiles[&name].clone();
        (name, profile)
    }
}

/// 下限类营养素的达标百分比；需求为 0 时记为 0
pub fn compliance(avg: &NutrientSummary, profile: &RequirementProfile) -> Vec<NutrientCompliance> {
    let mut tracked = vec![
        (Nutrient::Calories, profile.calories),
        (Nutrient::Protein, profile.protein),
        (Nutrient::Calcium, profile.calcium),
        (Nutrient::Iron, profile.iron),
        (Nutrient::VitaminC, profile.vitamin_c),
        (Nutrient::VitaminA, profile.vitamin_a),
    ];
    if let Some(fiber) = profile.fiber {
        tracked.push((Nutrient::Fiber, fiber));
    }

    tracked
        .into_iter()
        .map(|(nutrient, required)| {
            let actual = avg.get(nutrient);
            NutrientCompliance {
                nutrient,
                label: nutrient.label(),
                actual,
                required,
                percentage: percentage(actual, required),
            }
        })
        .collect()
}

fn percentage(actual: f64, required: f64) -> f64 {
    if required > 0.0 {
        actual / required * 100.0
    } else {
        0.0
    }
}

pub fn overall(items: &[NutrientCompliance]) -> (f64, ComplianceStatus) {
    if items.is_empty() {
        return (0.0, ComplianceStatus::Poor);
    }
    let mean = items.iter().map(|c| c.percentage).sum::<f64>() / items.len() as f64;
    (mean, ComplianceStatus::from_percentage(mean))
}

pub fn improvement_areas(items: &[NutrientCompliance]) -> Vec<String> {
    items
        .iter()
        .filter(|c| c.percentage < IMPROVEMENT_THRESHOLD)
        .map(|c| c.label.to_string())
        .collect()
}

/// 不足项按严重程度给建议；钠、脂肪超过上限 150% 时建议减少
pub fn compliance_recommendations(
    items: &[NutrientCompliance],
    avg: &NutrientSummary,
    profile: &RequirementProfile,
) -> Vec<String> {
    let mut recs: Vec<String> = items
        .iter()
        .filter(|c| c.percentage < IMPROVEMENT_THRESHOLD)
        .map(|c| {
            let degree = if c.percentage < SEVERE_THRESHOLD {
                "Significantly increase"
            } else {
                "Moderately increase"
            };
            format!(
                "{} {} (currently {:.0}% of the daily requirement)",
                degree, c.label, c.percentage
            )
        })
        .collect();

    let limits = [
        (Nutrient::Sodium, profile.sodium_limit),
        (Nutrient::Fat, profile.fat_limit),
    ];
    for (nutrient, limit) in limits {
        let Some(limit) = limit else { continue };
        let pct = percentage(avg.get(nutrient), limit);
        if pct > EXCESS_THRESHOLD {
            recs.push(format!(
                "Consider reducing {} (currently {:.0}% of the recommended limit)",
                nutrient.label().to_lowercase(),
                pct
            ));
        }
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RequirementTable {
        RequirementTable::from_config(&NutritionSection::default())
    }

    #[test]
    fn test_unknown_age_group_falls_back() {
        let (name, profile) = table().resolve(Some("adults"));
        assert_eq!(name, "school_age_6_12");
        assert_eq!(profile.calories, 1800.0);
        let (name, profile) = table().resolve(Some("school_age_13_18"));
        assert_eq!(name, "school_age_13_18");
        assert_eq!(profile.protein, 55.0);
    }

    #[test]
    fn test_compliance_and_status() {
        let (_, profile) = table().resolve(None);
        let avg = NutrientSummary {
            total_calories: 1800.0,
            total_protein: 45.0,
            total_calcium: 500.0,
            total_iron: 10.0,
            total_vitamin_c: 45.0,
            total_vitamin_a: 700.0,
            ..Default::default()
        };
        let items = compliance(&avg, &profile);
        assert_eq!(items.len(), 6);
        let (mean, status) = overall(&items);
        assert!((mean - 550.0 / 6.0).abs() < 1e-9);
        assert_eq!(status, ComplianceStatus::Excellent);
        assert_eq!(improvement_areas(&items), vec!["Calcium"]);
        let recs = compliance_recommendations(&items, &avg, &profile);
        assert_eq!(recs, vec!["Moderately increase Calcium (currently 50% of the daily requirement)"]);
    }

    #[test]
    fn test_sodium_is_a_ceiling() {
        let (_, profile) = table().resolve(None);
        let avg = NutrientSummary {
            total_sodium: 3000.0,
            ..Default::default()
        };
        let items = compliance(&avg, &profile);
        assert!(!improvement_areas(&items).contains(&"Sodium".to_string()));
        let recs = compliance_recommendations(&items, &avg, &profile);
        assert!(recs.iter().any(|r| r.starts_with("Consider reducing sodium")));
        assert!(recs.iter().any(|r| r.starts_with("Significantly increase Energy/Calories")));
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(ComplianceStatus::from_percentage(90.0), ComplianceStatus::Excellent);
        assert_eq!(ComplianceStatus::from_percentage(85.0), ComplianceStatus::Good);
        assert_eq!(ComplianceStatus::from_percentage(70.0), ComplianceStatus::Fair);
        assert_eq!(ComplianceStatus::from_percentage(69.9), ComplianceStatus::Poor);
    }
}
