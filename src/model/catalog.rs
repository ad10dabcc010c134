//! 菜品与食材（只读目录，营养分析使用）

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    #[default]
    Active,
    Inactive,
}

/// 菜品类型，用于食物组归类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishType {
    Protein,
    Cereal,
    Legume,
    Vegetable,
    Fruit,
    Dairy,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portion {
    pub ingredient_id: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Recipe {
    #[serde(default)]
    pub ingredients: Vec<Portion>,
}

/// 每份营养信息；缺失的字段按 0 计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NutritionalInfo {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sodium: Option<f64>,
    pub calcium: Option<f64>,
    pub iron: Option<f64>,
    pub vitamin_c: Option<f64>,
    pub vitamin_a: Option<f64>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: CatalogStatus,
    #[serde(default)]
    pub dish_type: Option<DishType>,
    #[serde(default)]
    pub recipe: Recipe,
    #[serde(default)]
    pub nutritional_info: NutritionalInfo,
}

impl Dish {
    pub fn ingredient_ids(&self) -> impl Iterator<Item = &str> {
        self.recipe.ingredients.iter().map(|p| p.ingredient_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// 西语分类名，如 cereales、legumbres、lacteos
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: CatalogStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dish_deserializes_with_sparse_nutrition() {
        let dish: Dish = serde_json::from_value(serde_json::json!({
            "id": "d1",
            "name": "Arroz con pollo",
            "dish_type": "protein",
            "recipe": {"ingredients": [{"ingredient_id": "i1", "quantity": 80.0, "unit": "g"}]},
            "nutritional_info": {"calories": 450.0, "protein": 22.5}
        }))
        .unwrap();
        assert_eq!(dish.dish_type, Some(DishType::Protein));
        assert_eq!(dish.nutritional_info.calories, Some(450.0));
        assert_eq!(dish.nutritional_info.sodium, None);
        assert_eq!(dish.ingredient_ids().collect::<Vec<_>>(), vec!["i1"]);
        assert_eq!(dish.status, CatalogStatus::Active);
    }
}
