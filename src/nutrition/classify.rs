//! 菜品 → 食物组归类
//!
//! 三个分支，依次尝试：
//! 1. 菜品声明了类型（且不是 other）→ Declared
//! 2. 按配方食材分类做多数投票，并列取 FoodGroup 声明顺序靠前者 → Inferred
//! 3. 都无法判断 → Residual（归入 Other）

use std::collections::HashMap;

use serde::Serialize;

use super::types::FoodGroup;
use crate::model::{Dish, DishType, Ingredient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "group", rename_all = "snake_case")]
pub enum Classification {
    Declared(FoodGroup),
    Inferred(FoodGroup),
    Residual,
}

impl Classification {
    pub fn group(&self) -> FoodGroup {
        match self {
            Classification::Declared(g) | Classification::Inferred(g) => *g,
            Classification::Residual => FoodGroup::Other,
        }
    }
}

pub fn group_for_dish_type(dish_type: DishType) -> Option<FoodGroup> {
    match dish_type {
        DishType::Cereal => Some(FoodGroup::Grains),
        DishType::Protein => Some(FoodGroup::Protein),
        DishType::Legume => Some(FoodGroup::Legumes),
        DishType::Vegetable => Some(FoodGroup::Vegetables),
        DishType::Fruit => Some(FoodGroup::Fruits),
        DishType::Dairy => Some(FoodGroup::Dairy),
        DishType::Other => None,
    }
}

/// 食材分类（西语，不区分大小写与重音）→ 食物组
pub fn group_for_category(category: &str) -> Option<FoodGroup> {
    let normalized: String = category
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect();
    match normalized.as_str() {
        "cereales" | "tuberculos" => Some(FoodGroup::Grains),
        "legumbres" => Some(FoodGroup::Legumes),
        "proteinas" | "aceites" => Some(FoodGroup::Protein),
        "verduras" | "condimentos" => Some(FoodGroup::Vegetables),
        "frutas" => Some(FoodGroup::Fruits),
        "lacteos" => Some(FoodGroup::Dairy),
        _ => None,
    }
}

/// 是否需要查询食材才能归类
pub fn needs_ingredients(dish: &Dish) -> bool {
    dish.dish_type.and_then(group_for_dish_type).is_none()
}

pub fn classify(dish: &Dish, ingredients: &HashMap<String, Ingredient>) -> Classification {
    if let Some(group) = dish.dish_type.and_then(group_for_dish_type) {
        return Classification::Declared(group);
    }

    let mut votes: HashMap<FoodGroup, usize> = HashMap::new();
    for id in dish.ingredient_ids() {
        let group = ingredients
            .get(id)
            .and_then(|i| i.category.as_deref())
            .and_then(group_for_category);
        if let Some(g) = group {
            *votes.entry(g).or_insert(0) += 1;
        }
    }

    let best = FoodGroup::ALL
        .iter()
        .filter_map(|g| votes.get(g).map(|n| (*g, *n)))
        .fold(None, |acc: Option<(FoodGroup, usize)>, (g, n)| match acc {
            Some((_, best_n)) if best_n >= n => acc,
            _ => Some((g, n)),
        });

    match best {
        Some((group, _)) => Classification::Inferred(group),
        None => Classification::Residual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalogStatus, NutritionalInfo, Portion, Recipe};

    fn ingredient(id: &str, category: Option<&str>) -> Ingredient {
        Ingredient {
            id: id.into(),
            name: id.into(),
            category: category.map(str::to_string),
            status: CatalogStatus::Active,
        }
    }

    fn dish(dish_type: Option<DishType>, ingredient_ids: &[&str]) -> Dish {
        Dish {
            id: "d".into(),
            name: "Plato".into(),
            description: None,
            status: CatalogStatus::Active,
            dish_type,
            recipe: Recipe {
                ingredients: ingredient_ids
                    .iter()
                    .map(|id| Portion {
                        ingredient_id: id.to_string(),
                        quantity: 1.0,
                        unit: "g".into(),
                    })
                    .collect(),
            },
            nutritional_info: NutritionalInfo::default(),
        }
    }

    fn catalog() -> HashMap<String, Ingredient> {
        [
            ingredient("arroz", Some("Cereales")),
            ingredient("papa", Some("tubérculos")),
            ingredient("frijol", Some("legumbres")),
            ingredient("leche", Some("Lácteos")),
            ingredient("sal", None),
        ]
        .into_iter()
        .map(|i| (i.id.clone(), i))
        .collect()
    }

    #[test]
    fn test_declared_type_wins() {
        let d = dish(Some(DishType::Fruit), &["arroz", "papa"]);
        assert_eq!(classify(&d, &catalog()), Classification::Declared(FoodGroup::Fruits));
    }

    #[test]
    fn test_plurality_of_ingredient_categories() {
        let d = dish(None, &["arroz", "papa", "frijol"]);
        assert_eq!(classify(&d, &catalog()), Classification::Inferred(FoodGroup::Grains));
    }

    #[test]
    fn test_tie_resolves_to_canonical_order() {
        let d = dish(Some(DishType::Other), &["leche", "frijol"]);
        assert_eq!(classify(&d, &catalog()), Classification::Inferred(FoodGroup::Legumes));
    }

    #[test]
    fn test_residual_when_nothing_known() {
        let d = dish(None, &["sal", "missing"]);
        let c = classify(&d, &catalog());
        assert_eq!(c, Classification::Residual);
        assert_eq!(c.group(), FoodGroup::Other);
    }
}
