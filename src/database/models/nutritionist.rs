use serde::Serialize;
use sqlx::FromRow;

/// Focus-based narrowing of the nutritionist directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutritionistSort {
    Vegan,
    Vegetarian,
    VeganAndVegetarian,
}

impl NutritionistSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vegan" => Some(NutritionistSort::Vegan),
            "vegetarian" => Some(NutritionistSort::Vegetarian),
            "veganAndVegetarian" => Some(NutritionistSort::VeganAndVegetarian),
            _ => None,
        }
    }

    /// Stored `focus` value the criterion selects
    pub fn focus(&self) -> &'static str {
        match self {
            NutritionistSort::Vegan => "vegana",
            NutritionistSort::Vegetarian => "vegetariana",
            NutritionistSort::VeganAndVegetarian => "vegana_e_vegetariana",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NutritionistCard {
    pub id: i64,
    pub cover_picture: Option<String>,
    pub profile_picture: Option<String>,
    pub name: String,
    pub focus: String,
    pub number_of_published_recipes: i64,
    pub number_of_articles_written: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_maps_to_focus() {
        assert_eq!(NutritionistSort::parse("veganAndVegetarian").map(|s| s.focus()), Some("vegana_e_vegetariana"));
        assert_eq!(NutritionistSort::parse("vegan").map(|s| s.focus()), Some("vegana"));
        assert_eq!(NutritionistSort::parse("keto"), None);
    }
}
