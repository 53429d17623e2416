use crate::model::{ItemCategory, ItemKind, RecipeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A crafting recipe as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    /// Ingredient kind → quantity per crafted unit. Never empty, never zero.
    pub ingredients: BTreeMap<ItemKind, u32>,
    /// Multiplier applied to the configured base craft time.
    pub craft_time_units: u32,
    pub output: ItemKind,
    #[serde(default = "default_output_quantity")]
    pub output_quantity: u32,
    pub category: ItemCategory,
    /// Base durability of each tool produced. Required for [`ItemCategory::Tool`].
    #[serde(default)]
    pub durability: Option<u32>,
    #[serde(default)]
    pub base_experience: u32,
}

fn default_output_quantity() -> u32 {
    1
}

impl Recipe {
    /// Ingredients scaled by a batch quantity.
    pub fn scaled_ingredients(&self, quantity: u32) -> BTreeMap<ItemKind, u64> {
        self.ingredients
            .iter()
            .map(|(kind, amount)| (kind.clone(), *amount as u64 * quantity as u64))
            .collect()
    }

    /// Output units before any quality bonus.
    pub fn base_output(&self, quantity: u32) -> u64 {
        self.output_quantity as u64 * quantity as u64
    }

    pub fn is_tool(&self) -> bool {
        self.category == ItemCategory::Tool
    }
}

/// Outcome bucket of a successful craft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Common,
    Good,
    Excellent,
    Perfect,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rope() -> Recipe {
        Recipe {
            id: "kelp_rope".into(),
            name: "Kelp Rope".into(),
            ingredients: BTreeMap::from([("kelp".into(), 3), ("coral".into(), 1)]),
            craft_time_units: 1,
            output: "rope".into(),
            output_quantity: 2,
            category: ItemCategory::Material,
            durability: None,
            base_experience: 5,
        }
    }

    #[test]
    fn test_scaled_ingredients_multiply_each_entry() {
        let scaled = rope().scaled_ingredients(4);
        assert_eq!(scaled[&ItemKind::from("kelp")], 12);
        assert_eq!(scaled[&ItemKind::from("coral")], 4);
        assert_eq!(rope().base_output(4), 8);
    }
}
