use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Tag of anything that can sit in a player's balance: raw resources ("kelp"), intermediate
/// materials ("rope") and crafted outputs ("pry_bar").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKind(pub String);

impl ItemKind {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemKind {
    fn from(kind: &str) -> Self {
        Self(kind.to_string())
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Spawn tier of a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
}

/// Material reported by the surface probe under a candidate spawn point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceMaterial {
    Sand,
    Rock,
    Gravel,
    Mud,
    Coral,
}

/// What a recipe produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Credited as an individual durable record.
    Tool,
    Buildable,
    Consumable,
    Decoration,
    Material,
}
