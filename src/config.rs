//! Static economy configuration.
//!
//! Everything here is read once at startup and then shared read-only (`Arc`) between the
//! placement engine, the node registry and the crafting engine. Files are TOML; every section
//! falls back to the built-in ocean catalog when omitted.

use crate::model::{
    ItemCategory, ItemKind, QualityTier, Rarity, Recipe, RecipeId, SurfaceMaterial,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Height of the water surface. Depth is measured downward from here.
    pub sea_level: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self { sea_level: 0.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Distance between candidate grid points.
    pub grid_spacing: f32,
    /// Maximum jitter as a fraction of `grid_spacing`, applied on both axes.
    pub jitter: f32,
    /// Candidates evaluated before yielding back to the scheduler.
    pub batch_size: usize,
    pub max_nodes_per_region: usize,
    /// Minimum distance between any two nodes placed in one pass.
    pub collision_radius: f32,
    /// Nodes sit up to this far above the probed surface.
    pub max_height_offset: f32,
    pub primary_frequency: f64,
    pub primary_weight: f64,
    pub secondary_frequency: f64,
    pub cluster_threshold: f64,
    pub cluster_boost: f64,
    /// Mixed with the region id; unset means a fresh seed per pass.
    pub seed: Option<u64>,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            grid_spacing: 15.0,
            jitter: 0.3,
            batch_size: 32,
            max_nodes_per_region: 150,
            collision_radius: 3.0,
            max_height_offset: 0.5,
            primary_frequency: 0.01,
            primary_weight: 0.5,
            secondary_frequency: 0.05,
            cluster_threshold: 0.35,
            cluster_boost: 1.5,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    pub interaction_range: f32,
    pub tool_wear_per_harvest: u32,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            interaction_range: 10.0,
            tool_wear_per_harvest: 1,
        }
    }
}

/// One rung of the quality ladder rolled on every successful craft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityTierSettings {
    pub tier: QualityTier,
    pub probability: f64,
    /// Extra output as a fraction of the base output, rounded down.
    pub bonus_fraction: f64,
    pub durability_multiplier: f64,
    pub experience_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftingSettings {
    pub base_craft_time_secs: f64,
    /// Time saved per extra unit in a batch.
    pub batch_reduction_per_unit: f64,
    pub max_batch_reduction: f64,
    pub max_active_crafts: u32,
    pub failure_rate: f64,
    pub tick_interval_ms: u64,
    pub quality_tiers: Vec<QualityTierSettings>,
}

impl Default for CraftingSettings {
    fn default() -> Self {
        let tier = |tier, probability, bonus_fraction, durability_multiplier, experience_multiplier| {
            QualityTierSettings {
                tier,
                probability,
                bonus_fraction,
                durability_multiplier,
                experience_multiplier,
            }
        };
        Self {
            base_craft_time_secs: 5.0,
            batch_reduction_per_unit: 0.1,
            max_batch_reduction: 0.5,
            max_active_crafts: 3,
            failure_rate: 0.05,
            tick_interval_ms: 250,
            quality_tiers: vec![
                tier(QualityTier::Common, 0.60, 0.0, 1.0, 1.0),
                tier(QualityTier::Good, 0.25, 0.25, 1.2, 1.25),
                tier(QualityTier::Excellent, 0.12, 0.5, 1.5, 1.5),
                tier(QualityTier::Perfect, 0.03, 1.0, 2.0, 2.0),
            ],
        }
    }
}

impl CraftingSettings {
    /// Zero when the setting is not a representable duration; `validate` rejects such configs.
    pub fn base_craft_time(&self) -> Duration {
        Duration::try_from_secs_f64(self.base_craft_time_secs).unwrap_or_default()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub inventory_capacity: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            inventory_capacity: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConstraints {
    pub min_depth: f32,
    pub max_depth: f32,
    pub allowed_materials: Vec<SurfaceMaterial>,
    pub max_slope_degrees: f32,
    /// Distance kept from every other node placed in the same pass.
    #[serde(default)]
    pub min_separation: f32,
}

impl PlacementConstraints {
    pub fn allows_depth(&self, depth: f32) -> bool {
        depth >= self.min_depth && depth <= self.max_depth
    }

    pub fn allows_material(&self, material: SurfaceMaterial) -> bool {
        self.allowed_materials.contains(&material)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTypeConfig {
    pub kind: ItemKind,
    pub name: String,
    pub rarity: Rarity,
    /// Base spawn probability per candidate point, before noise and biome modifiers.
    pub spawn_weight: f64,
    pub respawn_delay_secs: f64,
    pub harvest_yield: u32,
    #[serde(default)]
    pub required_tool: Option<ItemKind>,
    /// Extra yield per harvest with a given tool equipped.
    #[serde(default)]
    pub tool_bonus: BTreeMap<ItemKind, u32>,
    pub constraints: PlacementConstraints,
}

impl ResourceTypeConfig {
    /// Zero when the setting is not a representable duration; `validate` rejects such configs.
    pub fn respawn_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.respawn_delay_secs).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub world: WorldSettings,
    pub placement: PlacementSettings,
    pub harvest: HarvestSettings,
    pub crafting: CraftingSettings,
    pub player: PlayerSettings,
    pub resources: Vec<ResourceTypeConfig>,
    pub recipes: Vec<Recipe>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            world: WorldSettings::default(),
            placement: PlacementSettings::default(),
            harvest: HarvestSettings::default(),
            crafting: CraftingSettings::default(),
            player: PlayerSettings::default(),
            resources: default_resources(),
            recipes: default_recipes(),
        }
    }
}

impl EconomyConfig {
    /// Reads and validates a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!(
            path = %path.display(),
            resources = config.resources.len(),
            recipes = config.recipes.len(),
            "Loaded economy configuration"
        );
        Ok(config)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EconomyConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects catalogs the engines cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let p = &self.placement;
        let c = &self.crafting;
        for (name, value) in [
            ("sea_level", self.world.sea_level as f64),
            ("grid_spacing", p.grid_spacing as f64),
            ("jitter", p.jitter as f64),
            ("collision_radius", p.collision_radius as f64),
            ("max_height_offset", p.max_height_offset as f64),
            ("primary_frequency", p.primary_frequency),
            ("primary_weight", p.primary_weight),
            ("secondary_frequency", p.secondary_frequency),
            ("cluster_threshold", p.cluster_threshold),
            ("cluster_boost", p.cluster_boost),
            ("interaction_range", self.harvest.interaction_range as f64),
            ("base_craft_time_secs", c.base_craft_time_secs),
        ] {
            if !value.is_finite() {
                return invalid(format!("{name} must be finite, got {value}"));
            }
        }

        if p.grid_spacing <= 0.0 {
            return invalid(format!("grid_spacing must be positive, got {}", p.grid_spacing));
        }
        if !(0.0..0.5).contains(&p.jitter) {
            return invalid(format!("jitter must be in [0, 0.5), got {}", p.jitter));
        }
        if p.batch_size == 0 || p.max_nodes_per_region == 0 {
            return invalid("batch_size and max_nodes_per_region must be positive".into());
        }
        if self.harvest.interaction_range <= 0.0 {
            return invalid("interaction_range must be positive".into());
        }

        if Duration::try_from_secs_f64(c.base_craft_time_secs).is_err() {
            return invalid(format!(
                "base_craft_time_secs must be a non-negative duration, got {}",
                c.base_craft_time_secs
            ));
        }
        for (name, value) in [
            ("failure_rate", c.failure_rate),
            ("batch_reduction_per_unit", c.batch_reduction_per_unit),
            ("max_batch_reduction", c.max_batch_reduction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        if c.max_active_crafts == 0 || c.tick_interval_ms == 0 {
            return invalid("max_active_crafts and tick_interval_ms must be positive".into());
        }
        if c.quality_tiers.is_empty() {
            return invalid("quality ladder is empty".into());
        }
        for tier in &c.quality_tiers {
            let values = [
                tier.probability,
                tier.bonus_fraction,
                tier.durability_multiplier,
                tier.experience_multiplier,
            ];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return invalid(format!(
                    "{:?} tier: probability and multipliers must be finite and non-negative",
                    tier.tier
                ));
            }
        }
        let total: f64 = c.quality_tiers.iter().map(|t| t.probability).sum();
        if (total - 1.0).abs() > 1e-6 || c.quality_tiers.iter().any(|t| t.probability < 0.0) {
            return invalid(format!("quality probabilities must sum to 1, got {total}"));
        }

        let mut kinds = HashSet::new();
        for resource in &self.resources {
            if !kinds.insert(&resource.kind) {
                return invalid(format!("duplicate resource type {}", resource.kind));
            }
            if !(0.0..=1.0).contains(&resource.spawn_weight) {
                return invalid(format!("{}: spawn_weight must be in [0, 1]", resource.kind));
            }
            if resource.harvest_yield == 0
                || Duration::try_from_secs_f64(resource.respawn_delay_secs).is_err()
            {
                return invalid(format!(
                    "{}: harvest_yield must be positive and respawn delay a non-negative duration",
                    resource.kind
                ));
            }
            let bounds = &resource.constraints;
            let limits = [
                bounds.min_depth,
                bounds.max_depth,
                bounds.max_slope_degrees,
                bounds.min_separation,
            ];
            if limits.iter().any(|v| !v.is_finite()) || bounds.min_separation < 0.0 {
                return invalid(format!("{}: placement constraints must be finite", resource.kind));
            }
            if bounds.min_depth > bounds.max_depth || bounds.allowed_materials.is_empty() {
                return invalid(format!("{}: placement constraints admit nothing", resource.kind));
            }
        }

        let mut ids = HashSet::new();
        for recipe in &self.recipes {
            if !ids.insert(&recipe.id) {
                return invalid(format!("duplicate recipe {}", recipe.id));
            }
            if recipe.ingredients.is_empty() {
                return invalid(format!("{}: recipe has no ingredients", recipe.id));
            }
            if let Some((kind, _)) = recipe.ingredients.iter().find(|(_, qty)| **qty == 0) {
                return invalid(format!("{}: zero quantity of {kind}", recipe.id));
            }
            if recipe.craft_time_units == 0 || recipe.output_quantity == 0 {
                return invalid(format!(
                    "{}: craft_time_units and output_quantity must be positive",
                    recipe.id
                ));
            }
            if recipe.is_tool() && !matches!(recipe.durability, Some(d) if d > 0) {
                return invalid(format!("{}: tool recipe needs a durability", recipe.id));
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> ResourceCatalog {
        ResourceCatalog::new(self.resources.clone())
    }

    pub fn recipe_book(&self) -> RecipeBook {
        RecipeBook::new(self.recipes.clone())
    }
}

/// Resource types by kind, keeping configuration order.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    types: Vec<ResourceTypeConfig>,
    index: HashMap<ItemKind, usize>,
}

impl ResourceCatalog {
    pub fn new(types: Vec<ResourceTypeConfig>) -> Self {
        let index = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.kind.clone(), i))
            .collect();
        Self { types, index }
    }

    pub fn get(&self, kind: &ItemKind) -> Option<&ResourceTypeConfig> {
        self.index.get(kind).map(|&i| &self.types[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceTypeConfig> {
        self.types.iter()
    }

    /// Every type in configuration order, which is also spawn priority order.
    pub fn spawn_table(&self) -> SpawnTable {
        SpawnTable {
            entries: self
                .types
                .iter()
                .map(|t| SpawnEntry {
                    kind: t.kind.clone(),
                    weight: t.spawn_weight,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnEntry {
    pub kind: ItemKind,
    pub weight: f64,
}

/// Ordered `(kind, weight)` list walked per candidate; the first entry whose roll hits wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnTable {
    pub entries: Vec<SpawnEntry>,
}

impl SpawnTable {
    pub fn new(entries: impl IntoIterator<Item = (ItemKind, f64)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(kind, weight)| SpawnEntry { kind, weight })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    recipes: BTreeMap<RecipeId, Recipe>,
}

impl RecipeBook {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self {
            recipes: recipes.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    pub fn get(&self, id: &RecipeId) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

fn default_resources() -> Vec<ResourceTypeConfig> {
    use SurfaceMaterial::*;
    vec![
        ResourceTypeConfig {
            kind: "kelp".into(),
            name: "Kelp".into(),
            rarity: Rarity::Common,
            spawn_weight: 0.3,
            respawn_delay_secs: 30.0,
            harvest_yield: 3,
            required_tool: None,
            tool_bonus: BTreeMap::new(),
            constraints: PlacementConstraints {
                min_depth: 2.0,
                max_depth: 40.0,
                allowed_materials: vec![Sand, Mud, Gravel],
                max_slope_degrees: 35.0,
                min_separation: 4.0,
            },
        },
        ResourceTypeConfig {
            kind: "coral".into(),
            name: "Coral".into(),
            rarity: Rarity::Uncommon,
            spawn_weight: 0.15,
            respawn_delay_secs: 60.0,
            harvest_yield: 2,
            required_tool: None,
            tool_bonus: BTreeMap::from([("pry_bar".into(), 1)]),
            constraints: PlacementConstraints {
                min_depth: 5.0,
                max_depth: 30.0,
                allowed_materials: vec![Rock, Coral, Sand],
                max_slope_degrees: 50.0,
                min_separation: 6.0,
            },
        },
        ResourceTypeConfig {
            kind: "pearl".into(),
            name: "Pearl".into(),
            rarity: Rarity::Rare,
            spawn_weight: 0.05,
            respawn_delay_secs: 300.0,
            harvest_yield: 1,
            required_tool: Some("pry_bar".into()),
            tool_bonus: BTreeMap::new(),
            constraints: PlacementConstraints {
                min_depth: 10.0,
                max_depth: 60.0,
                allowed_materials: vec![Sand],
                max_slope_degrees: 20.0,
                min_separation: 12.0,
            },
        },
    ]
}

fn recipe(
    id: &str,
    name: &str,
    ingredients: &[(&str, u32)],
    craft_time_units: u32,
    category: ItemCategory,
    durability: Option<u32>,
    base_experience: u32,
) -> Recipe {
    Recipe {
        id: id.into(),
        name: name.into(),
        ingredients: ingredients
            .iter()
            .map(|(kind, qty)| (ItemKind::from(*kind), *qty))
            .collect(),
        craft_time_units,
        output: id.into(),
        output_quantity: 1,
        category,
        durability,
        base_experience,
    }
}

fn default_recipes() -> Vec<Recipe> {
    vec![
        recipe("rope", "Kelp Rope", &[("kelp", 3)], 1, ItemCategory::Material, None, 5),
        recipe(
            "pry_bar",
            "Pry Bar",
            &[("coral", 2), ("rope", 1)],
            2,
            ItemCategory::Tool,
            Some(50),
            15,
        ),
        recipe(
            "coral_wall",
            "Coral Wall",
            &[("coral", 4), ("rope", 2)],
            3,
            ItemCategory::Buildable,
            None,
            20,
        ),
        recipe(
            "pearl_lamp",
            "Pearl Lamp",
            &[("pearl", 1), ("coral", 2), ("rope", 1)],
            4,
            ItemCategory::Decoration,
            None,
            30,
        ),
    ]
}
