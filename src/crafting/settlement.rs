//! Craft timing and outcome rolls.

use crate::config::{CraftingSettings, QualityTierSettings};
use crate::model::Recipe;
use rand::Rng;
use std::time::Duration;

/// Total duration of a batch: base time × units × quantity, shortened for batches by
/// `batch_reduction_per_unit` per extra unit up to `max_batch_reduction`.
/// `None` when the result does not fit in a `Duration`.
pub fn craft_duration(
    settings: &CraftingSettings,
    recipe: &Recipe,
    quantity: u32,
) -> Option<Duration> {
    let units = recipe.craft_time_units as f64 * quantity as f64;
    let extra_units = quantity.saturating_sub(1) as f64;
    let reduction = (settings.batch_reduction_per_unit * extra_units).min(settings.max_batch_reduction);
    let secs = settings.base_craft_time().as_secs_f64() * units * (1.0 - reduction);
    Duration::try_from_secs_f64(secs).ok()
}

/// `true` when the craft fails and produces nothing.
pub fn roll_failure(rng: &mut impl Rng, failure_rate: f64) -> bool {
    failure_rate > 0.0 && rng.gen::<f64>() < failure_rate
}

/// Walks the ladder with one uniform draw. Falls back to the last rung against rounding.
pub fn roll_quality<'a>(
    rng: &mut impl Rng,
    ladder: &'a [QualityTierSettings],
) -> Option<&'a QualityTierSettings> {
    let draw = rng.gen::<f64>();
    let mut cumulative = 0.0;
    for tier in ladder {
        cumulative += tier.probability;
        if draw < cumulative {
            return Some(tier);
        }
    }
    ladder.last()
}

/// What a successful craft pays out.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub base: u64,
    pub bonus: u64,
    /// Durability of each produced tool, `None` for counted items.
    pub tool_durability: Option<u32>,
    pub experience: u64,
}

impl Settlement {
    pub fn total(&self) -> u64 {
        self.base + self.bonus
    }
}

pub fn settle(recipe: &Recipe, quantity: u32, tier: &QualityTierSettings) -> Settlement {
    let base = recipe.base_output(quantity);
    let bonus = (base as f64 * tier.bonus_fraction).floor() as u64;
    let tool_durability = recipe
        .durability
        .filter(|_| recipe.is_tool())
        .map(|d| ((d as f64 * tier.durability_multiplier).round() as u32).max(1));
    let experience =
        (recipe.base_experience as f64 * quantity as f64 * tier.experience_multiplier).round() as u64;
    Settlement {
        base,
        bonus,
        tool_durability,
        experience,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EconomyConfig;
    use crate::model::QualityTier;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn recipe(id: &str) -> Recipe {
        EconomyConfig::default()
            .recipe_book()
            .get(&id.into())
            .cloned()
            .unwrap()
    }

    fn tier(config: &CraftingSettings, tier: QualityTier) -> QualityTierSettings {
        config.quality_tiers.iter().find(|t| t.tier == tier).cloned().unwrap()
    }

    #[test]
    fn test_batch_is_faster_than_separate_crafts() {
        let settings = CraftingSettings::default();
        let rope = recipe("rope");
        let single = craft_duration(&settings, &rope, 1).unwrap();
        let batch = craft_duration(&settings, &rope, 3).unwrap();
        assert_eq!(single, Duration::from_secs(5));
        assert!(batch < single * 3);
        // 3 units at 20% off.
        assert!((batch.as_secs_f64() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_batch_reduction_is_capped() {
        let settings = CraftingSettings::default();
        let rope = recipe("rope");
        assert_eq!(craft_duration(&settings, &rope, 6), Some(Duration::from_secs_f64(15.0)));
        assert_eq!(craft_duration(&settings, &rope, 20), Some(Duration::from_secs(50)));
    }

    #[test]
    fn test_unrepresentable_duration_is_none() {
        let settings = CraftingSettings {
            base_craft_time_secs: 1e12,
            ..CraftingSettings::default()
        };
        let rope = recipe("rope");
        assert!(craft_duration(&settings, &rope, 1).is_some());
        assert_eq!(craft_duration(&settings, &rope, u32::MAX), None);
    }

    #[test]
    fn test_quality_ladder_frequencies() {
        let settings = CraftingSettings::default();
        let mut rng = StdRng::seed_from_u64(17);
        let mut counts = std::collections::HashMap::new();
        for _ in 0..10_000 {
            let tier = roll_quality(&mut rng, &settings.quality_tiers).unwrap();
            *counts.entry(tier.tier).or_insert(0u32) += 1;
        }
        let common = counts[&QualityTier::Common];
        assert!((5500..6500).contains(&common), "common rolled {common} times");
        assert!(counts[&QualityTier::Perfect] < counts[&QualityTier::Excellent]);
    }

    #[test]
    fn test_failure_rate_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..1000).all(|_| !roll_failure(&mut rng, 0.0)));
        assert!((0..1000).all(|_| roll_failure(&mut rng, 1.0)));
    }

    #[test]
    fn test_settlement_scales_with_tier() {
        let settings = CraftingSettings::default();
        let pry_bar = recipe("pry_bar");

        let common = settle(&pry_bar, 2, &tier(&settings, QualityTier::Common));
        assert_eq!((common.base, common.bonus), (2, 0));
        assert_eq!(common.tool_durability, Some(50));
        assert_eq!(common.experience, 30);

        let perfect = settle(&pry_bar, 2, &tier(&settings, QualityTier::Perfect));
        assert_eq!(perfect.total(), 4);
        assert_eq!(perfect.tool_durability, Some(100));
        assert_eq!(perfect.experience, 60);

        let good_rope = settle(&recipe("rope"), 4, &tier(&settings, QualityTier::Good));
        assert_eq!(good_rope.bonus, 1);
        assert_eq!(good_rope.tool_durability, None);
    }
}
