//! Two-octave density field used to thin and cluster spawn candidates.

use crate::config::PlacementSettings;
use noise::{NoiseFn, Perlin};

/// A low-frequency primary field that scales density smoothly across the region, plus a
/// higher-frequency secondary field whose peaks mark clusters.
pub struct DensityField {
    primary: Perlin,
    secondary: Perlin,
    primary_frequency: f64,
    primary_weight: f64,
    secondary_frequency: f64,
    cluster_threshold: f64,
    cluster_boost: f64,
}

impl DensityField {
    pub fn new(seed: u32, settings: &PlacementSettings) -> Self {
        Self {
            primary: Perlin::new(seed),
            secondary: Perlin::new(seed.wrapping_add(1)),
            primary_frequency: settings.primary_frequency,
            primary_weight: settings.primary_weight,
            secondary_frequency: settings.secondary_frequency,
            cluster_threshold: settings.cluster_threshold,
            cluster_boost: settings.cluster_boost,
        }
    }

    /// Multiplier applied to every spawn weight at `(x, z)`. Never negative.
    pub fn multiplier(&self, x: f32, z: f32) -> f64 {
        let (x, z) = (x as f64, z as f64);
        let primary = self
            .primary
            .get([x * self.primary_frequency, z * self.primary_frequency]);
        let secondary = self
            .secondary
            .get([x * self.secondary_frequency, z * self.secondary_frequency]);

        let mut multiplier = (1.0 + self.primary_weight * primary).max(0.0);
        if secondary > self.cluster_threshold {
            multiplier *= self.cluster_boost;
        }
        multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_stays_within_weighted_band() {
        let settings = PlacementSettings::default();
        let field = DensityField::new(7, &settings);
        let ceiling = (1.0 + 1.2 * settings.primary_weight) * settings.cluster_boost;
        for i in 0..400 {
            let (x, z) = ((i % 20) as f32 * 13.7, (i / 20) as f32 * 9.1);
            let m = field.multiplier(x, z);
            assert!(m >= 0.0 && m <= ceiling, "multiplier {m} at ({x}, {z})");
        }
    }

    #[test]
    fn test_same_seed_same_field() {
        let settings = PlacementSettings::default();
        let a = DensityField::new(42, &settings);
        let b = DensityField::new(42, &settings);
        assert_eq!(a.multiplier(31.5, 77.25), b.multiplier(31.5, 77.25));
    }
}
