//! Spatial placement of resource nodes.
//!
//! A pass lays a jittered grid over the region, shuffles it, thins it with a two-octave density
//! field, picks a resource type per surviving point from an ordered [`SpawnTable`], and keeps
//! the point only if the surface under it satisfies that type's constraints and nothing placed
//! earlier in the pass is too close.
//!
//! Placement is best-effort. Candidates that fail a check are dropped silently; the only hard
//! failures are an invalid region and a world whose surface is not ready yet.
//!
//! [`PlacementPass`] does the pure work in fixed-size batches. [`PlacementEngine::place_resources`]
//! drives it, registers each batch with the node registry, and yields to the runtime between
//! batches.

pub mod noise_field;
pub mod spatial_hash;
pub mod surface;

pub use noise_field::DensityField;
pub use spatial_hash::SpatialHash;
pub use surface::{FlatSeabed, Heightfield, SurfaceHit, SurfaceQuery};

use crate::clients::NodeClient;
use crate::config::{PlacementSettings, ResourceCatalog, SpawnTable};
use crate::model::{ItemKind, NodeCreate, NodeId, RegionId};
use crate::node_actor::HarvestError;
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("World surface is not available yet")]
    SurfaceUnavailable,

    #[error("Region {0} has no area")]
    InvalidRegion(RegionId),

    #[error("Failed to register node: {0}")]
    Registration(#[from] HarvestError),
}

/// Axis-aligned area on the XZ plane, populated and cleared as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub id: RegionId,
    pub min: Vec2,
    pub max: Vec2,
}

impl Region {
    pub fn new(id: RegionId, min: Vec2, max: Vec2) -> Self {
        Self { id, min, max }
    }

    /// Square region with its corner at the origin.
    pub fn square(id: RegionId, size: f32) -> Self {
        Self::new(id, Vec2::ZERO, Vec2::splat(size))
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max.x > self.min.x && self.max.y > self.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// A point accepted by a pass, not yet registered.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSite {
    pub kind: ItemKind,
    pub position: Vec3,
}

/// A registered node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    pub node_id: NodeId,
    pub kind: ItemKind,
    pub position: Vec3,
}

/// Why candidates were dropped during a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementStats {
    pub candidates: usize,
    pub no_roll: usize,
    pub no_surface: usize,
    pub constraint: usize,
    pub collision: usize,
    pub placed: usize,
}

pub struct PlacementEngine {
    settings: PlacementSettings,
    sea_level: f32,
    catalog: Arc<ResourceCatalog>,
}

impl PlacementEngine {
    pub fn new(settings: PlacementSettings, sea_level: f32, catalog: Arc<ResourceCatalog>) -> Self {
        Self {
            settings,
            sea_level,
            catalog,
        }
    }

    /// Starts a pass over `region`. Fails before any work if the region is empty or the surface
    /// is not ready.
    pub fn begin<'a>(
        &'a self,
        region: &Region,
        table: &'a SpawnTable,
        surface: &'a dyn SurfaceQuery,
    ) -> Result<PlacementPass<'a>, PlacementError> {
        if !region.is_valid() {
            return Err(PlacementError::InvalidRegion(region.id));
        }
        if !surface.is_ready() {
            return Err(PlacementError::SurfaceUnavailable);
        }

        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(
                seed ^ (region.id.0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
            ),
            None => StdRng::from_entropy(),
        };
        let density = DensityField::new(rng.gen(), &self.settings);

        let spacing = self.settings.grid_spacing;
        let jitter = self.settings.jitter * spacing;
        let mut candidates = Vec::new();
        let mut x = region.min.x + spacing / 2.0;
        while x < region.max.x {
            let mut z = region.min.y + spacing / 2.0;
            while z < region.max.y {
                let offset = Vec2::new(rng.gen_range(-jitter..=jitter), rng.gen_range(-jitter..=jitter));
                candidates.push((Vec2::new(x, z) + offset).clamp(region.min, region.max));
                z += spacing;
            }
            x += spacing;
        }
        candidates.shuffle(&mut rng);

        debug!(region = %region.id, candidates = candidates.len(), "Placement pass started");
        Ok(PlacementPass {
            engine: self,
            table,
            surface,
            rng,
            density,
            candidates,
            cursor: 0,
            placed: SpatialHash::new(spacing),
            stats: PlacementStats::default(),
        })
    }

    /// Runs a whole pass without registering anything.
    pub fn plan(
        &self,
        region: &Region,
        table: &SpawnTable,
        surface: &dyn SurfaceQuery,
    ) -> Result<(Vec<SpawnSite>, PlacementStats), PlacementError> {
        let mut pass = self.begin(region, table, surface)?;
        let mut sites = Vec::new();
        while let Some(batch) = pass.next_batch() {
            sites.extend(batch);
        }
        Ok((sites, pass.stats()))
    }

    /// Places and registers nodes for `region`.
    #[instrument(skip_all, fields(region = %region.id))]
    pub async fn place_resources(
        &self,
        region: &Region,
        table: &SpawnTable,
        surface: &dyn SurfaceQuery,
        nodes: &NodeClient,
    ) -> Result<Vec<PlacedNode>, PlacementError> {
        let mut pass = self.begin(region, table, surface)?;
        let mut placed = Vec::new();

        while let Some(batch) = pass.next_batch() {
            for site in batch {
                let Some(config) = self.catalog.get(&site.kind) else {
                    continue;
                };
                let node_id = nodes
                    .register(NodeCreate {
                        kind: site.kind.clone(),
                        rarity: config.rarity,
                        region: region.id,
                        position: site.position,
                        respawn_delay: config.respawn_delay(),
                    })
                    .await?;
                placed.push(PlacedNode {
                    node_id,
                    kind: site.kind,
                    position: site.position,
                });
            }
            tokio::task::yield_now().await;
        }

        let stats = pass.stats();
        info!(
            placed = placed.len(),
            candidates = stats.candidates,
            collisions = stats.collision,
            rejected_by_surface = stats.no_surface + stats.constraint,
            "Region populated"
        );
        Ok(placed)
    }
}

/// One in-progress placement pass. Deterministic for a fixed seed.
pub struct PlacementPass<'a> {
    engine: &'a PlacementEngine,
    table: &'a SpawnTable,
    surface: &'a dyn SurfaceQuery,
    rng: StdRng,
    density: DensityField,
    candidates: Vec<Vec2>,
    cursor: usize,
    placed: SpatialHash,
    stats: PlacementStats,
}

impl PlacementPass<'_> {
    fn is_full(&self) -> bool {
        self.stats.placed >= self.engine.settings.max_nodes_per_region
    }

    /// Evaluates up to `batch_size` candidates. `None` once the candidates are exhausted or the
    /// region cap is reached.
    pub fn next_batch(&mut self) -> Option<Vec<SpawnSite>> {
        if self.cursor >= self.candidates.len() || self.is_full() {
            return None;
        }
        let end = (self.cursor + self.engine.settings.batch_size).min(self.candidates.len());
        let mut batch = Vec::new();
        while self.cursor < end && !self.is_full() {
            let point = self.candidates[self.cursor];
            self.cursor += 1;
            self.stats.candidates += 1;
            if let Some(site) = self.evaluate(point) {
                batch.push(site);
            }
        }
        Some(batch)
    }

    pub fn stats(&self) -> PlacementStats {
        self.stats
    }

    fn evaluate(&mut self, point: Vec2) -> Option<SpawnSite> {
        let settings = &self.engine.settings;
        let chance = self.density.multiplier(point.x, point.y) * self.surface.biome_modifier(point);

        let rng = &mut self.rng;
        let Some(entry) = self
            .table
            .entries
            .iter()
            .find(|entry| rng.gen::<f64>() < entry.weight * chance)
        else {
            self.stats.no_roll += 1;
            return None;
        };
        let Some(config) = self.engine.catalog.get(&entry.kind) else {
            self.stats.no_roll += 1;
            return None;
        };

        let Some(hit) = self.surface.probe(point) else {
            self.stats.no_surface += 1;
            return None;
        };
        let bounds = &config.constraints;
        let depth = self.engine.sea_level - hit.height;
        if !bounds.allows_material(hit.material)
            || hit.slope_degrees > bounds.max_slope_degrees
            || !bounds.allows_depth(depth)
        {
            self.stats.constraint += 1;
            return None;
        }

        let radius = settings.collision_radius.max(bounds.min_separation);
        if self.placed.conflicts(point, radius) {
            self.stats.collision += 1;
            return None;
        }

        let lift = self.rng.gen_range(0.0..=settings.max_height_offset.max(0.0));
        self.placed.insert(point, radius);
        self.stats.placed += 1;
        Some(SpawnSite {
            kind: config.kind.clone(),
            position: Vec3::new(point.x, hit.height + lift, point.y),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EconomyConfig;
    use crate::model::SurfaceMaterial;

    fn engine(seed: u64) -> PlacementEngine {
        let config = EconomyConfig::default();
        let mut settings = config.placement.clone();
        settings.seed = Some(seed);
        PlacementEngine::new(settings, config.world.sea_level, Arc::new(config.catalog()))
    }

    fn kelp_and_pearl() -> SpawnTable {
        SpawnTable::new([(ItemKind::from("kelp"), 0.3), (ItemKind::from("pearl"), 0.05)])
    }

    fn count(sites: &[SpawnSite], kind: &str) -> usize {
        sites.iter().filter(|s| s.kind.as_str() == kind).count()
    }

    #[test]
    fn test_common_type_outnumbers_rare_type() {
        let seabed = FlatSeabed::new(-20.0, SurfaceMaterial::Sand);
        let region = Region::square(RegionId(1), 200.0);
        for seed in 0..5 {
            let engine = engine(seed);
            let (sites, stats) = engine.plan(&region, &kelp_and_pearl(), &seabed).unwrap();
            assert!(!sites.is_empty(), "seed {seed} placed nothing");
            assert!(sites.len() <= engine.settings.max_nodes_per_region);
            assert!(
                count(&sites, "kelp") > count(&sites, "pearl"),
                "seed {seed}: {stats:?}"
            );
        }
    }

    #[test]
    fn test_placed_nodes_respect_separation_and_region() {
        let seabed = FlatSeabed::new(-20.0, SurfaceMaterial::Sand);
        let region = Region::new(RegionId(2), Vec2::new(-100.0, 50.0), Vec2::new(100.0, 250.0));
        let engine = engine(11);
        let table = engine.catalog.spawn_table();
        let (sites, _) = engine.plan(&region, &table, &seabed).unwrap();

        let separation = |kind: &ItemKind| {
            let own = engine.catalog.get(kind).unwrap().constraints.min_separation;
            own.max(engine.settings.collision_radius)
        };
        for (i, a) in sites.iter().enumerate() {
            assert!(region.contains(Vec2::new(a.position.x, a.position.z)));
            assert!(a.position.y >= -20.0 && a.position.y <= -20.0 + engine.settings.max_height_offset);
            for b in &sites[i + 1..] {
                let d = Vec2::new(a.position.x - b.position.x, a.position.z - b.position.z).length();
                assert!(d >= separation(&a.kind).max(separation(&b.kind)), "{a:?} and {b:?} are {d} apart");
            }
        }
    }

    #[test]
    fn test_depth_band_filters_everything_too_shallow() {
        // One unit deep: shallower than every default type allows.
        let seabed = FlatSeabed::new(-1.0, SurfaceMaterial::Sand);
        let engine = engine(3);
        let table = engine.catalog.spawn_table();
        let (sites, stats) = engine.plan(&Region::square(RegionId(3), 200.0), &table, &seabed).unwrap();
        assert!(sites.is_empty());
        assert!(stats.constraint > 0);
    }

    #[test]
    fn test_material_restricts_types() {
        // Only coral grows on rock.
        let seabed = FlatSeabed::new(-15.0, SurfaceMaterial::Rock);
        let engine = engine(4);
        let table = engine.catalog.spawn_table();
        let (sites, _) = engine.plan(&Region::square(RegionId(4), 200.0), &table, &seabed).unwrap();
        assert!(!sites.is_empty());
        assert!(sites.iter().all(|s| s.kind.as_str() == "coral"));
    }

    #[test]
    fn test_steep_slope_rejected() {
        // 60° everywhere: steeper than any default type tolerates.
        let rise = 60f32.to_radians().tan();
        let ramp = Heightfield::from_fn(Vec2::splat(-10.0), 5.0, 50, 50, |x, _| {
            (-30.0 - x * rise, SurfaceMaterial::Sand)
        })
        .unwrap();
        let engine = engine(5);
        let table = SpawnTable::new([(ItemKind::from("kelp"), 1.0)]);
        let (sites, stats) = engine.plan(&Region::square(RegionId(5), 200.0), &table, &ramp).unwrap();
        assert!(sites.is_empty());
        assert!(stats.constraint > 0);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let seabed = FlatSeabed::new(-20.0, SurfaceMaterial::Sand);
        let region = Region::square(RegionId(6), 150.0);
        let table = kelp_and_pearl();
        let (a, _) = engine(99).plan(&region, &table, &seabed).unwrap();
        let (b, _) = engine(99).plan(&region, &table, &seabed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_region_cap_stops_pass() {
        let seabed = FlatSeabed::new(-20.0, SurfaceMaterial::Sand);
        let mut engine = engine(8);
        engine.settings.max_nodes_per_region = 5;
        let table = SpawnTable::new([(ItemKind::from("kelp"), 1.0)]);
        let (sites, _) = engine.plan(&Region::square(RegionId(7), 300.0), &table, &seabed).unwrap();
        assert_eq!(sites.len(), 5);
    }

    #[test]
    fn test_hard_failures() {
        let engine = engine(1);
        let table = kelp_and_pearl();
        let mut seabed = FlatSeabed::new(-20.0, SurfaceMaterial::Sand);

        let flat = Region::new(RegionId(8), Vec2::ZERO, Vec2::new(100.0, 0.0));
        assert!(matches!(
            engine.plan(&flat, &table, &seabed),
            Err(PlacementError::InvalidRegion(RegionId(8)))
        ));

        seabed.ready = false;
        assert!(matches!(
            engine.plan(&Region::square(RegionId(9), 100.0), &table, &seabed),
            Err(PlacementError::SurfaceUnavailable)
        ));
    }
}
