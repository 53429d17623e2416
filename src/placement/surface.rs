//! The narrow view of world terrain the placement engine needs.

use crate::model::SurfaceMaterial;
use glam::Vec2;

/// What a downward probe found under a candidate point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub height: f32,
    pub material: SurfaceMaterial,
    pub slope_degrees: f32,
}

/// Terrain collaborator. Implemented by the world generator; the engine never mutates it.
pub trait SurfaceQuery: Send + Sync {
    /// False until the world has been generated. Placement refuses to run before then.
    fn is_ready(&self) -> bool;

    /// Probes straight down at `(x, z)`. `None` means nothing supports a node there.
    fn probe(&self, point: Vec2) -> Option<SurfaceHit>;

    /// Local biome scaling of spawn density.
    fn biome_modifier(&self, _point: Vec2) -> f64 {
        1.0
    }
}

/// Level seabed with a single material. Used by the demo binary and in tests.
#[derive(Debug, Clone)]
pub struct FlatSeabed {
    pub height: f32,
    pub material: SurfaceMaterial,
    pub ready: bool,
}

impl FlatSeabed {
    pub fn new(height: f32, material: SurfaceMaterial) -> Self {
        Self {
            height,
            material,
            ready: true,
        }
    }
}

impl SurfaceQuery for FlatSeabed {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn probe(&self, _point: Vec2) -> Option<SurfaceHit> {
        Some(SurfaceHit {
            height: self.height,
            material: self.material,
            slope_degrees: 0.0,
        })
    }
}

/// Regular grid of sampled heights and materials, bilinearly interpolated.
///
/// Points outside the grid have no surface.
#[derive(Debug, Clone)]
pub struct Heightfield {
    origin: Vec2,
    cell_size: f32,
    width: usize,
    depth: usize,
    heights: Vec<f32>,
    materials: Vec<SurfaceMaterial>,
}

impl Heightfield {
    /// `heights` and `materials` are row-major, `width` samples per row. Returns `None` when the
    /// sample counts do not describe at least a 2×2 grid.
    pub fn new(
        origin: Vec2,
        cell_size: f32,
        width: usize,
        heights: Vec<f32>,
        materials: Vec<SurfaceMaterial>,
    ) -> Option<Self> {
        if width < 2 || cell_size <= 0.0 || heights.len() != materials.len() {
            return None;
        }
        if heights.len() % width != 0 || heights.len() / width < 2 {
            return None;
        }
        let depth = heights.len() / width;
        Some(Self {
            origin,
            cell_size,
            width,
            depth,
            heights,
            materials,
        })
    }

    /// Builds a heightfield by sampling `f(x, z)` on the grid.
    pub fn from_fn(
        origin: Vec2,
        cell_size: f32,
        width: usize,
        depth: usize,
        f: impl Fn(f32, f32) -> (f32, SurfaceMaterial),
    ) -> Option<Self> {
        let (heights, materials): (Vec<f32>, Vec<SurfaceMaterial>) = (0..depth)
            .flat_map(|row| (0..width).map(move |col| (col, row)))
            .map(|(col, row)| {
                f(
                    origin.x + col as f32 * cell_size,
                    origin.y + row as f32 * cell_size,
                )
            })
            .unzip();
        Self::new(origin, cell_size, width, heights, materials)
    }

    fn sample(&self, col: usize, row: usize) -> f32 {
        self.heights[row * self.width + col]
    }
}

impl SurfaceQuery for Heightfield {
    fn is_ready(&self) -> bool {
        true
    }

    fn probe(&self, point: Vec2) -> Option<SurfaceHit> {
        let local = (point - self.origin) / self.cell_size;
        let last = Vec2::new((self.width - 1) as f32, (self.depth - 1) as f32);
        if !local.is_finite() || local.cmplt(Vec2::ZERO).any() || local.cmpgt(last).any() {
            return None;
        }
        // Points on the last row or column belong to the cell before it.
        let col = (local.x.floor() as usize).min(self.width - 2);
        let row = (local.y.floor() as usize).min(self.depth - 2);
        let (tx, tz) = (local.x - col as f32, local.y - row as f32);

        let h00 = self.sample(col, row);
        let h10 = self.sample(col + 1, row);
        let h01 = self.sample(col, row + 1);
        let h11 = self.sample(col + 1, row + 1);
        let height = h00 * (1.0 - tx) * (1.0 - tz)
            + h10 * tx * (1.0 - tz)
            + h01 * (1.0 - tx) * tz
            + h11 * tx * tz;

        let dx = ((h10 - h00) * (1.0 - tz) + (h11 - h01) * tz) / self.cell_size;
        let dz = ((h01 - h00) * (1.0 - tx) + (h11 - h10) * tx) / self.cell_size;
        let slope_degrees = Vec2::new(dx, dz).length().atan().to_degrees();

        let nearest_col = if tx < 0.5 { col } else { col + 1 };
        let nearest_row = if tz < 0.5 { row } else { row + 1 };
        let material = self.materials[nearest_row * self.width + nearest_col];

        Some(SurfaceHit {
            height,
            material,
            slope_degrees,
        })
    }
}
