//! Uniform grid over the XZ plane for separation checks during a placement pass.

use glam::Vec2;
use std::collections::HashMap;

pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<(Vec2, f32)>>,
    max_radius: f32,
    len: usize,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
            max_radius: 0.0,
            len: 0,
        }
    }

    fn cell_of(&self, point: Vec2) -> (i32, i32) {
        (
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    /// Records a placed point that keeps others at least `radius` away.
    pub fn insert(&mut self, point: Vec2, radius: f32) {
        let cell = self.cell_of(point);
        self.cells.entry(cell).or_default().push((point, radius));
        self.max_radius = self.max_radius.max(radius);
        self.len += 1;
    }

    /// True when some stored point is closer than the larger of its own radius and `radius`.
    pub fn conflicts(&self, point: Vec2, radius: f32) -> bool {
        let reach = radius.max(self.max_radius);
        let span = (reach / self.cell_size).ceil() as i32;
        let (cx, cz) = self.cell_of(point);
        for dx in -span..=span {
            for dz in -span..=span {
                let Some(bucket) = self.cells.get(&(cx + dx, cz + dz)) else {
                    continue;
                };
                if bucket
                    .iter()
                    .any(|(other, r)| other.distance(point) < radius.max(*r))
                {
                    return true;
                }
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_uses_larger_radius() {
        let mut hash = SpatialHash::new(4.0);
        hash.insert(Vec2::new(10.0, 10.0), 12.0);
        // 8 units away: fine for a radius-3 candidate alone, but inside the stored 12.
        assert!(hash.conflicts(Vec2::new(18.0, 10.0), 3.0));
        assert!(!hash.conflicts(Vec2::new(22.5, 10.0), 3.0));
    }

    #[test]
    fn test_conflict_across_cell_borders() {
        let mut hash = SpatialHash::new(5.0);
        hash.insert(Vec2::new(4.9, 4.9), 3.0);
        assert!(hash.conflicts(Vec2::new(5.1, 5.1), 3.0));
        assert!(hash.conflicts(Vec2::new(-0.5, 4.9), 6.0));
        assert!(!hash.conflicts(Vec2::new(-20.0, -20.0), 6.0));
        assert_eq!(hash.len(), 1);
    }
}
