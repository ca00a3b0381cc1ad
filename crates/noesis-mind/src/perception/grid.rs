use std::collections::BTreeMap;

use noesis_core::Vec3;
use serde::Serialize;

use crate::perception::object::PerceivedObject;

/// Coarse spatial bucketing of perceived objects, keyed by quantized
/// relative position. Rebuilt on every scan.
#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: BTreeMap<(i32, i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    pub fn build(cell_size: f32, objects: &[PerceivedObject]) -> Self {
        let cell_size = cell_size.max(1.0);
        let mut cells: BTreeMap<(i32, i32, i32), Vec<usize>> = BTreeMap::new();
        for (index, object) in objects.iter().enumerate() {
            cells
                .entry(quantize(object.relative_position, cell_size))
                .or_default()
                .push(index);
        }
        Self { cell_size, cells }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Summary suitable for the `spatial_grid` resource: occupied cells and
    /// their object counts.
    pub fn summary(&self) -> GridSummary {
        GridSummary {
            cell_size: self.cell_size,
            occupied_cells: self.cells.len(),
            cells: self
                .cells
                .iter()
                .map(|(key, indices)| GridCell {
                    cell: *key,
                    count: indices.len(),
                })
                .collect(),
        }
    }
}

fn quantize(position: Vec3, cell_size: f32) -> (i32, i32, i32) {
    (
        (position.x / cell_size).floor() as i32,
        (position.y / cell_size).floor() as i32,
        (position.z / cell_size).floor() as i32,
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct GridSummary {
    pub cell_size: f32,
    pub occupied_cells: usize,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridCell {
    pub cell: (i32, i32, i32),
    pub count: usize,
}

/// Greedy single-link clustering of objects within `radius` of any member.
///
/// Deterministic: objects are visited in their stored (distance-ascending)
/// order.
pub fn cluster(objects: &[PerceivedObject], radius: f32) -> Vec<Cluster> {
    let mut assigned = vec![false; objects.len()];
    let mut clusters = Vec::new();

    for seed in 0..objects.len() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let mut members = vec![seed];

        // Grow the cluster until no unassigned object is in range of a member.
        let mut cursor = 0;
        while cursor < members.len() {
            let anchor = objects[members[cursor]].relative_position;
            for (index, object) in objects.iter().enumerate() {
                if !assigned[index] && anchor.distance(object.relative_position) <= radius {
                    assigned[index] = true;
                    members.push(index);
                }
            }
            cursor += 1;
        }

        let mut center = Vec3::ZERO;
        for &index in &members {
            center = center + objects[index].relative_position;
        }
        center = center * (1.0 / members.len() as f32);

        clusters.push(Cluster {
            center,
            size: members.len(),
            member_ids: members
                .iter()
                .map(|&index| objects[index].id.clone())
                .collect(),
        });
    }

    clusters
}

#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub center: Vec3,
    pub size: usize,
    pub member_ids: Vec<String>,
}
