use super::{Neighbor, NeighborIndex, NeighborSearch};
use crate::algorithms::flocking::FlockParams;
use crate::error::FlockError;
use crate::sim::Snapshot;
use crate::vector::Vec2;
use std::ops::Range;
use tracing::trace;

/// Empty range marking a cell without agents.
pub const EMPTY_CELL: Range<usize> = 0..0;

/// Upper bound on the number of cells in one grid.
pub const MAX_GRID_CELLS: usize = 1 << 22;

/// Uniform grid over the field. Rebuilding sorts the snapshot by cell.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    cell_size: f64,
    grid_width: usize,
    grid_height: usize,
    // Scratch reused across rebuilds.
    keys: Vec<(usize, usize)>,
    order: Vec<usize>,
}

/// Per-step cell → index-range table over the spatially sorted snapshot.
#[derive(Debug, Clone)]
pub struct CellTable {
    grid_width: usize,
    grid_height: usize,
    ranges: Vec<Range<usize>>,
    /// Cell of every agent, in sorted slot order.
    cells: Vec<(usize, usize)>,
}

impl UniformGrid {
    pub fn new(params: &FlockParams) -> Result<Self, FlockError> {
        Self::with_cell_size(params.width, params.height, params.cell_size())
    }

    /// Grid of ceil(extent / cell_size) cells per axis, at least one.
    ///
    /// Fails when the cell size is not positive or the grid would exceed
    /// [`MAX_GRID_CELLS`].
    pub fn with_cell_size(width: f64, height: f64, cell_size: f64) -> Result<Self, FlockError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(FlockError::InvalidCellSize(cell_size));
        }
        let too_large = FlockError::GridTooLarge {
            width,
            height,
            cell_size,
            max_cells: MAX_GRID_CELLS,
        };
        // Float-to-int casts saturate, so huge extents land on usize::MAX here.
        let cells_along = |extent: f64| ((extent / cell_size).ceil() as usize).max(1);
        let (grid_width, grid_height) = (cells_along(width), cells_along(height));
        match grid_width.checked_mul(grid_height) {
            Some(cells) if cells <= MAX_GRID_CELLS => {}
            _ => return Err(too_large),
        }
        Ok(Self {
            cell_size,
            grid_width,
            grid_height,
            keys: Vec::new(),
            order: Vec::new(),
        })
    }

    pub fn cell_size(&self) -> f64 { self.cell_size }

    /// (grid width, grid height) in cells.
    pub fn dims(&self) -> (usize, usize) { (self.grid_width, self.grid_height) }

    /// Cell containing `p`, clamped into the grid.
    ///
    /// Agents may sit up to one step outside the field; clamping is monotone, so the
    /// 3×3 neighborhood of a clamped cell still covers every true neighbor.
    pub fn cell_of(&self, p: &Vec2) -> (usize, usize) {
        let axis = |v: f64, cells: usize| {
            let c = (v / self.cell_size).floor();
            if c <= 0.0 {
                0
            } else {
                (c as usize).min(cells - 1)
            }
        };
        (axis(p.x, self.grid_width), axis(p.y, self.grid_height))
    }
}

impl NeighborSearch for UniformGrid {
    type Index = CellTable;

    fn name(&self) -> &'static str { "grid" }

    fn rebuild(&mut self, snapshot: &mut Snapshot) -> CellTable {
        let n = snapshot.len();

        self.keys.clear();
        for p in &snapshot.positions {
            let key = self.cell_of(p);
            self.keys.push(key);
        }

        // Stable: agents sharing a cell keep their relative order.
        self.order.clear();
        self.order.extend(0..n);
        let keys = &self.keys;
        self.order.sort_by_key(|&i| keys[i]);

        snapshot.reorder(&self.order);
        let cells: Vec<(usize, usize)> = self.order.iter().map(|&i| self.keys[i]).collect();

        let table = CellTable::fill(self.grid_width, self.grid_height, cells);
        trace!(
            agents = n,
            occupied = table.occupied_cells(),
            "rebuilt uniform grid"
        );
        table
    }
}

impl CellTable {
    /// Build the range table from cell keys that are already sorted.
    fn fill(grid_width: usize, grid_height: usize, cells: Vec<(usize, usize)>) -> Self {
        let mut ranges = vec![EMPTY_CELL; grid_width * grid_height];
        let slot = |(cx, cy): (usize, usize)| cx * grid_height + cy;

        if let Some(&first) = cells.first() {
            let mut last = first;
            let mut start = 0;
            for (i, &cell) in cells.iter().enumerate().skip(1) {
                if cell != last {
                    ranges[slot(last)] = start..i;
                    start = i;
                    last = cell;
                }
            }
            ranges[slot(last)] = start..cells.len();
        }

        Self {
            grid_width,
            grid_height,
            ranges,
            cells,
        }
    }

    pub fn dims(&self) -> (usize, usize) { (self.grid_width, self.grid_height) }

    /// Number of agents the table was built for.
    pub fn len(&self) -> usize { self.cells.len() }

    pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    /// Slot range of the agents inside cell (cx, cy).
    pub fn range(&self, cx: usize, cy: usize) -> Range<usize> {
        self.ranges[cx * self.grid_height + cy].clone()
    }

    /// Cell of the agent in sorted slot `agent`.
    pub fn cell_of_agent(&self, agent: usize) -> (usize, usize) { self.cells[agent] }

    /// Every cell with its range, x-major.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), Range<usize>)> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .map(move |(s, r)| ((s / self.grid_height, s % self.grid_height), r.clone()))
    }

    pub fn occupied_cells(&self) -> usize {
        self.ranges.iter().filter(|r| !r.is_empty()).count()
    }

    /// Ranges of the clipped 3×3 neighborhood around the cell of `agent`.
    fn neighborhood(&self, agent: usize) -> impl Iterator<Item = Range<usize>> + '_ {
        let (cx, cy) = self.cells[agent];
        let xs = cx.saturating_sub(1)..=(cx + 1).min(self.grid_width - 1);
        xs.flat_map(move |x| {
            let ys = cy.saturating_sub(1)..=(cy + 1).min(self.grid_height - 1);
            ys.map(move |y| self.range(x, y))
        })
    }

    /// Candidate slots for `agent`: everything in its 3×3 cell neighborhood,
    /// including the agent itself.
    pub fn candidate_indices(&self, agent: usize) -> Vec<usize> {
        if agent >= self.cells.len() {
            return Vec::new();
        }
        self.neighborhood(agent).flatten().collect()
    }
}

impl NeighborIndex for CellTable {
    fn for_each_candidate(&self, snapshot: &Snapshot, agent: usize, visit: &mut dyn FnMut(Neighbor)) {
        if agent >= self.cells.len() {
            return;
        }
        let p = snapshot.positions[agent];
        for range in self.neighborhood(agent) {
            for index in range {
                let offset = p - snapshot.positions[index];
                visit(Neighbor {
                    index,
                    offset,
                    dist2: offset.norm_squared(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::zero;

    fn snapshot(points: &[(f64, f64)]) -> Snapshot {
        Snapshot::from_parts(
            points.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            vec![zero(); points.len()],
        )
        .unwrap()
    }

    fn assert_partition(table: &CellTable, n: usize) {
        let mut covered = vec![0usize; n];
        let mut total = 0;
        for (_, range) in table.iter() {
            total += range.len();
            for i in range {
                covered[i] += 1;
            }
        }
        assert_eq!(total, n);
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn cell_assignment_uses_view_distance() {
        let grid = UniformGrid::with_cell_size(200.0, 200.0, 40.0).unwrap();
        assert_eq!(grid.dims(), (5, 5));
        assert_eq!(grid.cell_of(&Vec2::new(45.0, 79.0)), (1, 1));
        assert_eq!(grid.cell_of(&Vec2::new(199.0, 199.0)), (4, 4));
    }

    #[test]
    fn out_of_field_positions_clamp_to_edge_cells() {
        let grid = UniformGrid::with_cell_size(200.0, 200.0, 40.0).unwrap();
        assert_eq!(grid.cell_of(&Vec2::new(-0.5, 203.0)), (0, 4));
        assert_eq!(grid.cell_of(&Vec2::new(200.0, 0.0)), (4, 0));
    }

    #[test]
    fn squared_view_distance_collapses_to_one_cell() {
        let params = FlockParams {
            cell_sizing: crate::algorithms::flocking::CellSizing::SquaredViewDistance,
            ..FlockParams::default()
        };
        let grid = UniformGrid::new(&params).unwrap();
        assert_eq!(grid.cell_size(), 1600.0);
        assert_eq!(grid.dims(), (1, 1));
    }

    #[test]
    fn oversized_grid_is_rejected_at_construction() {
        let params = FlockParams {
            width: 1e12,
            height: 1e12,
            view_distance: 1e-3,
            separation_radius: 1e-3,
            alignment_radius: 1e-3,
            cohesion_radius: 1e-3,
            ..FlockParams::default()
        };
        assert_eq!(params.validate(), Ok(()));
        assert!(matches!(
            UniformGrid::new(&params),
            Err(FlockError::GridTooLarge { max_cells: MAX_GRID_CELLS, .. })
        ));

        // Just over the cap without overflowing.
        let side = (MAX_GRID_CELLS as f64).sqrt() + 1.0;
        assert!(UniformGrid::with_cell_size(side, side, 1.0).is_err());
        assert!(UniformGrid::with_cell_size(1024.0, 1024.0, 1.0).is_ok());
    }

    #[test]
    fn non_positive_cell_size_is_rejected() {
        assert_eq!(
            UniformGrid::with_cell_size(200.0, 200.0, 0.0).unwrap_err(),
            FlockError::InvalidCellSize(0.0)
        );
        assert!(UniformGrid::with_cell_size(200.0, 200.0, f64::NAN).is_err());
    }

    #[test]
    fn rebuild_sorts_by_x_cell_then_y_cell() {
        let mut grid = UniformGrid::with_cell_size(200.0, 200.0, 40.0).unwrap();
        let mut snap = snapshot(&[(150.0, 10.0), (10.0, 150.0), (10.0, 10.0), (12.0, 11.0)]);
        let table = grid.rebuild(&mut snap);

        assert_eq!(snap.ids, vec![2, 3, 1, 0]);
        assert_eq!(snap.positions[0], Vec2::new(10.0, 10.0));
        assert_eq!(table.range(0, 0), 0..2);
        assert_eq!(table.range(0, 3), 2..3);
        assert_eq!(table.range(3, 0), 3..4);
        assert_eq!(table.range(2, 2), EMPTY_CELL);
        assert_eq!(table.occupied_cells(), 3);
        assert_partition(&table, 4);
    }

    #[test]
    fn ranges_partition_the_flock() {
        let mut grid = UniformGrid::with_cell_size(200.0, 200.0, 40.0).unwrap();
        let points: Vec<(f64, f64)> = (0..37)
            .map(|i| {
                let t = i as f64;
                ((t * 37.3) % 200.0, (t * 71.9) % 200.0)
            })
            .collect();
        let mut snap = snapshot(&points);
        let table = grid.rebuild(&mut snap);
        assert_partition(&table, points.len());

        // Every agent sits inside the range of its own cell.
        for i in 0..snap.len() {
            let (cx, cy) = table.cell_of_agent(i);
            assert!(table.range(cx, cy).contains(&i));
            assert_eq!(grid.cell_of(&snap.positions[i]), (cx, cy));
        }
    }

    #[test]
    fn neighborhood_is_clipped_at_the_grid_edge() {
        let mut grid = UniformGrid::with_cell_size(200.0, 200.0, 40.0).unwrap();
        let mut snap = snapshot(&[(1.0, 1.0), (41.0, 41.0), (81.0, 1.0), (199.0, 199.0)]);
        let table = grid.rebuild(&mut snap);

        let corner = snap.ids.iter().position(|&id| id == 0).unwrap();
        let mut ids: Vec<usize> = table
            .candidate_indices(corner)
            .into_iter()
            .map(|slot| snap.ids[slot])
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn neighborhood_covers_every_agent_within_view_distance() {
        let mut grid = UniformGrid::with_cell_size(200.0, 200.0, 40.0).unwrap();
        let points: Vec<(f64, f64)> = (0..60)
            .map(|i| {
                let t = i as f64;
                ((t * 53.7) % 204.0 - 2.0, (t * 29.1) % 204.0 - 2.0)
            })
            .collect();
        let mut snap = snapshot(&points);
        let table = grid.rebuild(&mut snap);
        for i in 0..snap.len() {
            let candidates = table.candidate_indices(i);
            for j in 0..snap.len() {
                let d2 = (snap.positions[i] - snap.positions[j]).norm_squared();
                if d2 < 40.0 * 40.0 {
                    assert!(candidates.contains(&j), "agent {j} missing from candidates of {i}");
                }
            }
        }
    }

    #[test]
    fn empty_flock_yields_empty_table() {
        let mut grid = UniformGrid::with_cell_size(200.0, 200.0, 40.0).unwrap();
        let mut snap = Snapshot::default();
        let table = grid.rebuild(&mut snap);
        assert!(table.is_empty());
        assert_eq!(table.occupied_cells(), 0);
        assert!(table.candidate_indices(0).is_empty());
    }
}
