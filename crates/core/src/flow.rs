//! Lava-flow propagation by budget-bounded least-cost spreading.
//!
//! Models lava from a source cell as a Dijkstra-like frontier expansion over
//! the terrain cost surface, bounded by a finite heat budget that decays in
//! proportion to accumulated traversal cost instead of by an infinite search.
//! Cheap (downhill) paths carry the flow far; expensive (uphill) paths drain
//! the budget quickly. The result captures flow-length limiting without a
//! full thermodynamic simulation.
//!
//! Determinism: the frontier is an explicit min-priority queue keyed by
//! arrival cost with FIFO resolution among equal costs, and the visited set
//! is an arena indexed by grid coordinates. Identical grid, source, and
//! parameters always produce the identical extent.

use crate::error::{ConfigurationError, CoreError, OutOfBoundsError};
use crate::terrain::TerrainGrid;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Default safety bound on visited cells per simulation.
pub const DEFAULT_MAX_CELL_VISITS: usize = 1_000_000;

/// Parameters of one flow simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowParams {
    /// Simulated heat energy at the source. Zero is admitted and confines the
    /// flow to the source cell.
    pub initial_temperature_budget: f64,
    /// Budget drained per unit of traversal cost.
    pub cooling_rate_per_cost: f64,
    /// Hard stop on visited cells, guarding against unbounded expansion on
    /// flat terrain with negligible cooling.
    pub max_cell_visits: usize,
}

impl FlowParams {
    /// Create parameters with the default visit bound.
    #[must_use]
    pub fn new(initial_temperature_budget: f64, cooling_rate_per_cost: f64) -> Self {
        Self {
            initial_temperature_budget,
            cooling_rate_per_cost,
            max_cell_visits: DEFAULT_MAX_CELL_VISITS,
        }
    }

    /// Validate the parameters.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if the budget is negative or non-finite,
    /// the cooling rate is negative or non-finite, or the visit bound is zero.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.initial_temperature_budget.is_finite() || self.initial_temperature_budget < 0.0 {
            return Err(ConfigurationError::new(
                "initial_temperature_budget",
                format!(
                    "must be non-negative and finite, got {}",
                    self.initial_temperature_budget
                ),
            ));
        }
        if !self.cooling_rate_per_cost.is_finite() || self.cooling_rate_per_cost < 0.0 {
            return Err(ConfigurationError::new(
                "cooling_rate_per_cost",
                format!(
                    "must be non-negative and finite, got {}",
                    self.cooling_rate_per_cost
                ),
            ));
        }
        if self.max_cell_visits == 0 {
            return Err(ConfigurationError::new(
                "max_cell_visits",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// One covered cell with its cumulative traversal cost from the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowCell {
    /// Grid row.
    pub row: usize,
    /// Grid column.
    pub col: usize,
    /// Cumulative traversal cost from the source.
    pub arrival_cost: f64,
}

/// The immutable footprint of one simulated flow.
///
/// Cells appear in visit order, which is non-decreasing in arrival cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowExtent {
    /// Source cell the flow started from.
    pub source: (usize, usize),
    /// Covered cells in visit order.
    pub cells: Vec<FlowCell>,
}

impl FlowExtent {
    /// Number of covered cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the extent is empty (never true for a successful simulation:
    /// the source cell is always covered).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether a cell is covered.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.cells.iter().any(|c| c.row == row && c.col == col)
    }

    /// Largest arrival cost among covered cells.
    #[must_use]
    pub fn max_arrival_cost(&self) -> Option<f64> {
        self.cells
            .iter()
            .map(|c| c.arrival_cost)
            .fold(None, |acc, c| Some(acc.map_or(c, |a: f64| a.max(c))))
    }

    /// Covered area in square meters for a given cell resolution.
    #[must_use]
    pub fn area_m2(&self, cell_size_m: f64) -> f64 {
        self.cells.len() as f64 * cell_size_m * cell_size_m
    }
}

/// A frontier entry: a candidate cell keyed by arrival cost.
///
/// Ordering is (cost, sequence) ascending; the sequence number gives FIFO
/// resolution among equal costs for reproducible tie-breaking.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    budget: f64,
    seq: u64,
    row: usize,
    col: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Simulate one lava flow from a source cell.
///
/// Expands a least-cost frontier from the source until every cell reachable
/// with positive remaining heat budget has been covered or the visit bound is
/// hit. A popped cell whose budget is exhausted is still recorded as covered
/// but expands no further; a neighbor is only enqueued while the candidate
/// budget stays positive. The grid is read-only throughout.
///
/// # Errors
/// Returns [`CoreError::OutOfBounds`] if the source cell is outside the grid
/// and [`CoreError::Configuration`] if the parameters are invalid; both are
/// raised before any cell is visited.
pub fn simulate(
    source: (usize, usize),
    grid: &TerrainGrid,
    params: &FlowParams,
) -> Result<FlowExtent, CoreError> {
    params.validate()?;
    if !grid.contains(source.0, source.1) {
        return Err(OutOfBoundsError {
            row: source.0,
            col: source.1,
            rows: grid.rows(),
            cols: grid.cols(),
        }
        .into());
    }

    let cols = grid.cols();
    let arena = grid.rows() * cols;
    // Visited set and best-known costs live in a row-major arena, never
    // behind object references.
    let mut best_cost = vec![f64::INFINITY; arena];
    let mut visited = vec![false; arena];

    let mut frontier: BinaryHeap<std::cmp::Reverse<Frontier>> = BinaryHeap::new();
    let mut seq: u64 = 0;
    best_cost[source.0 * cols + source.1] = 0.0;
    frontier.push(std::cmp::Reverse(Frontier {
        cost: 0.0,
        budget: params.initial_temperature_budget,
        seq,
        row: source.0,
        col: source.1,
    }));

    let mut cells = Vec::new();

    while let Some(std::cmp::Reverse(current)) = frontier.pop() {
        let idx = current.row * cols + current.col;
        if visited[idx] {
            // Superseded entry for an already-settled cell
            continue;
        }
        visited[idx] = true;
        cells.push(FlowCell {
            row: current.row,
            col: current.col,
            arrival_cost: current.cost,
        });

        if cells.len() >= params.max_cell_visits {
            break;
        }
        if current.budget <= 0.0 {
            // Covered, but the lava here has cooled below flow threshold
            continue;
        }

        for (nr, nc) in grid.neighbors_of(current.row, current.col) {
            let nidx = nr * cols + nc;
            if visited[nidx] {
                continue;
            }
            let step = grid.cost_between((current.row, current.col), (nr, nc))?;
            let candidate_cost = current.cost + step;
            let candidate_budget = current.budget - params.cooling_rate_per_cost * step;
            if candidate_budget <= 0.0 {
                // Unreachable via this path: cooled below flow threshold
                continue;
            }
            if candidate_cost < best_cost[nidx] {
                best_cost[nidx] = candidate_cost;
                seq += 1;
                frontier.push(std::cmp::Reverse(Frontier {
                    cost: candidate_cost,
                    budget: candidate_budget,
                    seq,
                    row: nr,
                    col: nc,
                }));
            }
        }
    }

    Ok(FlowExtent { source, cells })
}
