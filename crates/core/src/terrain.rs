//! Terrain elevation grid and traversal-cost surface.
//!
//! Wraps an in-memory elevation raster (row-major, one sample per cell) as
//! the read-only cost surface the flow simulator expands over. The adapter is
//! thin by design: elevation lookup, 8-neighborhood enumeration, and a
//! traversal-cost function of the elevation gradient. Lava strongly prefers
//! downhill, so uphill moves cost proportionally to the rise while downhill
//! and flat moves pay only a constant floor — the floor is never zero because
//! lava loses heat on any move.
//!
//! An optional georeference maps WGS84 coordinates onto the raster so cluster
//! centroids can be located as source cells.

use crate::error::{ConfigurationError, OutOfBoundsError};
use crate::geo::{GeoPoint, METERS_PER_DEGREE};
use serde::{Deserialize, Serialize};

/// Default floor cost per move, cost units.
pub const DEFAULT_FLOOR_COST: f64 = 1.0;

/// Default uphill penalty per meter of rise, cost units.
pub const DEFAULT_UPHILL_COST_PER_M: f64 = 5.0;

/// Geographic anchoring of the raster.
///
/// `origin` is the center of cell (0, 0); rows grow southward and columns
/// eastward, the usual raster convention for north-up elevation tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeoreference {
    /// Center of cell (0, 0).
    pub origin: GeoPoint,
}

/// An immutable elevation raster with a declared cell resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainGrid {
    rows: usize,
    cols: usize,
    cell_size_m: f64,
    /// Elevation in meters, row-major order: `[row * cols + col]`.
    elevations: Vec<f64>,
    floor_cost: f64,
    uphill_cost_per_m: f64,
    georeference: Option<GridGeoreference>,
}

impl TerrainGrid {
    /// Create flat terrain at a uniform elevation.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if a dimension is zero or the cell size
    /// is not positive.
    pub fn flat(
        rows: usize,
        cols: usize,
        cell_size_m: f64,
        elevation: f64,
    ) -> Result<Self, ConfigurationError> {
        Self::from_elevations(rows, cols, cell_size_m, vec![elevation; rows * cols])
    }

    /// Create terrain from a row-major elevation array.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if a dimension is zero, the cell size is
    /// not positive, the array length does not match `rows * cols`, or any
    /// sample is non-finite.
    pub fn from_elevations(
        rows: usize,
        cols: usize,
        cell_size_m: f64,
        elevations: Vec<f64>,
    ) -> Result<Self, ConfigurationError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigurationError::new(
                "grid_dimensions",
                format!("rows and cols must be positive, got {rows}x{cols}"),
            ));
        }
        if !cell_size_m.is_finite() || cell_size_m <= 0.0 {
            return Err(ConfigurationError::not_positive("cell_size_m", cell_size_m));
        }
        if elevations.len() != rows * cols {
            return Err(ConfigurationError::new(
                "elevations",
                format!(
                    "expected {} samples for a {rows}x{cols} grid, got {}",
                    rows * cols,
                    elevations.len()
                ),
            ));
        }
        if let Some(bad) = elevations.iter().find(|e| !e.is_finite()) {
            return Err(ConfigurationError::new(
                "elevations",
                format!("all samples must be finite, found {bad}"),
            ));
        }

        Ok(Self {
            rows,
            cols,
            cell_size_m,
            elevations,
            floor_cost: DEFAULT_FLOOR_COST,
            uphill_cost_per_m: DEFAULT_UPHILL_COST_PER_M,
            georeference: None,
        })
    }

    /// Create terrain with a single Gaussian peak centered in the grid.
    ///
    /// Useful for tests and synthetic scenarios: a volcanic cone where every
    /// direction from the summit is downhill.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] under the same conditions as
    /// [`TerrainGrid::from_elevations`].
    pub fn single_peak(
        rows: usize,
        cols: usize,
        cell_size_m: f64,
        base_elevation: f64,
        peak_height: f64,
        peak_radius_cells: f64,
    ) -> Result<Self, ConfigurationError> {
        let center_r = (rows as f64 - 1.0) / 2.0;
        let center_c = (cols as f64 - 1.0) / 2.0;
        let mut elevations = Vec::with_capacity(rows * cols);

        for r in 0..rows {
            for c in 0..cols {
                let dr = r as f64 - center_r;
                let dc = c as f64 - center_c;
                let dist_sq = dr * dr + dc * dc;
                let profile = (-dist_sq / (peak_radius_cells * peak_radius_cells)).exp();
                elevations.push(base_elevation + peak_height * profile);
            }
        }

        Self::from_elevations(rows, cols, cell_size_m, elevations)
    }

    /// Override the traversal-cost constants.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if the floor cost is not positive (cost
    /// must never be zero) or the uphill penalty is negative.
    pub fn with_cost_model(
        mut self,
        floor_cost: f64,
        uphill_cost_per_m: f64,
    ) -> Result<Self, ConfigurationError> {
        if !floor_cost.is_finite() || floor_cost <= 0.0 {
            return Err(ConfigurationError::not_positive("floor_cost", floor_cost));
        }
        if !uphill_cost_per_m.is_finite() || uphill_cost_per_m < 0.0 {
            return Err(ConfigurationError::new(
                "uphill_cost_per_m",
                format!("must be non-negative, got {uphill_cost_per_m}"),
            ));
        }
        self.floor_cost = floor_cost;
        self.uphill_cost_per_m = uphill_cost_per_m;
        Ok(self)
    }

    /// Anchor the raster at a geographic origin (center of cell (0, 0)).
    #[must_use]
    pub fn with_georeference(mut self, georeference: GridGeoreference) -> Self {
        self.georeference = Some(georeference);
        self
    }

    /// Grid row count.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid column count.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell resolution in meters per cell.
    #[must_use]
    pub fn cell_size_m(&self) -> f64 {
        self.cell_size_m
    }

    /// Geographic anchoring, if set.
    #[must_use]
    pub fn georeference(&self) -> Option<GridGeoreference> {
        self.georeference
    }

    /// Whether a cell lies within the grid.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Elevation at a cell in meters.
    ///
    /// # Errors
    /// Returns [`OutOfBoundsError`] if the cell is outside the grid.
    pub fn elevation_at(&self, row: usize, col: usize) -> Result<f64, OutOfBoundsError> {
        if !self.contains(row, col) {
            return Err(OutOfBoundsError {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.elevations[row * self.cols + col])
    }

    /// Up to 8 adjacent in-bounds cells of `(row, col)`.
    ///
    /// Enumeration order is fixed (row-major over the 3x3 neighborhood) so
    /// callers relying on insertion order stay deterministic.
    #[must_use]
    pub fn neighbors_of(&self, row: usize, col: usize) -> Vec<(usize, usize)> {
        let mut neighbors = Vec::with_capacity(8);
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let nr = row as i64 + dr;
                let nc = col as i64 + dc;
                if nr >= 0 && nc >= 0 {
                    let (nr, nc) = (nr as usize, nc as usize);
                    if self.contains(nr, nc) {
                        neighbors.push((nr, nc));
                    }
                }
            }
        }
        neighbors
    }

    /// Traversal cost from cell `a` to adjacent cell `b`, always positive.
    ///
    /// Uphill moves pay the floor plus a penalty proportional to the rise;
    /// flat and downhill moves pay only the floor.
    ///
    /// # Errors
    /// Returns [`OutOfBoundsError`] if either cell is outside the grid.
    pub fn cost_between(
        &self,
        a: (usize, usize),
        b: (usize, usize),
    ) -> Result<f64, OutOfBoundsError> {
        let from = self.elevation_at(a.0, a.1)?;
        let to = self.elevation_at(b.0, b.1)?;
        let rise = (to - from).max(0.0);
        Ok(self.floor_cost + self.uphill_cost_per_m * rise)
    }

    /// Map a WGS84 point to the grid cell containing it.
    ///
    /// Returns `None` when the grid has no georeference or the point falls
    /// outside the raster.
    #[must_use]
    pub fn locate(&self, point: GeoPoint) -> Option<(usize, usize)> {
        let origin = self.georeference?.origin;

        let north_m = (origin.latitude - point.latitude) * METERS_PER_DEGREE;
        let east_m = (point.longitude - origin.longitude)
            * METERS_PER_DEGREE
            * origin.latitude.to_radians().cos();

        let row = (north_m / self.cell_size_m).round();
        let col = (east_m / self.cell_size_m).round();
        if row < 0.0 || col < 0.0 {
            return None;
        }

        let (row, col) = (row as usize, col as usize);
        self.contains(row, col).then_some((row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_terrain_uniform_elevation() {
        let grid = TerrainGrid::flat(4, 5, 100.0, 2500.0).unwrap();
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.cols(), 5);
        assert_eq!(grid.elevation_at(0, 0).unwrap(), 2500.0);
        assert_eq!(grid.elevation_at(3, 4).unwrap(), 2500.0);
    }

    #[test]
    fn elevation_out_of_bounds_is_typed_error() {
        let grid = TerrainGrid::flat(3, 3, 50.0, 0.0).unwrap();
        let err = grid.elevation_at(3, 0).unwrap_err();
        assert_eq!(err.row, 3);
        assert_eq!(err.rows, 3);
    }

    #[test]
    fn constructor_rejects_bad_dimensions() {
        assert!(TerrainGrid::flat(0, 3, 50.0, 0.0).is_err());
        assert!(TerrainGrid::flat(3, 3, 0.0, 0.0).is_err());
        assert!(TerrainGrid::from_elevations(2, 2, 50.0, vec![0.0; 3]).is_err());
        assert!(TerrainGrid::from_elevations(1, 2, 50.0, vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn neighbor_counts_by_position() {
        let grid = TerrainGrid::flat(3, 3, 50.0, 0.0).unwrap();
        assert_eq!(grid.neighbors_of(0, 0).len(), 3); // corner
        assert_eq!(grid.neighbors_of(0, 1).len(), 5); // edge
        assert_eq!(grid.neighbors_of(1, 1).len(), 8); // interior
    }

    #[test]
    fn uphill_costs_more_downhill_pays_floor() {
        // Column 0 at 100 m, column 1 at 110 m
        let grid =
            TerrainGrid::from_elevations(1, 2, 50.0, vec![100.0, 110.0]).unwrap();

        let uphill = grid.cost_between((0, 0), (0, 1)).unwrap();
        let downhill = grid.cost_between((0, 1), (0, 0)).unwrap();

        assert_relative_eq!(uphill, DEFAULT_FLOOR_COST + DEFAULT_UPHILL_COST_PER_M * 10.0);
        assert_relative_eq!(downhill, DEFAULT_FLOOR_COST);
        assert!(uphill > downhill);
        assert!(downhill > 0.0, "cost must never be zero");
    }

    #[test]
    fn cost_model_override_and_validation() {
        let grid = TerrainGrid::flat(2, 2, 50.0, 0.0)
            .unwrap()
            .with_cost_model(2.5, 0.0)
            .unwrap();
        assert_eq!(grid.cost_between((0, 0), (1, 1)).unwrap(), 2.5);

        let grid = TerrainGrid::flat(2, 2, 50.0, 0.0).unwrap();
        assert!(grid.clone().with_cost_model(0.0, 1.0).is_err());
        assert!(grid.with_cost_model(1.0, -1.0).is_err());
    }

    #[test]
    fn single_peak_is_highest_at_center() {
        let grid = TerrainGrid::single_peak(9, 9, 50.0, 1000.0, 500.0, 2.5).unwrap();
        let summit = grid.elevation_at(4, 4).unwrap();
        let flank = grid.elevation_at(4, 6).unwrap();
        let edge = grid.elevation_at(0, 0).unwrap();

        assert_relative_eq!(summit, 1500.0, epsilon = 1e-9);
        assert!(summit > flank);
        assert!(flank > edge);
        assert!(edge >= 1000.0);
    }

    #[test]
    fn locate_maps_coordinates_to_cells() {
        let origin = GeoPoint::new(0.0, 0.0);
        let grid = TerrainGrid::flat(20, 20, 100.0, 0.0)
            .unwrap()
            .with_georeference(GridGeoreference { origin });

        // The origin is the center of cell (0, 0)
        assert_eq!(grid.locate(origin), Some((0, 0)));

        // ~111 m south and ~111 m east of the origin is cell (1, 1)
        let point = GeoPoint::new(-0.001, 0.001);
        assert_eq!(grid.locate(point), Some((1, 1)));

        // Far north of the origin is off-grid
        assert_eq!(grid.locate(GeoPoint::new(1.0, 0.0)), None);
        // Far south overruns the 20 rows
        assert_eq!(grid.locate(GeoPoint::new(-1.0, 0.0)), None);
    }

    #[test]
    fn locate_without_georeference_is_none() {
        let grid = TerrainGrid::flat(4, 4, 100.0, 0.0).unwrap();
        assert_eq!(grid.locate(GeoPoint::new(0.0, 0.0)), None);
    }
}
