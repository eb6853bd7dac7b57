//! Grid Geometry Primitives
//!
//! Uniform node-centered Cartesian grid over a rectangular domain. This
//! module is the single definition site for cell spacings, node world
//! coordinates, and the row-major index map `k = j·nx + i`; every other
//! module derives its coordinates from here.
//!
//! - **Clamping**: requested dimensions are clamped to `[MIN_DIM, MAX_DIM]`
//!   before spacings are derived, so a grid is never degenerate.
//! - **Validation**: inverted (`x_max ≤ x_min`) or non-finite bounds fail
//!   with a precise [`GridError`] before any allocation.
//! - **Digest**: a stable 32-byte digest over the geometric inputs, used in
//!   logs and the transport response for reproducibility spot-checks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use blake3::Hasher;

use crate::scene::DomainBounds;
use crate::GridSpec;

/// Smallest accepted node count per dimension.
pub const MIN_DIM: usize = 32;
/// Largest accepted node count per dimension.
pub const MAX_DIM: usize = 2048;

/// Errors produced by grid construction.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("domain bounds must be finite")]
    NonFiniteBounds,
    #[error("domain extent is empty or inverted (x: {x_min}..{x_max}, y: {y_min}..{y_max})")]
    EmptyExtent {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },
}

/// Derived grid geometry, immutable for the duration of a solve.
#[derive(Clone, Copy, Debug)]
pub struct Grid {
    /// Node count along x (already clamped).
    pub nx: usize,
    /// Node count along y (already clamped).
    pub ny: usize,
    /// Cell spacing along x: `(x_max − x_min)/(nx − 1)`.
    pub dx: f64,
    /// Cell spacing along y.
    pub dy: f64,
    /// Origin (lower-left node world coordinates).
    pub x_min: f64,
    pub y_min: f64,
    /// Upper bounds, carried through to the solve result.
    pub x_max: f64,
    pub y_max: f64,
}

impl Grid {
    /// Derive geometry from bounds and a requested resolution, returning a
    /// checked result. Dimensions are clamped, never rejected.
    pub fn from_spec_r(bounds: &DomainBounds, spec: GridSpec) -> Result<Self, GridError> {
        let DomainBounds { x_min, x_max, y_min, y_max, .. } = *bounds;
        if ![x_min, x_max, y_min, y_max].iter().all(|b| b.is_finite()) {
            return Err(GridError::NonFiniteBounds);
        }
        if x_max <= x_min || y_max <= y_min {
            return Err(GridError::EmptyExtent { x_min, x_max, y_min, y_max });
        }
        let nx = spec.nx.clamp(MIN_DIM, MAX_DIM);
        let ny = spec.ny.clamp(MIN_DIM, MAX_DIM);
        let dx = (x_max - x_min) / (nx - 1) as f64;
        let dy = (y_max - y_min) / (ny - 1) as f64;
        Ok(Self { nx, ny, dx, dy, x_min, y_min, x_max, y_max })
    }

    /// Total node count `nx·ny`.
    #[inline]
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Row-major index of node `(i, j)`.
    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny, "node ({i}, {j}) out of grid");
        j * self.nx + i
    }

    /// World x coordinate of column `i`.
    #[inline]
    pub fn node_x(&self, i: usize) -> f64 {
        self.x_min + i as f64 * self.dx
    }

    /// World y coordinate of row `j`.
    #[inline]
    pub fn node_y(&self, j: usize) -> f64 {
        self.y_min + j as f64 * self.dy
    }
}

// ------------------------- Digest (for logs/metadata) -------------------------

/// Stable 32-byte digest of the geometric solve inputs.
///
/// Covers bounds, effective permittivity, and the clamped dimensions; used
/// in logs and the transport response, never in the numerics.
pub fn grid_digest(bounds: &DomainBounds, grid: &Grid) -> [u8; 32] {
    let mut bytes = Vec::with_capacity(7 * 8);
    for b in [bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max, bounds.effective_epsilon()] {
        bytes.extend_from_slice(&b.to_le_bytes());
    }
    bytes.extend_from_slice(&(grid.nx as u64).to_le_bytes());
    bytes.extend_from_slice(&(grid.ny as u64).to_le_bytes());
    let mut h = Hasher::new();
    h.update(b"fieldsim.grid.v1");
    h.update(&bytes);
    *h.finalize().as_bytes()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> DomainBounds {
        DomainBounds { x_min: -1.0, x_max: 1.0, y_min: -1.0, y_max: 1.0, epsilon: 1.0 }
    }

    #[test]
    fn spacings_and_node_coordinates() {
        let g = Grid::from_spec_r(&unit_bounds(), GridSpec { nx: 101, ny: 51 }).unwrap();
        assert_eq!((g.nx, g.ny), (101, 51));
        assert!((g.dx - 0.02).abs() < 1e-15);
        assert!((g.dy - 0.04).abs() < 1e-15);
        assert_eq!(g.node_x(0), -1.0);
        assert_eq!(g.node_y(g.ny - 1), g.y_min + (g.ny - 1) as f64 * g.dy);
        // last node lands on the upper bound to within rounding
        assert!((g.node_x(g.nx - 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn row_major_index_map() {
        let g = Grid::from_spec_r(&unit_bounds(), GridSpec { nx: 64, ny: 32 }).unwrap();
        assert_eq!(g.idx(0, 0), 0);
        assert_eq!(g.idx(5, 0), 5);
        assert_eq!(g.idx(0, 1), 64);
        assert_eq!(g.idx(63, 31), g.len() - 1);
    }

    #[test]
    fn dimensions_clamp_to_supported_range() {
        let g = Grid::from_spec_r(&unit_bounds(), GridSpec { nx: 4, ny: 100_000 }).unwrap();
        assert_eq!(g.nx, MIN_DIM);
        assert_eq!(g.ny, MAX_DIM);
    }

    #[test]
    fn inverted_or_nonfinite_bounds_are_rejected() {
        let mut b = unit_bounds();
        b.x_max = -2.0;
        assert!(matches!(
            Grid::from_spec_r(&b, GridSpec { nx: 64, ny: 64 }),
            Err(GridError::EmptyExtent { .. })
        ));

        let mut b = unit_bounds();
        b.y_min = f64::NAN;
        assert!(matches!(
            Grid::from_spec_r(&b, GridSpec { nx: 64, ny: 64 }),
            Err(GridError::NonFiniteBounds)
        ));

        let mut b = unit_bounds();
        b.x_min = f64::NEG_INFINITY;
        assert!(matches!(
            Grid::from_spec_r(&b, GridSpec { nx: 64, ny: 64 }),
            Err(GridError::NonFiniteBounds)
        ));
    }

    #[test]
    fn digest_is_stable_and_input_sensitive() {
        let b = unit_bounds();
        let g = Grid::from_spec_r(&b, GridSpec { nx: 64, ny: 64 }).unwrap();
        let d1 = grid_digest(&b, &g);
        let d2 = grid_digest(&b, &g);
        assert_eq!(d1, d2);

        let g2 = Grid::from_spec_r(&b, GridSpec { nx: 65, ny: 64 }).unwrap();
        assert_ne!(d1, grid_digest(&b, &g2));
    }
}
