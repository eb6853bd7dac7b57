//! Charge Deposition
//!
//! Rasterizes point charges into a continuous density field ρ by normalized,
//! truncated Gaussian stamps. Each charge is centered on its nearest grid
//! node and spread over a rectangular stamp of ±3σ, clipped to the grid.
//!
//! The stamp is normalized **after** clipping: the raw weights are summed
//! first, then scaled so the integrated density over the surviving cells
//! equals `q` exactly (up to floating rounding). A charge clipped at a
//! corner therefore still conserves its full charge on the remaining
//! support.
//!
//! Skipped charges (never an error):
//! - non-finite position or magnitude,
//! - nearest node outside `[0, nx) × [0, ny)`,
//! - a pathological stamp whose weight sum is ≤ 0.
//!
//! Multiple charges superpose additively. ρ is built once per solve and
//! never mutated afterwards.

#![forbid(unsafe_code)]

use tracing::{debug, warn};

use crate::grid::Grid;
use crate::scene::PointCharge;
use crate::Real;

/// Floor applied to the cell spacing before σ is derived, guarding
/// against degenerate domains.
const SIGMA_SPACING_FLOOR: f64 = 1e-9;

/// Floor applied to the caller's σ in cell units.
const SIGMA_CELLS_FLOOR: f64 = 0.25;

/// Build the charge density field for a scene's charges.
///
/// Returns a row-major `nx·ny` array. `sigma_cells` is the Gaussian width
/// in cell units (floored at 0.25).
pub fn deposit_charges(grid: &Grid, charges: &[PointCharge], sigma_cells: f64) -> Vec<Real> {
    let mut rho = vec![0.0 as Real; grid.len()];
    for c in charges {
        deposit_one(grid, c, sigma_cells, &mut rho);
    }
    rho
}

fn deposit_one(grid: &Grid, charge: &PointCharge, sigma_cells: f64, rho: &mut [Real]) {
    let PointCharge { x, y, q } = *charge;
    if !x.is_finite() || !y.is_finite() || !q.is_finite() {
        warn!(x, y, q, "skipping charge with non-finite components");
        return;
    }

    // Nearest node; out-of-grid charges are silently ignored.
    let i0 = ((x - grid.x_min) / grid.dx).round() as i64;
    let j0 = ((y - grid.y_min) / grid.dy).round() as i64;
    if i0 < 0 || i0 >= grid.nx as i64 || j0 < 0 || j0 >= grid.ny as i64 {
        debug!(x, y, "skipping charge outside the grid");
        return;
    }

    let sigma_x = grid.dx.max(SIGMA_SPACING_FLOOR) * sigma_cells.max(SIGMA_CELLS_FLOOR);
    let sigma_y = grid.dy.max(SIGMA_SPACING_FLOOR) * sigma_cells.max(SIGMA_CELLS_FLOOR);

    // Truncation radius in cells, stamp clipped to the grid.
    let ri = (3.0 * sigma_x / grid.dx).ceil() as i64;
    let rj = (3.0 * sigma_y / grid.dy).ceil() as i64;
    let i_lo = (i0 - ri).max(0) as usize;
    let i_hi = ((i0 + ri).min(grid.nx as i64 - 1)) as usize;
    let j_lo = (j0 - rj).max(0) as usize;
    let j_hi = ((j0 + rj).min(grid.ny as i64 - 1)) as usize;

    let inv_2sx2 = 0.5 / (sigma_x * sigma_x);
    let inv_2sy2 = 0.5 / (sigma_y * sigma_y);

    // First pass: raw weight sum over the clipped stamp.
    let mut weight_sum = 0.0f64;
    for j in j_lo..=j_hi {
        let wy = grid.node_y(j) - y;
        let ey = wy * wy * inv_2sy2;
        for i in i_lo..=i_hi {
            let wx = grid.node_x(i) - x;
            weight_sum += (-(wx * wx * inv_2sx2 + ey)).exp();
        }
    }
    if weight_sum <= 0.0 {
        debug!(x, y, "skipping charge with degenerate stamp");
        return;
    }

    // Second pass: normalized deposition. The integrated density over the
    // stamp, Σ scale·w·dx·dy, equals q regardless of clipping.
    let scale = q / (weight_sum * grid.dx * grid.dy);
    for j in j_lo..=j_hi {
        let wy = grid.node_y(j) - y;
        let ey = wy * wy * inv_2sy2;
        let row = j * grid.nx;
        for i in i_lo..=i_hi {
            let wx = grid.node_x(i) - x;
            let w = (-(wx * wx * inv_2sx2 + ey)).exp();
            rho[row + i] += (scale * w) as Real;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::DomainBounds;
    use crate::GridSpec;

    fn unit_grid(n: usize) -> Grid {
        let bounds = DomainBounds { x_min: -1.0, x_max: 1.0, y_min: -1.0, y_max: 1.0, epsilon: 1.0 };
        Grid::from_spec_r(&bounds, GridSpec { nx: n, ny: n }).unwrap()
    }

    fn integrated_charge(grid: &Grid, rho: &[Real]) -> f64 {
        rho.iter().map(|&r| r as f64).sum::<f64>() * grid.dx * grid.dy
    }

    #[test]
    fn centered_charge_conserves_q() {
        let g = unit_grid(101);
        let rho = deposit_charges(&g, &[PointCharge { x: 0.0, y: 0.0, q: 1.0 }], 1.0);
        let total = integrated_charge(&g, &rho);
        assert!((total - 1.0).abs() < 1e-5, "integrated charge {total}");
    }

    #[test]
    fn corner_charge_conserves_q_on_clipped_support() {
        // Stamp clipped to a quarter at the corner node; normalization runs
        // over the surviving cells, so the integral still equals q.
        let g = unit_grid(101);
        let rho = deposit_charges(&g, &[PointCharge { x: -1.0, y: -1.0, q: 1.0 }], 1.0);
        let total = integrated_charge(&g, &rho);
        assert!((total - 1.0).abs() < 1e-5, "integrated charge {total}");
    }

    #[test]
    fn charges_superpose_additively() {
        let g = unit_grid(101);
        let rho = deposit_charges(
            &g,
            &[
                PointCharge { x: -0.25, y: 0.0, q: 1.0 },
                PointCharge { x: 0.25, y: 0.0, q: -1.0 },
            ],
            1.0,
        );
        let total = integrated_charge(&g, &rho);
        assert!(total.abs() < 1e-5, "dipole nets to zero, got {total}");
    }

    #[test]
    fn out_of_grid_and_nonfinite_charges_are_skipped() {
        let g = unit_grid(64);
        let rho = deposit_charges(
            &g,
            &[
                PointCharge { x: 5.0, y: 0.0, q: 1.0 },
                PointCharge { x: f64::NAN, y: 0.0, q: 1.0 },
                PointCharge { x: 0.0, y: 0.0, q: f64::INFINITY },
            ],
            1.0,
        );
        assert!(rho.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn sigma_floor_keeps_tight_stamps_sane() {
        // σcells below 0.25 floors to 0.25; deposition stays normalized.
        let g = unit_grid(101);
        let rho = deposit_charges(&g, &[PointCharge { x: 0.1, y: -0.2, q: 2.0 }], 0.01);
        let total = integrated_charge(&g, &rho);
        assert!((total - 2.0).abs() < 1e-4, "integrated charge {total}");
    }

    #[test]
    fn negative_charge_deposits_negative_density() {
        let g = unit_grid(64);
        let rho = deposit_charges(&g, &[PointCharge { x: 0.0, y: 0.0, q: -1.5 }], 1.0);
        let total = integrated_charge(&g, &rho);
        assert!((total + 1.5).abs() < 1e-4);
        assert!(rho.iter().all(|&r| r <= 0.0));
    }
}
