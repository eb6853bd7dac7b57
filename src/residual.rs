//! Residual Estimator
//!
//! Discrete L2 measure of the PDE imbalance `r = −Δφ − ρ/ε`, evaluated on
//! interior cells that are not Dirichlet-masked (masked cells have no
//! residual meaning). The reported value is `√(Σ r² / N)` over the `N`
//! sampled cells, or 0 when nothing qualifies.
//!
//! The per-cell residual is computed in field precision; the reduction
//! accumulates in `f64` (any associative-sum strategy is acceptable, this
//! one is the deterministic row-major fold).

#![forbid(unsafe_code)]

use crate::grid::Grid;
use crate::mask::ConductorMask;
use crate::sweep::SweepCoeffs;
use crate::Real;

/// RMS of `−Δφ − ρ/ε` over unmasked interior cells.
pub fn residual_rms(
    grid: &Grid,
    phi: &[Real],
    rho: &[Real],
    mask: &ConductorMask,
    coeffs: &SweepCoeffs,
) -> f64 {
    let nx = grid.nx;
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for j in 1..grid.ny - 1 {
        let row = j * nx;
        for i in 1..nx - 1 {
            let k = row + i;
            if mask.is_fixed(k) {
                continue;
            }
            let lap = (phi[k - 1] - 2.0 * phi[k] + phi[k + 1]) * coeffs.inv_dx2
                + (phi[k - nx] - 2.0 * phi[k] + phi[k + nx]) * coeffs.inv_dy2;
            let r = (-lap - rho[k] * coeffs.inv_eps) as f64;
            sum += r * r;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    (sum / count as f64).sqrt()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Conductor, DomainBounds};
    use crate::GridSpec;

    fn unit_grid(n: usize) -> Grid {
        let bounds = DomainBounds { x_min: -1.0, x_max: 1.0, y_min: -1.0, y_max: 1.0, epsilon: 1.0 };
        Grid::from_spec_r(&bounds, GridSpec { nx: n, ny: n }).unwrap()
    }

    #[test]
    fn zero_field_zero_density_has_zero_residual() {
        let g = unit_grid(32);
        let mask = ConductorMask::build(&g, &[]);
        let phi = vec![0.0 as Real; g.len()];
        let rho = vec![0.0 as Real; g.len()];
        let coeffs = SweepCoeffs::new(&g, 1.0);
        assert_eq!(residual_rms(&g, &phi, &rho, &mask, &coeffs), 0.0);
    }

    #[test]
    fn unsourced_flat_field_with_density_has_rms_equal_to_density() {
        // With φ ≡ 0 the Laplacian vanishes, so r = −ρ/ε cell-wise and the
        // RMS equals the uniform density magnitude.
        let g = unit_grid(32);
        let mask = ConductorMask::build(&g, &[]);
        let phi = vec![0.0 as Real; g.len()];
        let rho = vec![0.5 as Real; g.len()];
        let coeffs = SweepCoeffs::new(&g, 1.0);
        let r = residual_rms(&g, &phi, &rho, &mask, &coeffs);
        assert!((r - 0.5).abs() < 1e-6, "rms {r}");
    }

    #[test]
    fn fully_masked_interior_reports_zero() {
        let g = unit_grid(32);
        // Rectangle covering the whole domain: every interior cell is fixed.
        let c = Conductor::Rectangle { x_min: -2.0, x_max: 2.0, y_min: -2.0, y_max: 2.0, potential: 1.0 };
        let mask = ConductorMask::build(&g, &[c]);
        let phi = vec![1.0 as Real; g.len()];
        let rho = vec![3.0 as Real; g.len()];
        let coeffs = SweepCoeffs::new(&g, 1.0);
        assert_eq!(residual_rms(&g, &phi, &rho, &mask, &coeffs), 0.0);
    }

    #[test]
    fn epsilon_scales_the_source_term() {
        let g = unit_grid(32);
        let mask = ConductorMask::build(&g, &[]);
        let phi = vec![0.0 as Real; g.len()];
        let rho = vec![1.0 as Real; g.len()];
        let coeffs = SweepCoeffs::new(&g, 4.0);
        let r = residual_rms(&g, &phi, &rho, &mask, &coeffs);
        assert!((r - 0.25).abs() < 1e-6, "rms {r}");
    }
}
