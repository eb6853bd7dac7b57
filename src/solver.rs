//! Iteration Driver
//!
//! Orchestrates a complete solve: parameter clamping, geometry derivation,
//! charge deposition, mask construction, the SOR iteration loop with
//! periodic residual sampling, and output assembly.
//!
//! ## Loop shape
//!
//! ```text
//! φ ← 0; φ[masked] ← fixed value
//! ρ ← deposit(charges)
//! for it in 0..max_iters:
//!     apply Neumann ring
//!     SOR sweep over the interior (masked cells skipped)
//!     if it % 10 == 0 or it == max_iters−1:
//!         r ← residual RMS; append to log if given
//!         break if r < tol
//! apply Neumann ring once more
//! sanitize the φ range; report it+1 sweeps and the last sampled r
//! ```
//!
//! Termination is residual-driven or iteration-bounded; there is no
//! divergence detection. A residual that goes NaN simply fails the `< tol`
//! comparison until `max_iters` runs out, and the final range sanitization
//! keeps the output well-formed for a renderer.
//!
//! The solve is synchronous and referentially pure: identical inputs give
//! bit-identical φ. Cancellation is not supported mid-sweep; bound
//! `max_iters` instead.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use tracing::{debug, info, warn};

use crate::deposit::deposit_charges;
use crate::grid::{Grid, GridError};
use crate::mask::ConductorMask;
use crate::residual::residual_rms;
use crate::scene::{Scene, SceneError};
use crate::sweep::{apply_neumann, sor_sweep, SweepCoeffs};
use crate::{GridSpec, Real, SolveResult, SolverSpec};

/// Iteration ceiling after clamping.
pub const MAX_ITERS_CAP: u32 = 200_000;
/// Tolerance floor applied before the convergence test.
pub const TOLERANCE_FLOOR: f64 = 1e-10;
/// Relaxation factor bounds.
pub const OMEGA_MIN: f64 = 0.1;
pub const OMEGA_MAX: f64 = 1.99;
/// Residual sampling stride in iterations.
const SAMPLE_EVERY: u32 = 10;

/// Unified solve error: every input violation that cannot be clamped away.
///
/// Surfaced before any iteration runs; no partial results.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error(transparent)]
    InvalidDomain(#[from] GridError),
    #[error(transparent)]
    InvalidConductor(#[from] SceneError),
    #[error("tolerance must be finite (got {0})")]
    NonFiniteTolerance(f64),
    #[error("relaxation factor must be finite (got {0})")]
    NonFiniteOmega(f64),
}

/// Solve the scene with default residual logging disabled.
pub fn solve(scene: &Scene, grid: GridSpec, spec: &SolverSpec) -> Result<SolveResult, SolveError> {
    solve_with_log(scene, grid, spec, None)
}

/// Solve the scene, appending every sampled residual to `residual_log`
/// when supplied (in sampling order; at least one sample is always taken).
pub fn solve_with_log(
    scene: &Scene,
    grid: GridSpec,
    spec: &SolverSpec,
    mut residual_log: Option<&mut Vec<Real>>,
) -> Result<SolveResult, SolveError> {
    // Reject the inputs no clamp can fix, then clamp the rest.
    if !spec.tolerance.is_finite() {
        return Err(SolveError::NonFiniteTolerance(spec.tolerance));
    }
    if !spec.omega.is_finite() {
        return Err(SolveError::NonFiniteOmega(spec.omega));
    }
    let grid = Grid::from_spec_r(&scene.domain, grid)?;
    scene.validate_conductors_r()?;

    let tol = spec.tolerance.max(TOLERANCE_FLOOR);
    let max_iters = spec.max_iters.clamp(1, MAX_ITERS_CAP);
    let omega = spec.omega.clamp(OMEGA_MIN, OMEGA_MAX) as Real;
    let epsilon = scene.domain.effective_epsilon();
    let coeffs = SweepCoeffs::new(&grid, epsilon);

    let rho = deposit_charges(&grid, &scene.charges, spec.charge_sigma_cells);
    let mask = ConductorMask::build(&grid, &scene.conductors);

    // Cold start: zeros everywhere, fixed values on masked cells.
    let mut phi = vec![0.0 as Real; grid.len()];
    mask.apply(&mut phi);

    debug!(
        nx = grid.nx,
        ny = grid.ny,
        charges = scene.charges.len(),
        fixed_cells = mask.fixed_cell_count(),
        max_iters,
        tol,
        "starting solve"
    );

    let mut last_residual = 0.0f64;
    let mut completed = 0u32;
    for it in 0..max_iters {
        apply_neumann(&grid, &mut phi);
        sor_sweep(&grid, &mut phi, &rho, &mask, &coeffs, omega);
        completed = it + 1;

        if it % SAMPLE_EVERY == 0 || it == max_iters - 1 {
            last_residual = residual_rms(&grid, &phi, &rho, &mask, &coeffs);
            if let Some(log) = residual_log.as_deref_mut() {
                log.push(last_residual as Real);
            }
            debug!(iteration = completed, residual = last_residual, "residual sample");
            if last_residual < tol {
                break;
            }
        }
    }
    apply_neumann(&grid, &mut phi);

    if last_residual < tol {
        info!(iterations = completed, residual = last_residual, "solver converged");
    } else {
        info!(iterations = completed, residual = last_residual, "iteration budget exhausted");
    }

    // Range sanitization: the output must stay renderable even when the
    // iteration went numerically pathological.
    let mut phi_min = Real::INFINITY;
    let mut phi_max = Real::NEG_INFINITY;
    for &v in &phi {
        phi_min = phi_min.min(v);
        phi_max = phi_max.max(v);
    }
    if !phi_min.is_finite() || !phi_max.is_finite() {
        warn!("non-finite φ range, collapsing to [-1, 1]");
        phi_min = -1.0;
        phi_max = 1.0;
    }
    if phi_max - phi_min < 1e-12 {
        phi_max = phi_min + 1e-6;
    }

    Ok(SolveResult {
        phi,
        nx: grid.nx,
        ny: grid.ny,
        x_min: grid.x_min,
        x_max: grid.x_max,
        y_min: grid.y_min,
        y_max: grid.y_max,
        phi_min,
        phi_max,
        iterations: completed,
        residual: last_residual as Real,
    })
}

// ============================================================================
// Tests (spec scenarios and invariants)
// ============================================================================
