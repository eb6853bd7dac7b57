//! Crate root: public surface, core aliases, and solver-wide invariants
//!
//! This module is the **single canonical entry-point** for downstream users of
//! the library. It centralizes the field scalar alias, the solve parameter
//! structs, shared error categories, and re-exports the submodules that
//! implement the electrostatic solver.
//!
//! ## Invariants
//!
//! - **Discretization.** The domain is a rectangle sampled on a uniform
//!   node-centered Cartesian grid, `nx × ny` nodes, row-major storage with
//!   index `k = j·nx + i`. Node `(i, j)` sits at world coordinates
//!   `(x_min + i·dx, y_min + j·dy)` with `dx = (x_max − x_min)/(nx − 1)`.
//!   All coordinate derivation lives in [`grid::Grid`]; no module recomputes
//!   spacings on its own.
//!
//! - **Boundary discipline.** The outer ring of nodes is reserved for the
//!   homogeneous Neumann condition, maintained by copying the first interior
//!   neighbor at the start of every sweep and once more after the last.
//!   Interior updates never touch the ring.
//!
//! - **Dirichlet mask.** Cells covered by a conductor hold exactly their
//!   prescribed potential throughout the iteration. The sweep skips them;
//!   neighbors read the stored (fixed) value with no special casing.
//!
//! - **Determinism.** The sweep is lexicographic Gauss–Seidel. Given
//!   identical inputs, two solves produce bit-identical `φ` on conforming
//!   IEEE-754 hardware. No API in this crate introduces hidden ordering.
//!
//! Violations of the input contract surface as a **precise error** before
//! any iteration runs (never a partial result); we **forbid unsafe**
//! throughout the crate.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

use serde::{Deserialize, Serialize};

/// Scene description: domain bounds, point charges, conductors.
pub mod scene;
/// Grid geometry (spacings, node coordinates, index math, input digest).
pub mod grid;
/// Gaussian charge deposition into the density field ρ.
pub mod deposit;
/// Conductor mask precomputation (Dirichlet cells + fixed values).
pub mod mask;
/// SOR Gauss–Seidel sweep and Neumann boundary maintenance.
pub mod sweep;
/// Residual estimator (RMS of the discrete PDE imbalance).
pub mod residual;
/// Iteration driver: termination, sampling, output assembly.
pub mod solver;
/// Binary φ codec and FNV-1a fingerprint (renderer/project contracts).
pub mod encode;
/// Bounded, thread-safe result store for raw φ dumps.
pub mod store;
/// Ergonomic surface: builder, one-shot helpers, project snapshot I/O.
pub mod api;

// ============================================================================
// Canonical aliases and root-level re-exports (centralization)
// ============================================================================

/// Field scalar used for the grid arrays (φ, ρ, residual samples).
///
/// Geometry inputs (bounds, charge positions, potentials) stay `f64`;
/// the fields themselves are single-precision per the wire contract.
pub type Real = f32;

pub use crate::scene::{Conductor, DomainBounds, PointCharge, Scene, SceneError};

pub use crate::grid::GridError;

pub use crate::solver::{solve, solve_with_log, SolveError};

// ============================================================================
// Public parameter structs and result type
// ============================================================================

/// Grid resolution requested by the caller.
///
/// Both dimensions are clamped to [`grid::MIN_DIM`]`..=`[`grid::MAX_DIM`]
/// before any geometry is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Node count along x.
    pub nx: usize,
    /// Node count along y.
    pub ny: usize,
}

/// Iteration parameters for a single solve.
///
/// Every field admits a sensible clamp (see [`solver`]); only non-finite
/// `tolerance` / `omega` are rejected outright.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSpec {
    /// Maximum number of sweeps. Clamped to `1..=200_000`.
    pub max_iters: u32,
    /// Termination threshold on the sampled residual. Floored at `1e-10`.
    pub tolerance: f64,
    /// SOR relaxation factor ω. Clamped to `0.1..=1.99`.
    pub omega: f64,
    /// Gaussian deposition width in cell units. Floored at `0.25`.
    pub charge_sigma_cells: f64,
}

impl Default for SolverSpec {
    fn default() -> Self {
        Self { max_iters: 2000, tolerance: 1e-5, omega: 1.7, charge_sigma_cells: 1.0 }
    }
}

/// Output of a completed solve.
///
/// `phi` is row-major, `nx·ny` single-precision values; ownership transfers
/// to the caller. The reported extrema are sanitized so the result is always
/// well-formed for a renderer (non-finite range collapses to `[−1, 1]`, a
/// degenerate span is widened by `1e-6`).
#[derive(Clone, Debug)]
pub struct SolveResult {
    /// Potential field, row-major with index `k = j·nx + i`.
    pub phi: Vec<Real>,
    /// Node count along x.
    pub nx: usize,
    /// Node count along y.
    pub ny: usize,
    /// Domain lower x bound.
    pub x_min: f64,
    /// Domain upper x bound.
    pub x_max: f64,
    /// Domain lower y bound.
    pub y_min: f64,
    /// Domain upper y bound.
    pub y_max: f64,
    /// Minimum of `phi` after sanitization.
    pub phi_min: Real,
    /// Maximum of `phi` after sanitization.
    pub phi_max: Real,
    /// 1-based count of completed sweeps.
    pub iterations: u32,
    /// Last sampled residual (RMS of the PDE imbalance).
    pub residual: Real,
}
