//! Happy-path crate API
//!
//! This module wraps the solver core with a small, ergonomic surface area:
//! - `SolverBuilder` hides parameter wiring (safe defaults, chainable knobs)
//! - one-shot `solve_scene` / `solve_scene_with_log`
//! - project snapshot I/O helpers: `io::write_project` / `io::read_project`
//! - simple `estimate_peak_memory` for operator guidance
//!
//! Everything delegates to the existing [`crate::solver`] driver and
//! respects its clamping/validation discipline. No solver changes.

#![forbid(unsafe_code)]

use crate::{solver, GridSpec, Real, Scene, SolveResult, SolverSpec};

// ===============================================================================================
// Builder
// ===============================================================================================

/// Ergonomic constructor for a [`SolverSpec`].
///
/// Defaults match `SolverSpec::default()`: 2000 sweeps, tolerance 1e-5,
/// ω 1.7, σ 1.0 cell. Values are taken as-is here; the driver applies the
/// clamps at solve time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolverBuilder {
    spec: SolverSpec,
}

impl SolverBuilder {
    /// Start from the default parameters.
    pub fn new() -> Self {
        Self::default()
    }
    /// Set the sweep budget.
    pub fn max_iters(mut self, n: u32) -> Self {
        self.spec.max_iters = n;
        self
    }
    /// Set the residual termination threshold.
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.spec.tolerance = tol;
        self
    }
    /// Set the SOR relaxation factor.
    pub fn omega(mut self, omega: f64) -> Self {
        self.spec.omega = omega;
        self
    }
    /// Set the Gaussian deposition width in cell units.
    pub fn charge_sigma_cells(mut self, sigma: f64) -> Self {
        self.spec.charge_sigma_cells = sigma;
        self
    }
    /// Finish the builder.
    pub fn build(self) -> SolverSpec {
        self.spec
    }
}

// ===============================================================================================
/* One-shot helpers */
// ===============================================================================================

/// Solve a scene, converting the typed solver error at the edge.
pub fn solve_scene(scene: &Scene, grid: GridSpec, spec: &SolverSpec) -> anyhow::Result<SolveResult> {
    solver::solve(scene, grid, spec).map_err(|e| anyhow::anyhow!("solve failed: {e}"))
}

/// Solve a scene and collect every sampled residual into `log`.
pub fn solve_scene_with_log(
    scene: &Scene,
    grid: GridSpec,
    spec: &SolverSpec,
    log: &mut Vec<Real>,
) -> anyhow::Result<SolveResult> {
    solver::solve_with_log(scene, grid, spec, Some(log))
        .map_err(|e| anyhow::anyhow!("solve failed: {e}"))
}

/// Rough peak RSS estimate (bytes) for a solve at the given resolution.
///
/// φ, ρ, and the mask dominate: ≈ 3·nx·ny single-precision words plus the
/// mask flags and fixed overhead. Deliberately conservative; operator
/// guidance only.
pub fn estimate_peak_memory(nx: usize, ny: usize) -> usize {
    use core::mem::size_of;
    let cells = nx.clamp(crate::grid::MIN_DIM, crate::grid::MAX_DIM)
        * ny.clamp(crate::grid::MIN_DIM, crate::grid::MAX_DIM);
    let fields = 3 * cells * size_of::<Real>(); // φ, ρ, mask fixed values
    let flags = cells; // packed bool per cell
    let overhead = 64 * 1024; // stack/scratch
    fields + flags + overhead
}

// ===============================================================================================
/* Project snapshot I/O (magic + version + JSON payload) */
// ===============================================================================================

pub mod io {
    //! Versioned project snapshot files.
    //!
    //! A snapshot persists the scene, grid, and solver settings together
    //! with the 8-hex-digit FNV-1a fingerprint of the solved φ so a reload
    //! can verify it reproduced the same field. φ itself travels separately
    //! as the raw binary dump.

    use std::fs;
    use std::io::{Read, Write};
    use std::path::Path;

    use serde::{Deserialize, Serialize};

    use crate::{GridSpec, Scene, SolverSpec};

    /// 8-byte magic used by the snapshot files.
    pub const FILE_MAGIC: &[u8; 8] = b"FSIMv1\0\0";
    /// Current snapshot format version.
    pub const FILE_VERSION: u16 = 1;

    /// Everything a reload needs to reproduce and verify a solve.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ProjectSnapshot {
        /// Scene at the time of the solve.
        pub scene: Scene,
        /// Grid resolution used.
        pub grid: GridSpec,
        /// Solver settings used.
        pub solver: SolverSpec,
        /// 8 lowercase hex digits, FNV-1a over φ (see [`crate::encode`]).
        pub phi_fingerprint: String,
    }

    /// Write a v1 snapshot file at `path`.
    pub fn write_project(path: &Path, snapshot: &ProjectSnapshot) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(snapshot)
            .map_err(|e| anyhow::anyhow!("serialize snapshot: {e}"))?;
        let mut f = fs::File::create(path)
            .map_err(|e| anyhow::anyhow!("create {}: {e}", path.display()))?;
        f.write_all(FILE_MAGIC)?;
        f.write_all(&FILE_VERSION.to_be_bytes())?;
        f.write_all(&payload)?;
        f.flush().ok();
        Ok(())
    }

    /// Read a v1 snapshot file from `path`.
    pub fn read_project(path: &Path) -> anyhow::Result<ProjectSnapshot> {
        let mut f = fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("open {}: {e}", path.display()))?;
        let mut magic = [0u8; 8];
        f.read_exact(&mut magic)?;
        if &magic != FILE_MAGIC {
            return Err(anyhow::anyhow!("bad snapshot file magic"));
        }
        let mut ver = [0u8; 2];
        f.read_exact(&mut ver)?;
        let file_ver = u16::from_be_bytes(ver);
        if file_ver != FILE_VERSION {
            return Err(anyhow::anyhow!("unsupported snapshot version: {file_ver}"));
        }
        let mut payload = Vec::new();
        f.read_to_end(&mut payload)?;
        let snapshot: ProjectSnapshot = serde_json::from_slice(&payload)
            .map_err(|e| anyhow::anyhow!("deserialize snapshot: {e}"))?;
        Ok(snapshot)
    }
}

// ============================================================================
// Tests
// ============================================================================
