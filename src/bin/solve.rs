//! Minimal CLI solver
//!
//! Reads a scene description (JSON), runs the SOR solve, and writes the raw
//! φ dump consumed by the renderer:
//!   contiguous little-endian f32, nx·ny·4 bytes, no header
//!
//! Optionally writes a versioned project snapshot (magic + u16 version +
//! JSON payload) carrying the φ fingerprint for reproducibility checks.
//! Without `--scene`, a built-in dipole demo scene is solved so the binary
//! is usable out of the box.

#![forbid(unsafe_code)]

use std::{env, fs, path::Path};

use fieldsim::{
    api::{self, io::ProjectSnapshot, SolverBuilder},
    encode::{phi_fingerprint_hex, phi_to_le_bytes},
    GridSpec, PointCharge, Scene,
};

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

/// Built-in demo: a unit-domain dipole.
fn demo_scene() -> Scene {
    Scene {
        charges: vec![
            PointCharge { x: -0.25, y: 0.0, q: 1.0 },
            PointCharge { x: 0.25, y: 0.0, q: -1.0 },
        ],
        ..Scene::default()
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "fieldsim=info".into()))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();

    let scene: Scene = if let Some(p) = parse_flag(&args, "--scene") {
        let path = Path::new(&p);
        eprintln!("loading scene from {}", path.display());
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read scene {}: {e}", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("parse scene {}: {e}", path.display()))?
    } else {
        eprintln!("no --scene given; solving the built-in dipole demo");
        demo_scene()
    };

    let nx: usize = parse_flag(&args, "--nx").and_then(|s| s.parse().ok()).unwrap_or(201);
    let ny: usize = parse_flag(&args, "--ny").and_then(|s| s.parse().ok()).unwrap_or(201);
    let grid = GridSpec { nx, ny };

    let mut builder = SolverBuilder::new();
    if let Some(n) = parse_flag(&args, "--max-iters").and_then(|s| s.parse().ok()) {
        builder = builder.max_iters(n);
    }
    if let Some(t) = parse_flag(&args, "--tol").and_then(|s| s.parse().ok()) {
        builder = builder.tolerance(t);
    }
    if let Some(w) = parse_flag(&args, "--omega").and_then(|s| s.parse().ok()) {
        builder = builder.omega(w);
    }
    if let Some(s) = parse_flag(&args, "--sigma").and_then(|s| s.parse().ok()) {
        builder = builder.charge_sigma_cells(s);
    }
    let spec = builder.build();

    eprintln!(
        "solving {}x{} ({} charges, {} conductors), max_iters={}, tol={}, omega={}",
        nx,
        ny,
        scene.charges.len(),
        scene.conductors.len(),
        spec.max_iters,
        spec.tolerance,
        spec.omega
    );

    let (res, residuals) = if has_flag(&args, "--residual-log") {
        let mut log = Vec::new();
        let res = api::solve_scene_with_log(&scene, grid, &spec, &mut log)?;
        (res, Some(log))
    } else {
        (api::solve_scene(&scene, grid, &spec)?, None)
    };

    let fingerprint = phi_fingerprint_hex(&res.phi);
    eprintln!(
        "✓ solved in {} sweep(s), residual {:.3e}, φ ∈ [{:.4}, {:.4}], fingerprint {}",
        res.iterations, res.residual, res.phi_min, res.phi_max, fingerprint
    );
    if let Some(log) = &residuals {
        eprintln!("residual history ({} samples):", log.len());
        for (n, r) in log.iter().enumerate() {
            eprintln!("  sample {:>4}: {:.6e}", n, r);
        }
    }

    let out = parse_flag(&args, "--out").unwrap_or_else(|| "phi.bin".into());
    let bytes = phi_to_le_bytes(&res.phi);
    fs::write(&out, &bytes).map_err(|e| anyhow::anyhow!("write {out}: {e}"))?;
    eprintln!("✓ wrote {} ({} bytes, {}x{} little-endian f32)", out, bytes.len(), res.nx, res.ny);

    if let Some(p) = parse_flag(&args, "--project") {
        let snapshot = ProjectSnapshot { scene, grid, solver: spec, phi_fingerprint: fingerprint };
        api::io::write_project(Path::new(&p), &snapshot)?;
        eprintln!("✓ wrote project snapshot {p}");
    }

    Ok(())
}
