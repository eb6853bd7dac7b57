//! fieldsim_api: a minimal REST façade for the electrostatic Poisson solver.
//!
//! Public endpoints (JSON unless noted):
//! - GET  /v1/health
//! - GET  /v1/version
//! - POST /v1/solve              SolveReq -> SolveRes (optionally returns φ inline as base64)
//! - GET  /v1/result/:id         raw little-endian f32 φ dump (application/octet-stream)
//!
//! Notes:
//! - Each solve stores its raw φ dump in a bounded in-process result store;
//!   beyond the retention cap the oldest dump is evicted and its id turns 404.
//! - The solver is synchronous; requests run on the blocking pool so the
//!   async runtime is never starved by a long sweep.

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use fieldsim::{
    encode::{phi_fingerprint_hex, phi_to_le_bytes},
    grid::{grid_digest, Grid},
    store::ResultStore,
    GridSpec, Real, Scene, SolverSpec,
};

// ------------------------------ State ------------------------------

#[derive(Clone)]
struct AppState {
    store: Arc<ResultStore>,
}

// ------------------------------ Types ------------------------------

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct Version {
    api: &'static str,
    solver: &'static str,
    min_dim: usize,
    max_dim: usize,
    max_iters_cap: u32,
}

#[derive(Deserialize)]
struct SolveReq {
    scene: Scene,
    grid: GridSpec,
    #[serde(default)]
    solver: SolverSpec,
    /// Return φ inline as base64 in addition to storing the raw dump.
    #[serde(default)]
    return_phi: bool,
    /// Return the sampled residual history.
    #[serde(default)]
    residual_history: bool,
}

#[derive(Serialize)]
struct SolveRes {
    result_id: String,
    nx: usize,
    ny: usize,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    phi_min: Real,
    phi_max: Real,
    iterations: u32,
    residual: Real,
    /// 8-hex-digit FNV-1a over φ (project-file reproducibility check).
    fingerprint: String,
    /// Digest of the geometric inputs, for log correlation.
    input_digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    phi_b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    residuals: Option<Vec<Real>>,
}

// ------------------------------ Handlers ------------------------------

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn version() -> Json<Version> {
    Json(Version {
        api: env!("CARGO_PKG_VERSION"),
        solver: "sor-gauss-seidel",
        min_dim: fieldsim::grid::MIN_DIM,
        max_dim: fieldsim::grid::MAX_DIM,
        max_iters_cap: fieldsim::solver::MAX_ITERS_CAP,
    })
}

async fn solve_scene(
    State(st): State<AppState>,
    Json(req): Json<SolveReq>,
) -> Result<Json<SolveRes>, (StatusCode, String)> {
    let want_history = req.residual_history;
    let want_phi = req.return_phi;

    // The sweep is CPU-bound and uninterruptible; keep it off the runtime.
    let solved = tokio::task::spawn_blocking(move || {
        let grid = Grid::from_spec_r(&req.scene.domain, req.grid)
            .map_err(fieldsim::SolveError::from)?;
        let digest = hex::encode(grid_digest(&req.scene.domain, &grid));
        let mut log = Vec::new();
        let res = fieldsim::solve_with_log(
            &req.scene,
            req.grid,
            &req.solver,
            want_history.then_some(&mut log),
        )?;
        Ok::<_, fieldsim::SolveError>((res, log, digest))
    })
    .await
    .map_err(|e| {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("solver task failed: {e}"))
    })?
    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let (res, log, input_digest) = solved;
    let bytes = phi_to_le_bytes(&res.phi);
    let fingerprint = phi_fingerprint_hex(&res.phi);
    let phi_b64 = want_phi.then(|| base64::engine::general_purpose::STANDARD.encode(&bytes));
    let result_id = st.store.put(bytes);

    info!(
        result_id = %result_id,
        iterations = res.iterations,
        residual = res.residual,
        fingerprint = %fingerprint,
        "solve complete"
    );

    Ok(Json(SolveRes {
        result_id,
        nx: res.nx,
        ny: res.ny,
        x_min: res.x_min,
        x_max: res.x_max,
        y_min: res.y_min,
        y_max: res.y_max,
        phi_min: res.phi_min,
        phi_max: res.phi_max,
        iterations: res.iterations,
        residual: res.residual,
        fingerprint,
        input_digest,
        phi_b64,
        residuals: want_history.then_some(log),
    }))
}

async fn fetch_result(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match st.store.get(&id) {
        Some(blob) => Ok((
            [(header::CONTENT_TYPE, "application/octet-stream")],
            blob.to_vec(),
        )),
        None => Err((
            StatusCode::NOT_FOUND,
            "no such result (evicted or never stored)".into(),
        )),
    }
}

// ------------------------------ Main ------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "fieldsim_api=info,tower_http=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Starting fieldsim API server");

    let addr: SocketAddr = std::env::var("FIELDSIM_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));

    let result_cap = std::env::var("FIELDSIM_RESULT_CAP")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(32);

    let max_body = std::env::var("FIELDSIM_MAX_BODY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2 * 1024 * 1024);

    let allowed_origins = std::env::var("FIELDSIM_CORS_ORIGINS").unwrap_or_else(|_| "*".into());
    let cors = if allowed_origins == "*" {
        warn!("CORS set to permissive mode (*); restrict FIELDSIM_CORS_ORIGINS in production");
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        info!("CORS configured for origins: {:?}", origins);
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    let state = AppState { store: Arc::new(ResultStore::new(result_cap)) };

    let app = Router::new()
        .route("/v1/health", get(health))
        .route("/v1/version", get(version))
        .route("/v1/solve", post(solve_scene))
        .route("/v1/result/:id", get(fetch_result))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    info!(%addr, result_cap, "fieldsim API listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
