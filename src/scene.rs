//! Scene Description & Validation
//!
//! A `Scene` bundles everything the solver consumes: the rectangular domain
//! with its uniform permittivity, the point charges to be regularized into a
//! density field, and the conductors that pin grid cells to a fixed
//! potential (internal Dirichlet regions).
//!
//! ## Validation discipline
//! - Domain bounds are checked by [`crate::grid::Grid`] when geometry is
//!   derived (inverted or non-finite extents fail loudly, before iteration).
//! - Conductors are checked here via [`Scene::validate_conductors_r`]:
//!   inverted rectangles, non-positive circle radii, and non-finite
//!   geometry/potentials are hard errors.
//! - Charges are *not* validated up front: a non-finite or out-of-domain
//!   charge is skipped at deposition time, matching the edge-of-domain
//!   contract.
//!
//! The JSON shape mirrors the transport contract: conductors are externally
//! tagged by `"shape"` (`rectangle` | `circle`) with a shared `potential`.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Rectangular solve domain with a uniform permittivity.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DomainBounds {
    /// Lower x bound (world units).
    pub x_min: f64,
    /// Upper x bound; must exceed `x_min`.
    pub x_max: f64,
    /// Lower y bound.
    pub y_min: f64,
    /// Upper y bound; must exceed `y_min`.
    pub y_max: f64,
    /// Uniform permittivity ε. Non-positive or non-finite values fall back
    /// to 1 at solve time (they are never an error).
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_epsilon() -> f64 {
    1.0
}

impl DomainBounds {
    /// The permittivity actually used by the solve: `epsilon` when finite
    /// and positive, otherwise 1.
    #[inline]
    pub fn effective_epsilon(&self) -> f64 {
        if self.epsilon.is_finite() && self.epsilon > 0.0 {
            self.epsilon
        } else {
            1.0
        }
    }
}

/// A point charge at world position `(x, y)` carrying charge `q`.
///
/// `q` may be negative. Charges with non-finite components, or whose nearest
/// grid node falls outside the grid, are skipped during deposition.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PointCharge {
    /// World x position.
    pub x: f64,
    /// World y position.
    pub y: f64,
    /// Charge magnitude (sign carries through to ρ).
    pub q: f64,
}

/// Errors produced by conductor validation.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("rectangle conductor has inverted bounds (x: {x_min}..{x_max}, y: {y_min}..{y_max})")]
    InvertedRectangle {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },
    #[error("circle conductor radius must be positive (got {0})")]
    NonPositiveRadius(f64),
    #[error("conductor geometry must be finite")]
    NonFiniteGeometry,
    #[error("conductor potential must be finite (got {0})")]
    NonFinitePotential(f64),
}

/// An internal Dirichlet region holding a fixed potential.
///
/// Tagged variant with a shared `potential` and a shape-specific payload;
/// masking dispatches over the two arms. A future shape (e.g. polygon) is a
/// new tag plus a new containment predicate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Conductor {
    /// Axis-aligned rectangle, containment inclusive on all four edges.
    Rectangle {
        /// Lower x edge.
        x_min: f64,
        /// Upper x edge; must exceed `x_min`.
        x_max: f64,
        /// Lower y edge.
        y_min: f64,
        /// Upper y edge; must exceed `y_min`.
        y_max: f64,
        /// Fixed potential held by every covered cell.
        potential: f64,
    },
    /// Disc centered at `(x, y)`, containment `(x−cx)² + (y−cy)² ≤ r²`.
    Circle {
        /// Center x.
        x: f64,
        /// Center y.
        y: f64,
        /// Radius; must be positive.
        radius: f64,
        /// Fixed potential held by every covered cell.
        potential: f64,
    },
}

impl Conductor {
    /// The fixed potential carried by this conductor.
    #[inline]
    pub fn potential(&self) -> f64 {
        match *self {
            Conductor::Rectangle { potential, .. } => potential,
            Conductor::Circle { potential, .. } => potential,
        }
    }

    /// Node-center containment test against world coordinates.
    ///
    /// Rectangle edges are inclusive; the disc boundary is inclusive.
    /// Sub-cell partial coverage is deliberately not modeled.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match *self {
            Conductor::Rectangle { x_min, x_max, y_min, y_max, .. } => {
                x >= x_min && x <= x_max && y >= y_min && y <= y_max
            }
            Conductor::Circle { x: cx, y: cy, radius, .. } => {
                let dx = x - cx;
                let dy = y - cy;
                dx * dx + dy * dy <= radius * radius
            }
        }
    }

    /// Check geometry and potential, returning a precise error.
    pub fn validate_r(&self) -> Result<(), SceneError> {
        let v = self.potential();
        if !v.is_finite() {
            return Err(SceneError::NonFinitePotential(v));
        }
        match *self {
            Conductor::Rectangle { x_min, x_max, y_min, y_max, .. } => {
                if ![x_min, x_max, y_min, y_max].iter().all(|b| b.is_finite()) {
                    return Err(SceneError::NonFiniteGeometry);
                }
                if x_max <= x_min || y_max <= y_min {
                    return Err(SceneError::InvertedRectangle { x_min, x_max, y_min, y_max });
                }
            }
            Conductor::Circle { x, y, radius, .. } => {
                if !x.is_finite() || !y.is_finite() || !radius.is_finite() {
                    return Err(SceneError::NonFiniteGeometry);
                }
                if radius <= 0.0 {
                    return Err(SceneError::NonPositiveRadius(radius));
                }
            }
        }
        Ok(())
    }
}

/// Full solve input: domain, charges, conductors.
///
/// Conductor order matters: on overlap, the **last-declared** conductor wins
/// when the mask is built.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Domain bounds and permittivity.
    pub domain: DomainBounds,
    /// Point charges, superposed additively into ρ.
    #[serde(default)]
    pub charges: Vec<PointCharge>,
    /// Dirichlet conductors, scanned in declaration order.
    #[serde(default)]
    pub conductors: Vec<Conductor>,
}

impl Default for DomainBounds {
    fn default() -> Self {
        Self { x_min: -1.0, x_max: 1.0, y_min: -1.0, y_max: 1.0, epsilon: 1.0 }
    }
}

impl Scene {
    /// Validate every conductor in scene order, failing on the first
    /// violation. Runs before any iteration; no partial results.
    pub fn validate_conductors_r(&self) -> Result<(), SceneError> {
        for c in &self.conductors {
            c.validate_r()?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
