// Orbit Engine - ellipse derivation and phase-advance integration
// Pure math: no ownership of bodies, no I/O, deterministic for given inputs

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Astronomical Unit in kilometers.
pub const ASTRONOMICAL_UNIT_KM: f64 = 149_597_871.0;

/// Full turn in degrees, for axial-rotation deltas.
pub const DEGREES_PER_TURN: f64 = 360.0;

// =============================================================================
// 3D VECTOR MATHEMATICS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

// =============================================================================
// ORBITAL ELEMENTS
// =============================================================================

/// Per-body physical inputs, fixed at configuration time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// Semi-major axis in astronomical units.
    pub semi_major_axis_au: f64,
    /// Eccentricity (0 = circle, approaching 1 = highly elongated).
    pub eccentricity: f64,
    /// Days for one full orbit around the focus.
    pub orbital_period_days: f64,
}

impl OrbitalElements {
    pub fn new(semi_major_axis_au: f64, eccentricity: f64, orbital_period_days: f64) -> Self {
        Self {
            semi_major_axis_au,
            eccentricity,
            orbital_period_days,
        }
    }

    /// The field/value pair that is out of domain, if any.
    ///
    /// Eccentricity must lie in `[0, 1)`; the semi-major axis and period
    /// must be strictly positive. Everything must be finite.
    pub fn domain_violation(&self) -> Option<(&'static str, f64)> {
        if !self.semi_major_axis_au.is_finite() || self.semi_major_axis_au <= 0.0 {
            return Some(("semi_major_axis_au", self.semi_major_axis_au));
        }
        if !self.eccentricity.is_finite() || self.eccentricity < 0.0 || self.eccentricity >= 1.0 {
            return Some(("eccentricity", self.eccentricity));
        }
        if !self.orbital_period_days.is_finite() || self.orbital_period_days <= 0.0 {
            return Some(("orbital_period_days", self.orbital_period_days));
        }
        None
    }
}

// =============================================================================
// ORBIT GEOMETRY
// =============================================================================

/// Derived ellipse shape in scene units.
///
/// A pure function of the orbital elements and the current distance scale;
/// re-derived from scratch whenever that scale changes, so two derivations
/// with equal inputs are bit-identical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitGeometry {
    /// Half the longest diameter of the ellipse (scene units).
    pub semi_major_axis: f64,
    /// Half the shortest diameter of the ellipse (scene units).
    pub semi_minor_axis: f64,
    /// Displacement of the ellipse center from the focus, along +x.
    pub focus_offset: Vec3,
    /// Average-radius approximation used by the speed formula.
    pub mean_radius: f64,
}

impl OrbitGeometry {
    pub fn derive(elements: &OrbitalElements, distance_scale: f64) -> Self {
        let semi_major_axis =
            elements.semi_major_axis_au * ASTRONOMICAL_UNIT_KM * distance_scale;
        // Intentionally sqrt(1 - e), not the textbook ellipse relation
        // sqrt(1 - e^2). The flatter ellipse is a long-standing visual
        // tuning choice; changing it would move every body on screen.
        let semi_minor_axis = semi_major_axis * (1.0 - elements.eccentricity).sqrt();
        let focus_offset = Vec3::new(semi_major_axis * elements.eccentricity, 0.0, 0.0);
        let mean_radius = (2.0 * semi_major_axis + semi_minor_axis) / 3.0;

        Self {
            semi_major_axis,
            semi_minor_axis,
            focus_offset,
            mean_radius,
        }
    }
}

// =============================================================================
// PHASE INTEGRATION
// =============================================================================

/// Per-body integrator state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhaseState {
    /// Running angular parameter placing the body on its ellipse, radians.
    /// Monotonically non-decreasing and never wrapped: f64 keeps placement
    /// accuracy well past 1e9 radians, longer than any session runs.
    pub phase: f64,
    /// Precomputed factor converting instantaneous speed into a per-tick
    /// phase increment. Strictly positive.
    pub speed_constant: f64,
}

impl PhaseState {
    pub fn new(phase: f64, speed_constant: f64) -> Self {
        Self {
            phase,
            speed_constant,
        }
    }

    /// Advance the phase by one simulation step and return the new scene
    /// position.
    ///
    /// `delta_frames` is the number of frames this step covers (1.0 for a
    /// normal frame). Returns `None` when the current physical radius is
    /// zero or the computed speed is non-finite; valid configuration makes
    /// that unreachable and the caller must treat it as fatal.
    pub fn advance(
        &mut self,
        geometry: &OrbitGeometry,
        position: &Vec3,
        distance_scale: f64,
        delta_frames: f64,
    ) -> Option<Vec3> {
        let r = position.magnitude() / distance_scale;
        if !r.is_finite() || r <= 0.0 {
            return None;
        }
        let a = geometry.semi_major_axis / distance_scale;
        // Energy-style speed approximation: mean_radius stands in for the
        // gravitational parameter of the true vis-viva relation. Not a
        // physical velocity, but the rate the whole animation is tuned to.
        let v = (geometry.mean_radius * (2.0 / r - 1.0 / a)).sqrt();
        if !v.is_finite() {
            return None;
        }

        self.phase += v * self.speed_constant * delta_frames;
        Some(position_on_orbit(geometry, self.phase))
    }
}

/// Scene position of a body at the given phase angle.
///
/// The ellipse is parameterized around its geometric center in the xz
/// plane, then shifted so the orbited focus sits at the origin.
pub fn position_on_orbit(geometry: &OrbitGeometry, phase: f64) -> Vec3 {
    Vec3::new(
        geometry.semi_major_axis * phase.cos(),
        0.0,
        geometry.semi_minor_axis * phase.sin(),
    )
    .sub(&geometry.focus_offset)
}

/// Speed constant for the given geometry, recomputed on every geometry
/// derivation so it can never go stale against the ellipse it serves.
pub fn orbital_speed_constant(
    geometry: &OrbitGeometry,
    orbital_period_days: f64,
    distance_scale: f64,
    frames_per_day: f64,
) -> f64 {
    let a = geometry.semi_major_axis / distance_scale;
    let mean_velocity = (geometry.mean_radius / a).sqrt();
    (TAU / (orbital_period_days * frames_per_day)) / mean_velocity
}

// =============================================================================
// TESTS
// =============================================================================
