// Global Scale Settings - shared animation parameters
// One writer (the host UI layer), consumed by every body via explicit diffs

use serde::{Deserialize, Serialize};

/// Smallest value a scale setter will accept. Inputs below the floor are
/// clamped so the `> 0` invariant on every field always holds.
pub const MIN_SCALE: f64 = 1e-12;

// =============================================================================
// CHANGE RECORDS
// =============================================================================

/// Which global parameter changed, with its old and new value.
///
/// Every setter returns one of these; the simulation consumes it explicitly
/// instead of listening on a property-changed event. One record per field,
/// so a batch of setter calls is just a sequence of records applied in
/// order before the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleChange {
    /// `distance_scale` changed: orbit geometry must be re-derived.
    Distance { old: f64, new: f64 },
    /// `size_scale` changed: visual size factors must be rescaled.
    Size { old: f64, new: f64 },
    /// `frames_per_day` changed: per-tick rates must be rescaled.
    FramesPerDay { old: f64, new: f64 },
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Process-wide animation scale parameters, valid for one session.
///
/// All fields are strictly positive. Mutation goes through the setters,
/// which clamp and hand back the [`ScaleChange`] to apply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScaleSettings {
    /// Scene units per physical kilometer of orbital distance.
    distance_scale: f64,
    /// Scene units per physical kilometer of body diameter.
    size_scale: f64,
    /// Simulation ticks that make up one simulated day.
    frames_per_day: f64,
}

impl Default for ScaleSettings {
    fn default() -> Self {
        Self {
            distance_scale: 0.001,
            size_scale: 0.00001,
            frames_per_day: 30.0,
        }
    }
}

impl ScaleSettings {
    pub fn new(distance_scale: f64, size_scale: f64, frames_per_day: f64) -> Self {
        Self {
            distance_scale: clamp_scale(distance_scale),
            size_scale: clamp_scale(size_scale),
            frames_per_day: clamp_scale(frames_per_day),
        }
    }

    pub fn distance_scale(&self) -> f64 {
        self.distance_scale
    }

    pub fn size_scale(&self) -> f64 {
        self.size_scale
    }

    pub fn frames_per_day(&self) -> f64 {
        self.frames_per_day
    }

    pub fn set_distance_scale(&mut self, value: f64) -> ScaleChange {
        let old = self.distance_scale;
        self.distance_scale = clamp_scale(value);
        ScaleChange::Distance {
            old,
            new: self.distance_scale,
        }
    }

    pub fn set_size_scale(&mut self, value: f64) -> ScaleChange {
        let old = self.size_scale;
        self.size_scale = clamp_scale(value);
        ScaleChange::Size {
            old,
            new: self.size_scale,
        }
    }

    pub fn set_frames_per_day(&mut self, value: f64) -> ScaleChange {
        let old = self.frames_per_day;
        self.frames_per_day = clamp_scale(value);
        ScaleChange::FramesPerDay {
            old,
            new: self.frames_per_day,
        }
    }

    /// Map a UI speed slider to a tick rate: higher speed, fewer frames per
    /// simulated day. A speed of 500 runs one frame per day.
    pub fn set_speed(&mut self, speed: f64) -> ScaleChange {
        self.set_frames_per_day(500.0 / clamp_scale(speed))
    }
}

fn clamp_scale(value: f64) -> f64 {
    if value.is_finite() {
        value.max(MIN_SCALE)
    } else {
        MIN_SCALE
    }
}

// =============================================================================
// TESTS
// =============================================================================
