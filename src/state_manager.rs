// State Manager - body ownership, ticking, and rescale reactions
// Single writer: every mutation goes through &mut Simulation, so a rescale
// can never interleave with a tick half-way through

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::catalog::BodyConfig;
use crate::error::SimulationError;
use crate::orbit_engine::{
    orbital_speed_constant, position_on_orbit, OrbitGeometry, OrbitalElements, PhaseState, Vec3,
    DEGREES_PER_TURN,
};
use crate::scale_settings::{ScaleChange, ScaleSettings};

// =============================================================================
// BODIES
// =============================================================================

/// Opaque reference to a body owned by a [`Simulation`].
///
/// Handles stay valid until the body is removed; a removed body's handle is
/// rejected with [`SimulationError::UnknownBody`], never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle(usize);

/// One animated body: immutable elements plus the derived and mutable state
/// the engine keeps consistent across ticks and rescales.
#[derive(Debug, Clone)]
pub struct Body {
    pub name: String,
    pub elements: OrbitalElements,
    /// Configured diameter in kilometers; the rescale base for visual size.
    pub visual_diameter_km: f64,
    /// Day length in days. Negative spins retrograde.
    pub rotation_period_days: f64,
    pub geometry: OrbitGeometry,
    pub phase: PhaseState,
    /// Current scene-space position.
    pub position: Vec3,
    /// Current visual size factor for the host's mesh scaling.
    pub visual_size: f64,
    /// Axial spin per tick, degrees about +y.
    pub rotation_delta: Vec3,
}

/// What the host applies after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// New scene-space position.
    pub position: Vec3,
    /// Axial rotation to apply this step, degrees.
    pub rotation_delta: Vec3,
}

// =============================================================================
// SNAPSHOT TYPES FOR THE HOST
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub name: String,
    pub position: [f64; 3],
    pub visual_size: f64,
    pub rotation_delta: [f64; 3],
    pub phase: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub bodies: Vec<BodySnapshot>,
    pub distance_scale: f64,
    pub size_scale: f64,
    pub frames_per_day: f64,
    pub body_count: usize,
}

// =============================================================================
// SIMULATION
// =============================================================================

/// Owner of all bodies and of the global scale settings.
///
/// Frame-driven and cooperative: the host calls `tick`/`tick_all` once per
/// rendered frame and the setters between frames. Each setter applies the
/// full rescale reaction to every body before it returns, so ticks only
/// ever observe fully-consistent derived state.
pub struct Simulation {
    settings: ScaleSettings,
    bodies: Vec<Option<Body>>,
    rng: StdRng,
}

impl Simulation {
    /// A simulation whose initial phases are drawn from OS entropy. Runs
    /// with identical configuration will follow different trajectories.
    pub fn new(settings: ScaleSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// A simulation with a deterministic phase source, for hosts and tests
    /// that need reproducible trajectories.
    pub fn with_seed(settings: ScaleSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: ScaleSettings, rng: StdRng) -> Self {
        Self {
            settings,
            bodies: Vec::new(),
            rng,
        }
    }

    pub fn settings(&self) -> &ScaleSettings {
        &self.settings
    }

    /// Create a body from validated configuration.
    ///
    /// Derives the orbit geometry at the current distance scale, draws the
    /// initial phase uniformly from `[0, pi)` (drawn once; rescales never
    /// re-draw it) and places the body on its ellipse.
    pub fn create_body(&mut self, config: BodyConfig) -> Result<BodyHandle, SimulationError> {
        config.validate()?;

        let distance_scale = self.settings.distance_scale();
        let frames_per_day = self.settings.frames_per_day();

        let geometry = OrbitGeometry::derive(&config.elements, distance_scale);
        let speed_constant = orbital_speed_constant(
            &geometry,
            config.elements.orbital_period_days,
            distance_scale,
            frames_per_day,
        );
        let phase = PhaseState::new(self.rng.gen_range(0.0..PI), speed_constant);
        let position = position_on_orbit(&geometry, phase.phase);

        let body = Body {
            position,
            visual_size: config.visual_diameter_km * self.settings.size_scale(),
            rotation_delta: Vec3::new(
                0.0,
                DEGREES_PER_TURN / (config.rotation_period_days * frames_per_day),
                0.0,
            ),
            name: config.name,
            elements: config.elements,
            visual_diameter_km: config.visual_diameter_km,
            rotation_period_days: config.rotation_period_days,
            geometry,
            phase,
        };

        log::info!(
            "created body '{}' (a = {} AU, e = {}, period = {} d)",
            body.name,
            body.elements.semi_major_axis_au,
            body.elements.eccentricity,
            body.elements.orbital_period_days
        );

        self.bodies.push(Some(body));
        Ok(BodyHandle(self.bodies.len() - 1))
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.0).and_then(|slot| slot.as_ref())
    }

    /// Remove a body from the simulation, returning its final state.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        self.bodies.get_mut(handle.0).and_then(|slot| slot.take())
    }

    /// Live bodies currently animated.
    pub fn body_count(&self) -> usize {
        self.bodies.iter().filter(|slot| slot.is_some()).count()
    }

    // =========================================================================
    // TICKING
    // =========================================================================

    /// Advance one body by one simulation step.
    ///
    /// `delta_frames` is the frame count this step covers (1.0 for a normal
    /// frame); it scales both the phase advance and the returned rotation
    /// delta. Negative values are treated as zero so phase stays monotonic.
    pub fn tick(
        &mut self,
        handle: BodyHandle,
        delta_frames: f64,
    ) -> Result<TickOutput, SimulationError> {
        let distance_scale = self.settings.distance_scale();
        let delta_frames = delta_frames.max(0.0);

        let body = self
            .bodies
            .get_mut(handle.0)
            .and_then(|slot| slot.as_mut())
            .ok_or(SimulationError::UnknownBody(handle))?;

        let new_position = body
            .phase
            .advance(&body.geometry, &body.position, distance_scale, delta_frames)
            .ok_or_else(|| SimulationError::DegenerateState {
                body: body.name.clone(),
                radius: body.position.magnitude() / distance_scale,
            })?;

        body.position = new_position;
        Ok(TickOutput {
            position: new_position,
            rotation_delta: body.rotation_delta.scale(delta_frames),
        })
    }

    /// Advance every live body by one simulation step.
    pub fn tick_all(
        &mut self,
        delta_frames: f64,
    ) -> Result<Vec<(BodyHandle, TickOutput)>, SimulationError> {
        let handles: Vec<BodyHandle> = self
            .bodies
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| BodyHandle(i))
            .collect();

        let mut outputs = Vec::with_capacity(handles.len());
        for handle in handles {
            outputs.push((handle, self.tick(handle, delta_frames)?));
        }
        Ok(outputs)
    }

    // =========================================================================
    // RESCALE PROTOCOL
    // =========================================================================

    pub fn set_distance_scale(&mut self, value: f64) -> ScaleChange {
        let change = self.settings.set_distance_scale(value);
        self.react(change);
        change
    }

    pub fn set_size_scale(&mut self, value: f64) -> ScaleChange {
        let change = self.settings.set_size_scale(value);
        self.react(change);
        change
    }

    pub fn set_frames_per_day(&mut self, value: f64) -> ScaleChange {
        let change = self.settings.set_frames_per_day(value);
        self.react(change);
        change
    }

    /// Speed-slider variant of [`Simulation::set_frames_per_day`].
    pub fn set_speed(&mut self, speed: f64) -> ScaleChange {
        let change = self.settings.set_speed(speed);
        self.react(change);
        change
    }

    /// Apply one settings change to every body.
    ///
    /// Distance re-derives geometry and the speed constant from scratch and
    /// re-places the body at its preserved phase; frames-per-day rescales
    /// the per-tick rates so the wall-clock angular rate is unchanged; size
    /// touches only the visual factor. Phase is never modified here.
    fn react(&mut self, change: ScaleChange) {
        log::debug!("rescale: {:?}", change);

        for body in self.bodies.iter_mut().flatten() {
            match change {
                ScaleChange::Distance { new, .. } => {
                    body.geometry = OrbitGeometry::derive(&body.elements, new);
                    body.phase.speed_constant = orbital_speed_constant(
                        &body.geometry,
                        body.elements.orbital_period_days,
                        new,
                        self.settings.frames_per_day(),
                    );
                    body.position = position_on_orbit(&body.geometry, body.phase.phase);
                }
                ScaleChange::FramesPerDay { old, new } => {
                    let ratio = old / new;
                    body.phase.speed_constant *= ratio;
                    body.rotation_delta = body.rotation_delta.scale(ratio);
                }
                ScaleChange::Size { old, new } => {
                    body.visual_size *= new / old;
                }
            }
        }
    }

    // =========================================================================
    // HOST SNAPSHOT
    // =========================================================================

    pub fn snapshot(&self) -> SimulationSnapshot {
        let bodies: Vec<BodySnapshot> = self
            .bodies
            .iter()
            .flatten()
            .map(|b| BodySnapshot {
                name: b.name.clone(),
                position: b.position.to_array(),
                visual_size: b.visual_size,
                rotation_delta: b.rotation_delta.to_array(),
                phase: b.phase.phase,
            })
            .collect();

        SimulationSnapshot {
            body_count: bodies.len(),
            bodies,
            distance_scale: self.settings.distance_scale(),
            size_scale: self.settings.size_scale(),
            frames_per_day: self.settings.frames_per_day(),
        }
    }
}

// =============================================================================
// SHARED HANDLE FOR POLLING HOSTS
// =============================================================================

/// Clonable, thread-safe handle around a [`Simulation`].
///
/// For hosts whose render loop polls snapshots from another thread: the
/// write lock serializes setters and ticks, so a reader never observes a
/// partially-applied rescale.
#[derive(Clone)]
pub struct SharedSimulation {
    simulation: Arc<RwLock<Simulation>>,
}

impl SharedSimulation {
    pub fn new(settings: ScaleSettings) -> Self {
        Self {
            simulation: Arc::new(RwLock::new(Simulation::new(settings))),
        }
    }

    pub fn with_seed(settings: ScaleSettings, seed: u64) -> Self {
        Self {
            simulation: Arc::new(RwLock::new(Simulation::with_seed(settings, seed))),
        }
    }

    pub fn create_body(&self, config: BodyConfig) -> Result<BodyHandle, SimulationError> {
        self.simulation.write().create_body(config)
    }

    pub fn remove_body(&self, handle: BodyHandle) -> Option<Body> {
        self.simulation.write().remove_body(handle)
    }

    pub fn tick(
        &self,
        handle: BodyHandle,
        delta_frames: f64,
    ) -> Result<TickOutput, SimulationError> {
        self.simulation.write().tick(handle, delta_frames)
    }

    pub fn tick_all(
        &self,
        delta_frames: f64,
    ) -> Result<Vec<(BodyHandle, TickOutput)>, SimulationError> {
        self.simulation.write().tick_all(delta_frames)
    }

    pub fn set_distance_scale(&self, value: f64) -> ScaleChange {
        self.simulation.write().set_distance_scale(value)
    }

    pub fn set_size_scale(&self, value: f64) -> ScaleChange {
        self.simulation.write().set_size_scale(value)
    }

    pub fn set_frames_per_day(&self, value: f64) -> ScaleChange {
        self.simulation.write().set_frames_per_day(value)
    }

    pub fn set_speed(&self, speed: f64) -> ScaleChange {
        self.simulation.write().set_speed(speed)
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        self.simulation.read().snapshot()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn earth_config() -> BodyConfig {
        BodyConfig {
            name: "Earth".to_string(),
            elements: OrbitalElements::new(1.0, 0.0, 365.0),
            visual_diameter_km: 12_742.0,
            rotation_period_days: 1.0,
        }
    }

    fn eccentric_config() -> BodyConfig {
        BodyConfig {
            name: "Halley".to_string(),
            elements: OrbitalElements::new(17.8, 0.967, 27_284.0),
            visual_diameter_km: 11.0,
            rotation_period_days: 2.2,
        }
    }

    fn sim() -> Simulation {
        Simulation::with_seed(ScaleSettings::default(), 42)
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        let mut sim = sim();

        let mut bad = earth_config();
        bad.elements.eccentricity = 1.0;
        assert!(matches!(
            sim.create_body(bad),
            Err(SimulationError::InvalidConfiguration {
                field: "eccentricity",
                ..
            })
        ));

        let mut bad = earth_config();
        bad.elements.semi_major_axis_au = 0.0;
        assert!(sim.create_body(bad).is_err());

        let mut bad = earth_config();
        bad.elements.orbital_period_days = -3.0;
        assert!(sim.create_body(bad).is_err());

        let mut bad = earth_config();
        bad.visual_diameter_km = 0.0;
        assert!(sim.create_body(bad).is_err());

        let mut bad = earth_config();
        bad.rotation_period_days = 0.0;
        assert!(sim.create_body(bad).is_err());

        assert_eq!(sim.body_count(), 0);
    }

    #[test]
    fn test_initial_phase_in_half_turn() {
        for seed in 0..32 {
            let mut sim = Simulation::with_seed(ScaleSettings::default(), seed);
            let handle = sim.create_body(earth_config()).unwrap();
            let phase = sim.body(handle).unwrap().phase.phase;
            assert!((0.0..PI).contains(&phase), "phase {} out of range", phase);
        }
    }

    #[test]
    fn test_initial_position_on_circle() {
        let mut sim = sim();
        let handle = sim.create_body(earth_config()).unwrap();
        let body = sim.body(handle).unwrap();
        // e = 0 at distance scale 0.001: circle of radius 149597.871
        let radius = body.position.magnitude();
        assert!((radius - 149_597.871).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let build = || {
            let mut sim = Simulation::with_seed(ScaleSettings::default(), 7);
            let a = sim.create_body(earth_config()).unwrap();
            let b = sim.create_body(eccentric_config()).unwrap();
            for _ in 0..50 {
                sim.tick(a, 1.0).unwrap();
                sim.tick(b, 1.0).unwrap();
            }
            (sim.body(a).unwrap().clone(), sim.body(b).unwrap().clone())
        };

        let (a1, b1) = build();
        let (a2, b2) = build();
        assert_eq!(a1.phase.phase, a2.phase.phase);
        assert_eq!(a1.position, a2.position);
        assert_eq!(b1.phase.phase, b2.phase.phase);
        assert_eq!(b1.position, b2.position);
    }

    #[test]
    fn test_phase_monotonic_through_api() {
        let mut sim = sim();
        let handle = sim.create_body(eccentric_config()).unwrap();
        let mut last = sim.body(handle).unwrap().phase.phase;
        for _ in 0..200 {
            sim.tick(handle, 1.0).unwrap();
            let phase = sim.body(handle).unwrap().phase.phase;
            assert!(phase >= last);
            last = phase;
        }
    }

    #[test]
    fn test_distance_scale_round_trip_is_exact() {
        let mut sim = sim();
        let handle = sim.create_body(eccentric_config()).unwrap();

        let before = sim.body(handle).unwrap().clone();
        sim.set_distance_scale(0.0075);
        sim.set_distance_scale(0.001);
        let after = sim.body(handle).unwrap();

        // Pure re-derivation: no accumulated drift, bit-identical values.
        assert_eq!(after.geometry, before.geometry);
        assert_eq!(after.position, before.position);
        assert_eq!(after.phase.phase, before.phase.phase);
        assert_eq!(after.phase.speed_constant, before.phase.speed_constant);
    }

    #[test]
    fn test_distance_rescale_preserves_phase_and_resizes_orbit() {
        let mut sim = sim();
        let handle = sim.create_body(earth_config()).unwrap();

        let phase_before = sim.body(handle).unwrap().phase.phase;
        let radius_before = sim.body(handle).unwrap().position.magnitude();

        sim.set_distance_scale(0.002);
        let body = sim.body(handle).unwrap();
        assert_eq!(body.phase.phase, phase_before);
        // Circle radius scales linearly with the distance scale.
        assert!((body.position.magnitude() - 2.0 * radius_before).abs() < 1e-6);
    }

    #[test]
    fn test_rate_invariance_under_frames_per_day_change() {
        let phase_after = |ticks: usize, frames_per_day: f64, delta: f64| {
            let mut sim = Simulation::with_seed(ScaleSettings::default(), 11);
            let handle = sim.create_body(earth_config()).unwrap();
            sim.set_frames_per_day(frames_per_day);
            for _ in 0..ticks {
                sim.tick(handle, delta).unwrap();
            }
            sim.body(handle).unwrap().phase.phase
        };

        // k ticks at k * 30 fpd advance the same as 1 tick at 30 fpd.
        let base = phase_after(1, 30.0, 1.0);
        let tripled = phase_after(3, 90.0, 1.0);
        assert!((base - tripled).abs() < 1e-9);

        // delta_frames batches frames the same way.
        let batched = phase_after(1, 30.0, 2.0);
        let stepped = phase_after(2, 30.0, 1.0);
        assert!((batched - stepped).abs() < 1e-9);
    }

    #[test]
    fn test_frames_per_day_rescales_rotation_delta() {
        let mut sim = sim();
        let handle = sim.create_body(earth_config()).unwrap();

        // One rotation per day at 30 fpd: 12 degrees per tick.
        let delta = sim.body(handle).unwrap().rotation_delta;
        assert!((delta.y - 12.0).abs() < 1e-9);
        assert_eq!(delta.x, 0.0);

        sim.set_frames_per_day(60.0);
        let delta = sim.body(handle).unwrap().rotation_delta;
        assert!((delta.y - 6.0).abs() < 1e-9);

        sim.set_frames_per_day(30.0);
        let body = sim.body(handle).unwrap();
        assert!((body.rotation_delta.y - 12.0).abs() < 1e-9);
        assert!(body.phase.speed_constant > 0.0);
    }

    #[test]
    fn test_size_rescale_touches_only_visual_size() {
        let mut sim = sim();
        let handle = sim.create_body(earth_config()).unwrap();

        let before = sim.body(handle).unwrap().clone();
        sim.set_size_scale(0.00002);
        let after = sim.body(handle).unwrap();

        assert!((after.visual_size - 2.0 * before.visual_size).abs() < 1e-15);
        assert_eq!(after.geometry, before.geometry);
        assert_eq!(after.phase.phase, before.phase.phase);
        assert_eq!(after.position, before.position);
    }

    #[test]
    fn test_rescale_batch_applies_before_next_tick() {
        let mut sim = sim();
        let handle = sim.create_body(earth_config()).unwrap();

        // Several fields change between two ticks; the next tick must see
        // geometry, speed constant and visual size all updated together.
        sim.tick(handle, 1.0).unwrap();
        sim.set_distance_scale(0.004);
        sim.set_frames_per_day(15.0);
        sim.set_size_scale(0.0001);

        let body = sim.body(handle).unwrap();
        let expected = OrbitGeometry::derive(&body.elements, 0.004);
        assert_eq!(body.geometry, expected);

        let out = sim.tick(handle, 1.0).unwrap();
        assert!((out.position.magnitude() - expected.semi_major_axis).abs() < 1e-6);
    }

    #[test]
    fn test_tick_scales_rotation_output_by_delta_frames() {
        let mut sim = sim();
        let handle = sim.create_body(earth_config()).unwrap();
        let out = sim.tick(handle, 0.5).unwrap();
        assert!((out.rotation_delta.y - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_removed_body_handle_is_rejected() {
        let mut sim = sim();
        let handle = sim.create_body(earth_config()).unwrap();
        let removed = sim.remove_body(handle).unwrap();
        assert_eq!(removed.name, "Earth");
        assert_eq!(sim.body_count(), 0);
        assert!(matches!(
            sim.tick(handle, 1.0),
            Err(SimulationError::UnknownBody(_))
        ));
        assert!(sim.remove_body(handle).is_none());
    }

    #[test]
    fn test_tick_all_advances_every_live_body() {
        let mut sim = sim();
        let a = sim.create_body(earth_config()).unwrap();
        let b = sim.create_body(eccentric_config()).unwrap();
        sim.remove_body(a);

        let outputs = sim.tick_all(1.0).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, b);
    }

    #[test]
    fn test_snapshot_reflects_live_state() {
        let mut sim = sim();
        let a = sim.create_body(earth_config()).unwrap();
        sim.create_body(eccentric_config()).unwrap();
        sim.remove_body(a);

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.body_count, 1);
        assert_eq!(snapshot.bodies[0].name, "Halley");
        assert!((snapshot.distance_scale - 0.001).abs() < 1e-15);

        // Snapshots serialize for hosts that poll over IPC.
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: SimulationSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.bodies[0].name, "Halley");
    }

    #[test]
    fn test_shared_simulation_round_trip() {
        let shared = SharedSimulation::with_seed(ScaleSettings::default(), 3);
        let handle = shared.create_body(earth_config()).unwrap();

        let cloned = shared.clone();
        cloned.set_frames_per_day(60.0);
        shared.tick(handle, 1.0).unwrap();

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.body_count, 1);
        assert!((snapshot.frames_per_day - 60.0).abs() < 1e-12);
    }
}
