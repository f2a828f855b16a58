// Orrery - rescalable solar-system animation engine
// Bodies orbit a shared focus on elliptical paths; global scale parameters
// may change at any time without breaking a body's orbit

//! Frame-driven orbital animation for a host renderer.
//!
//! The host creates bodies from [`BodyConfig`] records, calls
//! [`Simulation::tick`] once per rendered frame, and applies the returned
//! position and axial-rotation delta to its scene graph. The three global
//! scale parameters (distance, visual size, frames per day) can be mutated
//! mid-session; every derived quantity is brought back into consistency
//! before the setter returns, with each body's phase preserved.

mod catalog;
mod error;
mod orbit_engine;
mod scale_settings;
mod state_manager;

pub use catalog::{load_catalog, solar_system, BodyConfig};
pub use error::SimulationError;
pub use orbit_engine::{
    orbital_speed_constant, position_on_orbit, OrbitGeometry, OrbitalElements, PhaseState, Vec3,
    ASTRONOMICAL_UNIT_KM,
};
pub use scale_settings::{ScaleChange, ScaleSettings, MIN_SCALE};
pub use state_manager::{
    Body, BodyHandle, BodySnapshot, SharedSimulation, Simulation, SimulationSnapshot, TickOutput,
};
