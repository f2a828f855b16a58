// Error types for the orrery engine.
// Configuration is rejected at the boundary; nothing is recovered mid-flight.

use std::fmt;

use crate::state_manager::BodyHandle;

/// Errors surfaced by the simulation API.
#[derive(Debug)]
pub enum SimulationError {
    /// A body configuration value is outside its valid domain. Raised at
    /// creation time only; a body that enters the simulation never trips it.
    InvalidConfiguration {
        body: String,
        field: &'static str,
        value: f64,
    },
    /// A body's physical radius reached zero or its state went non-finite
    /// during a tick. Fatal: valid configuration makes this unreachable, so
    /// the caller gets an error instead of a silently NaN position.
    DegenerateState { body: String, radius: f64 },
    /// The handle does not refer to a live body.
    UnknownBody(BodyHandle),
    /// A body catalog failed to parse.
    Catalog(serde_json::Error),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidConfiguration { body, field, value } => {
                write!(f, "invalid configuration for '{}': {} = {}", body, field, value)
            }
            SimulationError::DegenerateState { body, radius } => {
                write!(
                    f,
                    "degenerate state for '{}': physical radius {} during tick",
                    body, radius
                )
            }
            SimulationError::UnknownBody(handle) => {
                write!(f, "no live body for handle {:?}", handle)
            }
            SimulationError::Catalog(e) => write!(f, "catalog parse failed: {}", e),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Catalog(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(e: serde_json::Error) -> Self {
        SimulationError::Catalog(e)
    }
}
