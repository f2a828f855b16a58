// Body Catalog - configuration ingestion for the simulation
// External body data is validated here, before anything enters the engine

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::orbit_engine::OrbitalElements;

// =============================================================================
// BODY CONFIGURATION
// =============================================================================

/// Everything needed to create one body.
///
/// Immutable once handed to the simulation. Deserializes from host-supplied
/// JSON catalogs; `rotation_period_days` may be omitted and defaults to one
/// day per rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    pub elements: OrbitalElements,
    /// Physical diameter in kilometers, scaled by `size_scale` for display.
    pub visual_diameter_km: f64,
    /// Day length in days; negative for retrograde spin, never zero.
    #[serde(default = "default_rotation_period")]
    pub rotation_period_days: f64,
}

fn default_rotation_period() -> f64 {
    1.0
}

impl BodyConfig {
    pub fn new(
        name: impl Into<String>,
        elements: OrbitalElements,
        visual_diameter_km: f64,
        rotation_period_days: f64,
    ) -> Self {
        Self {
            name: name.into(),
            elements,
            visual_diameter_km,
            rotation_period_days,
        }
    }

    /// Reject out-of-domain values before the body enters the simulation.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if let Some((field, value)) = self.elements.domain_violation() {
            return Err(SimulationError::InvalidConfiguration {
                body: self.name.clone(),
                field,
                value,
            });
        }
        if !self.visual_diameter_km.is_finite() || self.visual_diameter_km <= 0.0 {
            return Err(SimulationError::InvalidConfiguration {
                body: self.name.clone(),
                field: "visual_diameter_km",
                value: self.visual_diameter_km,
            });
        }
        if !self.rotation_period_days.is_finite() || self.rotation_period_days == 0.0 {
            return Err(SimulationError::InvalidConfiguration {
                body: self.name.clone(),
                field: "rotation_period_days",
                value: self.rotation_period_days,
            });
        }
        Ok(())
    }
}

// =============================================================================
// JSON CATALOGS
// =============================================================================

/// Parse a JSON array of body configurations, validating every record.
///
/// Fails on the first malformed or out-of-domain entry so a bad catalog
/// never partially populates a simulation.
pub fn load_catalog(json: &str) -> Result<Vec<BodyConfig>, SimulationError> {
    let configs: Vec<BodyConfig> = serde_json::from_str(json)?;
    for config in &configs {
        config.validate()?;
    }
    Ok(configs)
}

// =============================================================================
// SOLAR SYSTEM PRESETS
// =============================================================================

/// The nine classical bodies with JPL fact-sheet values: semi-major axis
/// (AU), eccentricity, orbital period (days), diameter (km), day length
/// (days, negative = retrograde).
pub fn solar_system() -> Vec<BodyConfig> {
    [
        ("Mercury", 0.387, 0.2056, 87.97, 4_879.0, 58.65),
        ("Venus", 0.723, 0.0068, 224.70, 12_104.0, -243.02),
        ("Earth", 1.0, 0.0167, 365.25, 12_742.0, 0.9973),
        ("Mars", 1.524, 0.0934, 686.98, 6_779.0, 1.026),
        ("Jupiter", 5.204, 0.0489, 4_332.59, 139_820.0, 0.4135),
        ("Saturn", 9.537, 0.0565, 10_759.22, 116_460.0, 0.444),
        ("Uranus", 19.19, 0.0457, 30_688.5, 50_724.0, -0.718),
        ("Neptune", 30.07, 0.0113, 60_182.0, 49_244.0, 0.6713),
        ("Pluto", 39.48, 0.2488, 90_560.0, 2_377.0, -6.387),
    ]
    .iter()
    .map(|&(name, au, e, period, diameter, day)| {
        BodyConfig::new(name, OrbitalElements::new(au, e, period), diameter, day)
    })
    .collect()
}

// =============================================================================
// TESTS
// =============================================================================
