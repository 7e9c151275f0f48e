//! Parameters structure for the Odometer

use serde::Deserialize;

/// Parameters for the dead-reckoning integrator.
#[derive(Debug, Clone, Deserialize)]
pub struct OdometerParams {
    /// Target period of the integration loop.
    ///
    /// Units: milliseconds
    pub period_ms: u64,
}

impl Default for OdometerParams {
    fn default() -> Self {
        Self { period_ms: 15 }
    }
}
