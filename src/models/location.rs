use serde::{Deserialize, Serialize};

/// A project site location as WGS84 coordinates.
///
/// Locations are validated before any evaluation runs: out-of-range or
/// non-finite coordinates are rejected up front so a malformed webhook
/// payload can never reach the weather collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that both coordinates are finite and within WGS84 bounds.
    pub fn validate(&self) -> Result<(), String> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err("coordinates must be finite numbers".to_string());
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("latitude {} out of range [-90, 90]", self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(format!("longitude {} out of range [-180, 180]", self.lng));
        }
        Ok(())
    }
}
