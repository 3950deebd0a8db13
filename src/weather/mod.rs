//! Weather collaborator boundary.
//!
//! The engine depends on a narrow [`WeatherProvider`] trait and never on a
//! concrete API. Failures must surface as [`WeatherError`], never as zero
//! precipitation: an outage means "could not observe", which the engine
//! records and distinguishes from "no rain observed".

mod open_meteo;

pub use open_meteo::OpenMeteoClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Location, PrecipitationReading};

/// Errors at the weather-source boundary.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed weather response: {0}")]
    Malformed(String),
}

/// Source of the trailing 24-hour precipitation series for a location.
///
/// Implementations may report either a single cumulative total or discrete
/// hourly observations; the returned [`PrecipitationReading`] carries which.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn observe(&self, location: &Location) -> Result<PrecipitationReading, WeatherError>;
}
