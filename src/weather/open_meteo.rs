//! Open-Meteo backed precipitation source.
//!
//! Configuration is via environment variables:
//! - `RAINCHECK_WEATHER_URL` - Base URL (default: `https://api.open-meteo.com`)

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{WeatherError, WeatherProvider};
use crate::models::{Location, PrecipitationData, PrecipitationObservation, PrecipitationReading};

/// Default URL for the public Open-Meteo API.
const DEFAULT_URL: &str = "https://api.open-meteo.com";

/// A stalled weather call must fail fast; the evaluation loop treats the
/// timeout as an outage, not as zero rain.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Hourly precipitation client for the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    /// Unix timestamps marking each hourly bucket.
    time: Vec<i64>,
    /// Precipitation per bucket, in inches.
    precipitation: Vec<Option<f64>>,
}

impl OpenMeteoClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("RAINCHECK_WEATHER_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::new(base_url)
    }

    /// Create with an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn observe(&self, location: &Location) -> Result<PrecipitationReading, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", location.lat.to_string()),
                ("longitude", location.lng.to_string()),
                ("hourly", "precipitation".to_string()),
                ("past_hours", "24".to_string()),
                ("forecast_hours", "0".to_string()),
                ("precipitation_unit", "inch".to_string()),
                ("timeformat", "unixtime".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let forecast: ForecastResponse = response.json().await?;
        if forecast.hourly.time.len() != forecast.hourly.precipitation.len() {
            return Err(WeatherError::Malformed(format!(
                "hourly series length mismatch: {} timestamps vs {} values",
                forecast.hourly.time.len(),
                forecast.hourly.precipitation.len()
            )));
        }

        let observations = forecast
            .hourly
            .time
            .iter()
            .zip(forecast.hourly.precipitation.iter())
            .filter_map(|(&ts, &amount)| {
                let observed_at = DateTime::<Utc>::from_timestamp(ts, 0)?;
                // Gauges resolve to hundredths of an inch; quantize there so
                // the float-to-decimal conversion cannot smuggle binary
                // artifacts into threshold comparison.
                let amount = Decimal::from_f64(amount?)?.round_dp(2);
                Some(PrecipitationObservation::new(amount, observed_at))
            })
            .collect();

        Ok(PrecipitationReading {
            source: "open-meteo".to_string(),
            data: PrecipitationData::Hourly { observations },
        })
    }
}
