use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single precipitation measurement, immutable once recorded.
///
/// Amounts are decimal inches. The weather collaborator owns these; the
/// engine only reads snapshots of the trailing 24-hour series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationObservation {
    /// Measured precipitation in inches. Never negative.
    pub amount: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl PrecipitationObservation {
    pub fn new(amount: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self {
            amount,
            observed_at,
        }
    }
}

/// What a weather source reported for the trailing 24 hours.
///
/// Some sources only expose a rolling cumulative total; others report
/// discrete hourly (or sub-hourly) readings that must be summed. Both
/// ingestion modes are first-class, and the resulting trigger records which
/// one produced the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum PrecipitationData {
    /// A single rolling 24-hour total as of `as_of`.
    Cumulative {
        total: Decimal,
        as_of: DateTime<Utc>,
    },
    /// Discrete observations covering the trailing 24 hours.
    Hourly {
        observations: Vec<PrecipitationObservation>,
    },
}

/// A snapshot from the weather collaborator: the data plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationReading {
    /// Identifier of the reporting source (e.g. `open-meteo`), recorded in
    /// the audit trail.
    pub source: String,
    pub data: PrecipitationData,
}
