use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::location::Location;

/// A fired rain-trigger compliance obligation.
///
/// Created exactly once per cooldown period per project when aggregated
/// precipitation meets the regulatory threshold. The trigger carries the
/// computed inspection deadline and a write-once [`AuditTrail`] documenting
/// how the decision was reached.
///
/// # Lifecycle
/// `PendingInspection` → `Discharged` when an inspection is recorded, or
/// `Expired` if the deadline passes first. Expired triggers are a compliance
/// violation surfaced to the reporting layer, never silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Aggregated precipitation that fired the trigger, in inches.
    pub precipitation_amount: Decimal,
    /// Threshold in force at trigger time, in inches.
    pub threshold: Decimal,
    pub triggered_at: DateTime<Utc>,
    /// When the mandated inspection must be completed.
    pub deadline: DateTime<Utc>,
    /// Identifier of the regulation requiring the inspection.
    pub regulation: String,
    pub status: TriggerStatus,
    /// Whether an urgent deadline warning has been sent for this trigger.
    pub escalated: bool,
    /// Whether the trigger was durably persisted. A computed deadline is
    /// never discarded on a storage failure; the caller retries the write.
    pub saved: bool,
    /// Persistence error message when `saved` is false.
    pub save_error: Option<String>,
    pub audit_trail: AuditTrail,
}

/// The compliance state of a trigger.
///
/// - `PendingInspection`: obligation open, deadline in the future
/// - `Discharged`: an inspection was recorded before the deadline
/// - `Expired`: the deadline passed with no inspection (violation)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerStatus {
    PendingInspection,
    Discharged,
    Expired,
}

impl TriggerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingInspection => "pending_inspection",
            Self::Discharged => "discharged",
            Self::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending_inspection" => Some(Self::PendingInspection),
            "discharged" => Some(Self::Discharged),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// How the aggregated precipitation amount was derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// The source reported one cumulative 24-hour reading.
    SingleReading,
    /// Discrete observations were summed over the rolling 24-hour window.
    Rolling24hSum,
}

impl CalculationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleReading => "single_reading",
            Self::Rolling24hSum => "rolling_24h_sum",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "single_reading" => Some(Self::SingleReading),
            "rolling_24h_sum" => Some(Self::Rolling24hSum),
            _ => None,
        }
    }
}

/// Write-once record of the inputs behind a trigger decision.
///
/// Exists for regulatory defensibility: an auditor must be able to see the
/// amount, source, threshold, location and calendar context exactly as they
/// were at trigger time. Never edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrail {
    pub triggered_at: DateTime<Utc>,
    pub precipitation_amount: Decimal,
    pub precipitation_source: String,
    pub threshold: Decimal,
    pub regulation: String,
    pub location: Location,
    pub calculation_method: CalculationMethod,
    /// IANA zone id the deadline was computed in.
    pub timezone: String,
}

/// Result of a cooldown acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownAcquisition {
    pub acquired: bool,
    /// Time left until the cooldown releases. Zero when acquired.
    pub remaining: chrono::Duration,
}

/// Cooldown state for a project as exposed to callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CooldownStatus {
    pub active: bool,
    pub remaining_hours: f64,
}
