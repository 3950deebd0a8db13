//! The rain-trigger compliance engine.
//!
//! Orchestrates one evaluation pass per invocation: fetch the trailing
//! 24-hour precipitation series, aggregate it, compare against the
//! regulatory threshold, gate on the per-project cooldown, compute the
//! inspection deadline, persist the trigger with its audit trail, and emit a
//! notification intent. The weather, storage and notification collaborators
//! are injected as narrow traits so tests substitute fakes.

mod cooldown;
mod deadline;
mod error;
mod escalation;
mod threshold;
mod window;

pub use cooldown::CooldownTracker;
pub use deadline::{compute_deadline, parse_zone, WorkCalendar};
pub use error::ComplianceError;
pub use threshold::{default_threshold, evaluate};
pub use window::aggregate;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::*;
use crate::notify::Notifier;
use crate::weather::WeatherProvider;

/// Storage collaborator for triggers and cooldown state.
///
/// Implemented by [`crate::db::Database`] in production and by in-memory
/// fakes in tests. Persistence failures are ordinary `Err` values; the
/// engine decides what survives them.
pub trait TriggerStore: Send + Sync {
    fn save_trigger(&self, trigger: &Trigger) -> anyhow::Result<()>;
    fn get_trigger(&self, id: Uuid) -> anyhow::Result<Option<Trigger>>;
    /// Past triggers for a project, most recent first.
    fn compliance_history(&self, project_id: Uuid) -> anyhow::Result<Vec<Trigger>>;
    /// All triggers still awaiting inspection.
    fn pending_triggers(&self) -> anyhow::Result<Vec<Trigger>>;
    /// Flag a trigger as escalated. Returns false if it already was, which
    /// is what keeps the deadline-warning sweep at-most-once.
    fn mark_escalated(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Move a pending trigger to expired. Returns false if it was not
    /// pending.
    fn mark_expired(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Discharge a pending trigger after an inspection was recorded.
    fn mark_discharged(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Persisted last-trigger times, used to rehydrate cooldowns on startup.
    fn cooldown_entries(&self) -> anyhow::Result<Vec<(Uuid, DateTime<Utc>)>>;
}

/// Tunable policy for the engine. Defaults encode the EPA CGP terms.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Trigger threshold in inches over 24 hours.
    pub threshold: Decimal,
    /// Minimum interval between triggers for one project.
    pub cooldown: Duration,
    /// Regulatory time budget for completing the inspection.
    pub inspection_window: Duration,
    /// How close to the deadline the urgent warning fires.
    pub escalation_threshold: Duration,
    /// Identifier of the regulation recorded on triggers and audit trails.
    pub regulation: String,
    /// IANA zone used when a check does not name one.
    pub default_timezone: String,
    /// Whether the inspection window counts only working hours.
    pub working_hours_only: bool,
    pub calendar: WorkCalendar,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            cooldown: Duration::hours(24),
            inspection_window: Duration::hours(24),
            escalation_threshold: Duration::hours(2),
            regulation: "EPA-CGP-4.2".to_string(),
            default_timezone: "America/New_York".to_string(),
            working_hours_only: true,
            calendar: WorkCalendar::default(),
        }
    }
}

/// Per-call options for [`ComplianceEngine::check_rain_trigger`].
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Project timezone override. Falls back to the configured default.
    pub timezone: Option<String>,
    /// Evaluation instant override, for backfilling historical storms and
    /// for deterministic tests. Defaults to now.
    pub as_of: Option<DateTime<Utc>>,
}

/// The orchestrator. One instance serves all projects; evaluations for
/// different projects run concurrently without coordination, and the
/// per-project cooldown slot is the only mutual-exclusion point.
pub struct ComplianceEngine {
    weather: Arc<dyn WeatherProvider>,
    store: Arc<dyn TriggerStore>,
    notifier: Arc<dyn Notifier>,
    cooldowns: CooldownTracker,
    config: EngineConfig,
    last_error: Mutex<Option<String>>,
}

impl ComplianceEngine {
    /// Build an engine and rehydrate cooldown state from the store.
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        store: Arc<dyn TriggerStore>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        let cooldowns = CooldownTracker::new();
        match store.cooldown_entries() {
            Ok(entries) => cooldowns.hydrate(entries),
            Err(err) => {
                tracing::warn!(error = %err, "could not rehydrate cooldown state; starting cold");
            }
        }

        Self {
            weather,
            store,
            notifier,
            cooldowns,
            config,
            last_error: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate the rain trigger for one project.
    ///
    /// Returns `Ok(Some(trigger))` when a new obligation fired,
    /// `Ok(None)` when nothing fired (below threshold, cooldown suppression,
    /// or a weather outage recorded via [`Self::last_error`]), and `Err`
    /// only for invalid caller input. A storage failure does not discard the
    /// result: the trigger comes back with `saved = false` and the error
    /// message attached so the write can be retried without recomputing the
    /// deadline.
    pub async fn check_rain_trigger(
        &self,
        project_id: Uuid,
        location: Location,
        options: CheckOptions,
    ) -> Result<Option<Trigger>, ComplianceError> {
        location.validate().map_err(ComplianceError::InvalidLocation)?;

        // Parse the zone before the cooldown gate: failing on a bad zone id
        // after acquisition would burn the project's cooldown for nothing.
        let zone_id = options
            .timezone
            .unwrap_or_else(|| self.config.default_timezone.clone());
        let tz = parse_zone(&zone_id)?;
        let now = options.as_of.unwrap_or_else(Utc::now);

        let reading = match self.weather.observe(&location).await {
            Ok(reading) => reading,
            Err(err) => {
                tracing::error!(
                    project_id = %project_id,
                    error = %err,
                    "precipitation fetch failed; compliance status unknown"
                );
                self.record_error(format!("weather source unavailable: {}", err));
                return Ok(None);
            }
        };

        let (amount, method) = match &reading.data {
            PrecipitationData::Cumulative { total, .. } => {
                (*total, CalculationMethod::SingleReading)
            }
            PrecipitationData::Hourly { observations } => {
                (aggregate(observations, now), CalculationMethod::Rolling24hSum)
            }
        };

        if !evaluate(amount, self.config.threshold)? {
            tracing::debug!(
                project_id = %project_id,
                amount = %amount,
                threshold = %self.config.threshold,
                "precipitation below threshold"
            );
            return Ok(None);
        }

        let acquisition = self
            .cooldowns
            .try_acquire(project_id, now, self.config.cooldown);
        if !acquisition.acquired {
            tracing::debug!(
                project_id = %project_id,
                remaining_minutes = acquisition.remaining.num_minutes(),
                "duplicate trigger suppressed by cooldown"
            );
            return Ok(None);
        }

        let deadline = compute_deadline(
            now,
            tz,
            &self.config.calendar,
            self.config.working_hours_only,
            self.config.inspection_window,
        );

        let mut trigger = Trigger {
            id: Uuid::new_v4(),
            project_id,
            precipitation_amount: amount,
            threshold: self.config.threshold,
            triggered_at: now,
            deadline,
            regulation: self.config.regulation.clone(),
            status: TriggerStatus::PendingInspection,
            escalated: false,
            saved: false,
            save_error: None,
            audit_trail: AuditTrail {
                triggered_at: now,
                precipitation_amount: amount,
                precipitation_source: reading.source.clone(),
                threshold: self.config.threshold,
                regulation: self.config.regulation.clone(),
                location,
                calculation_method: method,
                timezone: zone_id,
            },
        };

        match self.store.save_trigger(&trigger) {
            Ok(()) => trigger.saved = true,
            Err(err) => {
                tracing::error!(
                    trigger_id = %trigger.id,
                    error = %err,
                    "trigger not durably saved; caller must retry the write"
                );
                let message = format!("trigger persistence failed: {}", err);
                trigger.save_error = Some(message.clone());
                self.record_error(message);
            }
        }

        let intent = NotificationIntent {
            notification_type: NotificationType::ComplianceRequired,
            priority: Priority::High,
            channels: vec![Channel::Push, Channel::Sms, Channel::Email],
            project_id,
            deadline,
            remaining_hours: None,
            metadata: IntentMetadata {
                location,
                regulatory_basis: self.config.regulation.clone(),
            },
        };
        if let Err(err) = self.notifier.send(&intent).await {
            tracing::warn!(
                project_id = %project_id,
                error = %err,
                "compliance notification dispatch failed"
            );
        }

        tracing::info!(
            project_id = %project_id,
            trigger_id = %trigger.id,
            amount = %amount,
            deadline = %deadline,
            "rain trigger fired"
        );
        Ok(Some(trigger))
    }

    /// Past triggers for a project, most recent first.
    pub fn compliance_history(&self, project_id: Uuid) -> anyhow::Result<Vec<Trigger>> {
        self.store.compliance_history(project_id)
    }

    /// Current cooldown state for a project.
    pub fn cooldown_status(&self, project_id: Uuid) -> CooldownStatus {
        self.cooldowns
            .status(project_id, Utc::now(), self.config.cooldown)
    }

    /// Cooldown state as of a specific instant.
    pub fn cooldown_status_at(&self, project_id: Uuid, at: DateTime<Utc>) -> CooldownStatus {
        self.cooldowns.status(project_id, at, self.config.cooldown)
    }

    /// Record that an inspection happened, discharging the obligation.
    pub fn record_inspection(&self, trigger_id: Uuid) -> anyhow::Result<bool> {
        let discharged = self.store.mark_discharged(trigger_id)?;
        if discharged {
            tracing::info!(trigger_id = %trigger_id, "trigger discharged by inspection");
        }
        Ok(discharged)
    }

    pub fn get_trigger(&self, trigger_id: Uuid) -> anyhow::Result<Option<Trigger>> {
        self.store.get_trigger(trigger_id)
    }

    /// The most recent absorbed collaborator failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .expect("last error lock poisoned")
            .clone()
    }

    fn record_error(&self, message: String) {
        *self.last_error.lock().expect("last error lock poisoned") = Some(message);
    }

    pub(crate) fn store(&self) -> &Arc<dyn TriggerStore> {
        &self.store
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }
}
