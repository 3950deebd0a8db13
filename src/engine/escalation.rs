//! Deadline escalation sweep.
//!
//! Runs on a periodic tick (or on demand through the CLI and API). Scans
//! open triggers, expires the ones whose deadline has passed, and sends a
//! single urgent warning per trigger once the deadline is close.

use chrono::{DateTime, Utc};

use super::ComplianceEngine;
use crate::models::{
    Channel, IntentMetadata, NotificationIntent, NotificationType, Priority, Trigger,
};

impl ComplianceEngine {
    /// Scan pending triggers and escalate or expire them as of `now`.
    ///
    /// Expiry is a compliance violation and is recorded even when no warning
    /// was ever sent. The warning itself is at-most-once per trigger: the
    /// store flips the escalated flag first, and only a changed row emits an
    /// intent, so concurrent sweeps cannot double-send.
    pub async fn check_pending_deadlines(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let pending = self.store().pending_triggers()?;

        for trigger in pending {
            let remaining = trigger.deadline.signed_duration_since(now);

            if remaining <= chrono::Duration::zero() {
                if self.store().mark_expired(trigger.id)? {
                    tracing::warn!(
                        trigger_id = %trigger.id,
                        project_id = %trigger.project_id,
                        deadline = %trigger.deadline,
                        "inspection deadline passed without discharge; trigger expired"
                    );
                }
                continue;
            }

            if remaining <= self.config().escalation_threshold && !trigger.escalated {
                if !self.store().mark_escalated(trigger.id)? {
                    continue;
                }

                let intent = deadline_warning(&trigger, remaining);
                if let Err(err) = self.notifier().send(&intent).await {
                    tracing::warn!(
                        trigger_id = %trigger.id,
                        error = %err,
                        "deadline warning dispatch failed"
                    );
                }

                tracing::info!(
                    trigger_id = %trigger.id,
                    project_id = %trigger.project_id,
                    remaining_minutes = remaining.num_minutes(),
                    "deadline warning escalated"
                );
            }
        }

        Ok(())
    }
}

fn deadline_warning(trigger: &Trigger, remaining: chrono::Duration) -> NotificationIntent {
    NotificationIntent {
        notification_type: NotificationType::DeadlineWarning,
        priority: Priority::Urgent,
        channels: vec![Channel::Push, Channel::Sms, Channel::Email, Channel::Phone],
        project_id: trigger.project_id,
        deadline: trigger.deadline,
        remaining_hours: Some(remaining.num_minutes() as f64 / 60.0),
        metadata: IntentMetadata {
            location: trigger.audit_trail.location,
            regulatory_basis: trigger.regulation.clone(),
        },
    }
}
