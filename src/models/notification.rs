use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::location::Location;

/// Why a notification is being sent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// A trigger fired; an inspection is now required.
    ComplianceRequired,
    /// The inspection deadline is approaching and nothing was recorded.
    DeadlineWarning,
}

/// Delivery urgency as understood by the notification collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Urgent,
}

/// A delivery channel. Actual transport lives outside this engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Push,
    Sms,
    Email,
    Phone,
}

/// Context carried alongside every notification for the receiving side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentMetadata {
    pub location: Location,
    pub regulatory_basis: String,
}

/// An ephemeral notification request handed to the delivery collaborator.
///
/// The engine emits intents and forgets them; delivery success or failure
/// never feeds back into compliance state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationIntent {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub channels: Vec<Channel>,
    pub project_id: Uuid,
    pub deadline: DateTime<Utc>,
    /// Hours until the deadline, present on deadline warnings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_hours: Option<f64>,
    pub metadata: IntentMetadata,
}
