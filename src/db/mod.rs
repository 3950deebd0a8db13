mod schema;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::engine::TriggerStore;
use crate::models::*;

/// SQLite-backed storage collaborator.
///
/// Holds triggers with their embedded audit trails plus the persisted
/// cooldown state that re-seeds the in-memory tracker after a restart.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "raincheck")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("raincheck.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Trigger operations
    // ============================================================

    /// Persist a trigger and overwrite the project's cooldown state in one
    /// transaction, so a saved trigger always has matching suppression
    /// state on disk.
    pub fn save_trigger(&self, trigger: &Trigger) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let now = Utc::now();

        tx.execute(
            "INSERT INTO triggers (id, project_id, precipitation_amount, threshold, triggered_at,
                                   deadline, regulation, status, escalated, audit_trail, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                trigger.id.to_string(),
                trigger.project_id.to_string(),
                trigger.precipitation_amount.to_string(),
                trigger.threshold.to_string(),
                trigger.triggered_at.to_rfc3339(),
                trigger.deadline.to_rfc3339(),
                &trigger.regulation,
                trigger.status.as_str(),
                if trigger.escalated { 1 } else { 0 },
                serde_json::to_string(&trigger.audit_trail)?,
                now.to_rfc3339(),
            ),
        )?;

        tx.execute(
            "INSERT INTO cooldown_state (project_id, last_triggered_at) VALUES (?, ?)
             ON CONFLICT(project_id) DO UPDATE SET last_triggered_at = excluded.last_triggered_at",
            (
                trigger.project_id.to_string(),
                trigger.triggered_at.to_rfc3339(),
            ),
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn get_trigger(&self, id: Uuid) -> Result<Option<Trigger>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, precipitation_amount, threshold, triggered_at, deadline,
                    regulation, status, escalated, audit_trail
             FROM triggers WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(trigger_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn compliance_history(&self, project_id: Uuid) -> Result<Vec<Trigger>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, precipitation_amount, threshold, triggered_at, deadline,
                    regulation, status, escalated, audit_trail
             FROM triggers WHERE project_id = ? ORDER BY triggered_at DESC",
        )?;

        let triggers = stmt
            .query_map([project_id.to_string()], trigger_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(triggers)
    }

    pub fn pending_triggers(&self) -> Result<Vec<Trigger>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, precipitation_amount, threshold, triggered_at, deadline,
                    regulation, status, escalated, audit_trail
             FROM triggers WHERE status = 'pending_inspection' ORDER BY deadline",
        )?;

        let triggers = stmt
            .query_map([], trigger_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(triggers)
    }

    /// Conditional flip of the escalated flag. The WHERE clause is what
    /// keeps the escalation sweep at-most-once per trigger.
    pub fn mark_escalated(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE triggers SET escalated = 1 WHERE id = ? AND escalated = 0",
            [id.to_string()],
        )?;
        Ok(rows > 0)
    }

    pub fn mark_expired(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE triggers SET status = 'expired' WHERE id = ? AND status = 'pending_inspection'",
            [id.to_string()],
        )?;
        Ok(rows > 0)
    }

    pub fn mark_discharged(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE triggers SET status = 'discharged' WHERE id = ? AND status = 'pending_inspection'",
            [id.to_string()],
        )?;
        Ok(rows > 0)
    }

    // ============================================================
    // Cooldown state
    // ============================================================

    pub fn cooldown_entries(&self) -> Result<Vec<(Uuid, DateTime<Utc>)>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT project_id, last_triggered_at FROM cooldown_state")?;

        let entries = stmt
            .query_map([], |row| {
                Ok((
                    parse_uuid(row.get::<_, String>(0)?),
                    parse_datetime(row.get::<_, String>(1)?),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}

impl TriggerStore for Database {
    fn save_trigger(&self, trigger: &Trigger) -> Result<()> {
        Database::save_trigger(self, trigger)
    }

    fn get_trigger(&self, id: Uuid) -> Result<Option<Trigger>> {
        Database::get_trigger(self, id)
    }

    fn compliance_history(&self, project_id: Uuid) -> Result<Vec<Trigger>> {
        Database::compliance_history(self, project_id)
    }

    fn pending_triggers(&self) -> Result<Vec<Trigger>> {
        Database::pending_triggers(self)
    }

    fn mark_escalated(&self, id: Uuid) -> Result<bool> {
        Database::mark_escalated(self, id)
    }

    fn mark_expired(&self, id: Uuid) -> Result<bool> {
        Database::mark_expired(self, id)
    }

    fn mark_discharged(&self, id: Uuid) -> Result<bool> {
        Database::mark_discharged(self, id)
    }

    fn cooldown_entries(&self) -> Result<Vec<(Uuid, DateTime<Utc>)>> {
        Database::cooldown_entries(self)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn trigger_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Trigger> {
    let audit_json: String = row.get(9)?;
    // The audit trail is the regulatory record; a row whose JSON cannot be
    // read back is a storage fault, never silently reconstructed.
    let audit_trail: AuditTrail = serde_json::from_str(&audit_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Trigger {
        id: parse_uuid(row.get::<_, String>(0)?),
        project_id: parse_uuid(row.get::<_, String>(1)?),
        precipitation_amount: parse_decimal(row.get::<_, String>(2)?),
        threshold: parse_decimal(row.get::<_, String>(3)?),
        triggered_at: parse_datetime(row.get::<_, String>(4)?),
        deadline: parse_datetime(row.get::<_, String>(5)?),
        regulation: row.get(6)?,
        status: TriggerStatus::from_str(&row.get::<_, String>(7)?)
            .unwrap_or(TriggerStatus::PendingInspection),
        escalated: row.get::<_, i32>(8)? != 0,
        // Anything read back from storage was, by definition, saved.
        saved: true,
        save_error: None,
        audit_trail,
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_decimal(s: String) -> Decimal {
    Decimal::from_str(&s).unwrap_or(Decimal::ZERO)
}
