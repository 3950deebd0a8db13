use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::{CooldownAcquisition, CooldownStatus};

/// Per-project duplicate-trigger suppression.
///
/// One slot per project holds the last successful trigger time. Acquisition
/// is check-and-set under that slot's own mutex, so two evaluations racing
/// on the same project see exactly one winner while unrelated projects never
/// contend with each other. The outer map lock is only held to look up or
/// insert a slot, never across the acquisition itself.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    slots: RwLock<HashMap<Uuid, Arc<Mutex<Option<DateTime<Utc>>>>>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Seed slots from persisted state so suppression survives restarts.
    pub fn hydrate(&self, entries: impl IntoIterator<Item = (Uuid, DateTime<Utc>)>) {
        let mut slots = self.slots.write().expect("cooldown map lock poisoned");
        for (project_id, last) in entries {
            slots.insert(project_id, Arc::new(Mutex::new(Some(last))));
        }
    }

    /// Attempt to start a new cooldown period for `project_id`.
    ///
    /// Succeeds when no prior trigger exists or the previous one is at least
    /// `cooldown` old, recording `now` as the new last-trigger time. Fails
    /// without touching the slot otherwise, returning how long the caller
    /// must wait. This gate runs before any trigger entity is created.
    pub fn try_acquire(
        &self,
        project_id: Uuid,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> CooldownAcquisition {
        let slot = self.slot(project_id);
        let mut last = slot.lock().expect("cooldown slot lock poisoned");

        if let Some(prev) = *last {
            let elapsed = now.signed_duration_since(prev);
            if elapsed < cooldown {
                return CooldownAcquisition {
                    acquired: false,
                    remaining: cooldown - elapsed,
                };
            }
        }

        *last = Some(now);
        CooldownAcquisition {
            acquired: true,
            remaining: Duration::zero(),
        }
    }

    /// Read-only view of a project's cooldown state.
    pub fn status(&self, project_id: Uuid, now: DateTime<Utc>, cooldown: Duration) -> CooldownStatus {
        let slot = self.slot(project_id);
        let last = slot.lock().expect("cooldown slot lock poisoned");

        match *last {
            Some(prev) => {
                let elapsed = now.signed_duration_since(prev);
                if elapsed < cooldown {
                    let remaining = cooldown - elapsed;
                    CooldownStatus {
                        active: true,
                        remaining_hours: remaining.num_minutes() as f64 / 60.0,
                    }
                } else {
                    CooldownStatus {
                        active: false,
                        remaining_hours: 0.0,
                    }
                }
            }
            None => CooldownStatus {
                active: false,
                remaining_hours: 0.0,
            },
        }
    }

    fn slot(&self, project_id: Uuid) -> Arc<Mutex<Option<DateTime<Utc>>>> {
        if let Some(slot) = self
            .slots
            .read()
            .expect("cooldown map lock poisoned")
            .get(&project_id)
        {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().expect("cooldown map lock poisoned");
        Arc::clone(slots.entry(project_id).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_acquisitions_admit_one_winner() {
        let tracker = Arc::new(CooldownTracker::new());
        let project_id = Uuid::new_v4();
        let now = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    tracker
                        .try_acquire(project_id, now, Duration::hours(24))
                        .acquired
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn projects_do_not_contend() {
        let tracker = CooldownTracker::new();
        let now = Utc::now();

        let a = tracker.try_acquire(Uuid::new_v4(), now, Duration::hours(24));
        let b = tracker.try_acquire(Uuid::new_v4(), now, Duration::hours(24));

        assert!(a.acquired);
        assert!(b.acquired);
    }
}
