use chrono::{Duration, TimeZone, Utc};
use raincheck::engine::CooldownTracker;
use speculate2::speculate;
use uuid::Uuid;

speculate! {
    before {
        let tracker = CooldownTracker::new();
        let project_id = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let cooldown = Duration::hours(24);
    }

    describe "try_acquire" {
        it "succeeds for a project with no prior trigger" {
            let acquisition = tracker.try_acquire(project_id, now, cooldown);
            assert!(acquisition.acquired);
            assert_eq!(acquisition.remaining, Duration::zero());
        }

        it "suppresses a second acquisition inside the cooldown" {
            assert!(tracker.try_acquire(project_id, now, cooldown).acquired);

            let retry = tracker.try_acquire(project_id, now + Duration::hours(1), cooldown);
            assert!(!retry.acquired);
            assert_eq!(retry.remaining, Duration::hours(23));
        }

        it "leaves the slot untouched on a failed acquisition" {
            assert!(tracker.try_acquire(project_id, now, cooldown).acquired);
            tracker.try_acquire(project_id, now + Duration::hours(23), cooldown);

            // Had the failed attempt reset the slot, this would still be
            // suppressed; the cooldown is measured from the original trigger.
            let after = tracker.try_acquire(project_id, now + Duration::hours(24), cooldown);
            assert!(after.acquired);
        }

        it "releases at exactly the cooldown boundary" {
            assert!(tracker.try_acquire(project_id, now, cooldown).acquired);

            let at_boundary = tracker.try_acquire(project_id, now + cooldown, cooldown);
            assert!(at_boundary.acquired);
        }

        it "releases after the cooldown has elapsed" {
            assert!(tracker.try_acquire(project_id, now, cooldown).acquired);

            let later = tracker.try_acquire(project_id, now + Duration::hours(25), cooldown);
            assert!(later.acquired);
        }

        it "tracks projects independently" {
            let other = Uuid::new_v4();
            assert!(tracker.try_acquire(project_id, now, cooldown).acquired);
            assert!(tracker.try_acquire(other, now, cooldown).acquired);
        }
    }

    describe "status" {
        it "is inactive before any trigger" {
            let status = tracker.status(project_id, now, cooldown);
            assert!(!status.active);
            assert_eq!(status.remaining_hours, 0.0);
        }

        it "is active with remaining hours right after a trigger" {
            tracker.try_acquire(project_id, now, cooldown);

            let status = tracker.status(project_id, now + Duration::hours(2), cooldown);
            assert!(status.active);
            assert!((status.remaining_hours - 22.0).abs() < 0.02);
        }

        it "goes inactive once the cooldown has elapsed" {
            tracker.try_acquire(project_id, now, cooldown);

            let status = tracker.status(project_id, now + Duration::hours(25), cooldown);
            assert!(!status.active);
            assert_eq!(status.remaining_hours, 0.0);
        }
    }

    describe "hydrate" {
        it "seeds suppression from persisted state" {
            tracker.hydrate(vec![(project_id, now - Duration::hours(1))]);

            let acquisition = tracker.try_acquire(project_id, now, cooldown);
            assert!(!acquisition.acquired);
            assert_eq!(acquisition.remaining, Duration::hours(23));
        }

        it "does not suppress projects whose persisted trigger is stale" {
            tracker.hydrate(vec![(project_id, now - Duration::hours(30))]);

            assert!(tracker.try_acquire(project_id, now, cooldown).acquired);
        }
    }
}
