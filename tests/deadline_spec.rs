use chrono::{Datelike, Duration, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use raincheck::engine::{compute_deadline, parse_zone, ComplianceError, WorkCalendar};
use speculate2::speculate;

fn window() -> Duration {
    Duration::hours(24)
}

fn new_york() -> Tz {
    parse_zone("America/New_York").expect("known zone")
}

speculate! {
    describe "absolute mode" {
        it "adds exactly 24 hours when working hours are not carved out" {
            let triggered = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
            let deadline = compute_deadline(
                triggered,
                new_york(),
                &WorkCalendar::default(),
                false,
                window(),
            );
            assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 1, 16, 10, 0, 0).unwrap());
        }
    }

    describe "working-hours mode" {
        before {
            let calendar = WorkCalendar::default();
        }

        it "rolls a Friday evening trigger to Monday morning" {
            // 18:00 UTC on Friday 2024-01-19 is 13:00 EST; 24 hours later is
            // Saturday, so the deadline becomes Monday at the start of the
            // working day: 07:00 EST = 12:00 UTC.
            let triggered = Utc.with_ymd_and_hms(2024, 1, 19, 18, 0, 0).unwrap();
            let deadline = compute_deadline(triggered, new_york(), &calendar, true, window());

            assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 1, 22, 12, 0, 0).unwrap());
            let local = deadline.with_timezone(&new_york());
            assert_eq!(local.weekday(), Weekday::Mon);
            assert_eq!(local.hour(), 7);
        }

        it "keeps the exact 24-hour instant when it lands inside a working window" {
            // Monday 10:00 EST trigger; Tuesday 10:00 EST is a working hour.
            let triggered = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
            let deadline = compute_deadline(triggered, new_york(), &calendar, true, window());
            assert_eq!(deadline, triggered + window());
        }

        it "rolls an early-morning landing forward to the same day's start" {
            // 24 hours after Monday 03:00 EST is Tuesday 03:00 EST, before
            // opening; the deadline is Tuesday 07:00 EST.
            let triggered = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
            let deadline = compute_deadline(triggered, new_york(), &calendar, true, window());
            assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 1, 16, 12, 0, 0).unwrap());
        }

        it "rolls an after-hours landing to the next working day" {
            // Sunday 17:30 EST trigger lands Monday 17:30 EST, after close;
            // the deadline is Tuesday 07:00 EST.
            let triggered = Utc.with_ymd_and_hms(2024, 1, 14, 22, 30, 0).unwrap();
            let deadline = compute_deadline(triggered, new_york(), &calendar, true, window());
            assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 1, 16, 12, 0, 0).unwrap());
        }

        it "treats the end of the working day as exclusive" {
            // Landing at exactly 17:00 local rolls to the next day's start.
            let triggered = Utc.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap();
            let deadline = compute_deadline(triggered, new_york(), &calendar, true, window());
            assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 1, 16, 12, 0, 0).unwrap());
        }

        it "never lands on a weekend or outside working hours" {
            // Sweep a week of hourly triggers; every computed deadline must
            // sit on a workday inside the working window.
            let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
            for hour in 0..168 {
                let triggered = start + Duration::hours(hour);
                let deadline = compute_deadline(triggered, new_york(), &calendar, true, window());
                let local = deadline.with_timezone(&new_york());

                assert!(calendar.is_workday(local.weekday()), "landed on {}", local);
                assert!((7..17).contains(&local.hour()), "landed at {}", local);
                assert!(deadline >= triggered + window(), "deadline shrank: {}", local);
            }
        }

        it "respects custom calendar hours" {
            let calendar = WorkCalendar {
                start_hour: 8,
                end_hour: 18,
                ..WorkCalendar::default()
            };
            // Friday evening again; Monday opens at 08:00 EST = 13:00 UTC.
            let triggered = Utc.with_ymd_and_hms(2024, 1, 19, 18, 0, 0).unwrap();
            let deadline = compute_deadline(triggered, new_york(), &calendar, true, window());
            assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 1, 22, 13, 0, 0).unwrap());
        }
    }

    describe "DST transitions" {
        it "shifts a nonexistent rolled time to the next valid instant" {
            // US spring-forward, 2024-03-10: local 02:00-03:00 does not
            // exist. A calendar opening at 02:00 with Sunday as a workday
            // forces the rolled deadline into the gap; it must come out at
            // 03:00 EDT (07:00 UTC), not crash or land at a fake instant.
            let calendar = WorkCalendar {
                start_hour: 2,
                end_hour: 17,
                workdays: vec![
                    Weekday::Mon,
                    Weekday::Tue,
                    Weekday::Wed,
                    Weekday::Thu,
                    Weekday::Fri,
                    Weekday::Sat,
                    Weekday::Sun,
                ],
            };
            // 24 hours after this is Sunday 01:30 EST, before the 02:00 open.
            let triggered = Utc.with_ymd_and_hms(2024, 3, 9, 6, 30, 0).unwrap();
            let deadline = compute_deadline(triggered, new_york(), &calendar, true, window());
            assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 3, 10, 7, 0, 0).unwrap());
        }

        it "resolves an ambiguous rolled time to the earlier offset" {
            // US fall-back, 2024-11-03: local 01:00 happens twice. The
            // earlier (EDT) instant is the sooner deadline and wins.
            let calendar = WorkCalendar {
                start_hour: 1,
                end_hour: 17,
                workdays: vec![
                    Weekday::Mon,
                    Weekday::Tue,
                    Weekday::Wed,
                    Weekday::Thu,
                    Weekday::Fri,
                    Weekday::Sat,
                    Weekday::Sun,
                ],
            };
            // 24 hours after this is Sunday 00:30 EDT, before the 01:00 open.
            let triggered = Utc.with_ymd_and_hms(2024, 11, 2, 4, 30, 0).unwrap();
            let deadline = compute_deadline(triggered, new_york(), &calendar, true, window());
            assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 11, 3, 5, 0, 0).unwrap());
        }
    }

    describe "zone validation" {
        it "rejects an unknown zone id" {
            let result = parse_zone("Mars/Olympus_Mons");
            assert!(matches!(result, Err(ComplianceError::InvalidTimezone(_))));
        }

        it "accepts canonical IANA ids" {
            assert!(parse_zone("America/New_York").is_ok());
            assert!(parse_zone("Europe/Berlin").is_ok());
            assert!(parse_zone("UTC").is_ok());
        }
    }
}
