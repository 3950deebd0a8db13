use std::str::FromStr;

use chrono::{Duration, TimeZone, Utc};
use raincheck::engine::{aggregate, default_threshold, evaluate, ComplianceError};
use raincheck::models::PrecipitationObservation;
use rust_decimal::Decimal;
use speculate2::speculate;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("literal decimal")
}

fn obs(amount: &str, at: chrono::DateTime<Utc>) -> PrecipitationObservation {
    PrecipitationObservation::new(dec(amount), at)
}

speculate! {
    describe "threshold evaluation" {
        it "triggers at exactly the threshold" {
            assert!(evaluate(dec("0.25"), default_threshold()).unwrap());
        }

        it "does not trigger just below the threshold" {
            assert!(!evaluate(dec("0.24"), default_threshold()).unwrap());
            assert!(!evaluate(dec("0.249999"), default_threshold()).unwrap());
        }

        it "triggers above the threshold" {
            assert!(evaluate(dec("0.26"), default_threshold()).unwrap());
            assert!(evaluate(dec("2.0"), default_threshold()).unwrap());
        }

        it "is exact for sums that break binary floats" {
            // 0.1 + 0.15 as f64 is 0.24999999999999997; as decimals it is
            // exactly 0.25 and must trigger.
            let sum = dec("0.1") + dec("0.15");
            assert_eq!(sum, dec("0.25"));
            assert!(evaluate(sum, default_threshold()).unwrap());
        }

        it "treats zero as below any positive threshold" {
            assert!(!evaluate(Decimal::ZERO, default_threshold()).unwrap());
        }

        it "rejects negative amounts" {
            let result = evaluate(dec("-0.01"), default_threshold());
            assert!(matches!(result, Err(ComplianceError::InvalidInput(_))));
        }

        it "rejects negative thresholds" {
            let result = evaluate(dec("0.30"), dec("-0.25"));
            assert!(matches!(result, Err(ComplianceError::InvalidInput(_))));
        }

        it "honors a custom threshold" {
            assert!(evaluate(dec("0.10"), dec("0.10")).unwrap());
            assert!(!evaluate(dec("0.10"), dec("0.11")).unwrap());
        }
    }

    describe "window aggregation" {
        before {
            let as_of = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        }

        it "sums discrete observations inside the window" {
            let series = vec![
                obs("0.05", as_of - Duration::hours(1)),
                obs("0.08", as_of - Duration::hours(2)),
                obs("0.07", as_of - Duration::hours(3)),
                obs("0.06", as_of - Duration::hours(4)),
            ];
            assert_eq!(aggregate(&series, as_of), dec("0.26"));
        }

        it "excludes observations older than 24 hours rather than clamping them" {
            let series = vec![
                obs("0.20", as_of - Duration::hours(30)),
                obs("0.10", as_of - Duration::hours(2)),
            ];
            assert_eq!(aggregate(&series, as_of), dec("0.10"));
        }

        it "excludes an observation at exactly the 24-hour boundary" {
            let series = vec![obs("0.30", as_of - Duration::hours(24))];
            assert_eq!(aggregate(&series, as_of), Decimal::ZERO);
        }

        it "includes an observation at the evaluation instant" {
            let series = vec![obs("0.30", as_of)];
            assert_eq!(aggregate(&series, as_of), dec("0.30"));
        }

        it "excludes observations after the evaluation instant" {
            let series = vec![obs("0.30", as_of + Duration::minutes(5))];
            assert_eq!(aggregate(&series, as_of), Decimal::ZERO);
        }

        it "aggregates an empty series to zero" {
            assert_eq!(aggregate(&[], as_of), Decimal::ZERO);
        }

        it "sums exactly across decimal amounts" {
            let series = vec![
                obs("0.1", as_of - Duration::hours(1)),
                obs("0.15", as_of - Duration::hours(2)),
            ];
            let total = aggregate(&series, as_of);
            assert_eq!(total, dec("0.25"));
            assert!(evaluate(total, default_threshold()).unwrap());
        }

        it "spans local midnight and DST transitions without bucketing" {
            // 2024-11-03 is the US fall-back date: the local day has 25
            // hours. Membership is decided on UTC instants, so a series
            // straddling the transition sums like any other.
            let as_of = Utc.with_ymd_and_hms(2024, 11, 3, 18, 0, 0).unwrap();
            let series = vec![
                obs("0.10", Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap()),
                obs("0.10", Utc.with_ymd_and_hms(2024, 11, 3, 6, 30, 0).unwrap()),
                obs("0.06", Utc.with_ymd_and_hms(2024, 11, 2, 23, 0, 0).unwrap()),
            ];
            assert_eq!(aggregate(&series, as_of), dec("0.26"));
        }
    }
}
