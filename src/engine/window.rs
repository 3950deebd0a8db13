use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::models::PrecipitationObservation;

/// Sum all observations falling inside the trailing 24-hour window.
///
/// The window is `(as_of - 24h, as_of]` in absolute time. Calendar-day and
/// DST boundaries are irrelevant here: a series straddling local midnight or
/// a clock change sums the same as any other, because membership is decided
/// on UTC instants only. Observations outside the window are excluded, not
/// clamped. An empty series aggregates to zero, which downstream reads as
/// "no rain observed", distinct from "could not observe" (a weather error).
pub fn aggregate(observations: &[PrecipitationObservation], as_of: DateTime<Utc>) -> Decimal {
    let cutoff = as_of - Duration::hours(24);
    observations
        .iter()
        .filter(|obs| obs.observed_at > cutoff && obs.observed_at <= as_of)
        .fold(Decimal::ZERO, |total, obs| total + obs.amount)
}
