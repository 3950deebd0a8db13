use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use chrono::offset::{LocalResult, TimeZone};

use super::error::ComplianceError;

/// The business calendar deadline arithmetic runs against.
///
/// Hours and days are values, not baked-in constants: jurisdictions differ,
/// and tests exercise other windows. The defaults are the common permit
/// terms of Monday through Friday, 07:00 to 17:00 local time.
#[derive(Debug, Clone)]
pub struct WorkCalendar {
    /// First working hour of the day (inclusive), local time.
    pub start_hour: u32,
    /// End of the working day (exclusive), local time.
    pub end_hour: u32,
    pub workdays: Vec<Weekday>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            start_hour: 7,
            end_hour: 17,
            workdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

impl WorkCalendar {
    pub fn is_workday(&self, day: Weekday) -> bool {
        self.workdays.contains(&day)
    }

    fn day_start(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    fn day_end(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.end_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

/// Resolve an IANA zone id, failing with the spec's `InvalidTimezone`.
pub fn parse_zone(id: &str) -> Result<Tz, ComplianceError> {
    id.parse::<Tz>()
        .map_err(|_| ComplianceError::InvalidTimezone(id.to_string()))
}

/// Compute the inspection deadline for a trigger.
///
/// The regulatory budget is `inspection_window` (24 hours) of absolute time.
/// With `working_hours_only` unset the deadline is simply
/// `triggered_at + inspection_window`, for jurisdictions without a
/// working-hours carve-out.
///
/// With it set, the 24-hour mark is taken in the project's local timezone
/// and, when it lands outside the working calendar, rolled forward
/// day-by-day to the next working window. A Friday-evening trigger is due
/// Monday morning, never on a weekend, and the returned instant always has
/// a local clock time within `[start_hour, end_hour)` on a workday.
///
/// Civil-calendar arithmetic is done in the target zone, never in server
/// time. A rolled deadline falling in a DST spring-forward gap shifts to
/// the next valid local instant; an ambiguous fall-back time takes the
/// earlier offset, which is the sooner (conservative) deadline.
pub fn compute_deadline(
    triggered_at: DateTime<Utc>,
    tz: Tz,
    calendar: &WorkCalendar,
    working_hours_only: bool,
    inspection_window: Duration,
) -> DateTime<Utc> {
    let absolute = triggered_at + inspection_window;
    if !working_hours_only {
        return absolute;
    }

    let local = absolute.with_timezone(&tz);
    let start = calendar.day_start();
    let end = calendar.day_end();

    let mut date = local.date_naive();
    let mut time = local.time();

    if calendar.is_workday(date.weekday()) && time >= start && time < end {
        // Already inside a working window; keep the exact 24-hour instant.
        return absolute;
    }

    loop {
        if !calendar.is_workday(date.weekday()) || time >= end {
            date = date.succ_opt().expect("work calendar walked past date range");
            time = start;
            continue;
        }
        if time < start {
            time = start;
        }
        break;
    }

    resolve_local(tz, date.and_time(time)).with_timezone(&Utc)
}

/// Map a wall-clock time to a real instant in `tz`.
///
/// Nonexistent local times (spring-forward gap) advance one hour until a
/// valid instant exists. Ambiguous times resolve to the earliest offset.
fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = naive;
    loop {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => candidate += Duration::hours(1),
        }
    }
}
