//! Attendance inference over the presence log.
//!
//! Pure functions: the full ordered sample log goes in, derived statistics
//! come out. Nothing here touches storage, so identical inputs always yield
//! identical output. The log is rescanned in full on every call; an
//! incremental cache could replace this if logs ever grow large enough to
//! matter (a tracked follow-up, not a behavior change).

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::PresenceSample;

/// Days of membership bought by one quota payment.
const PAYMENT_PERIOD_DAYS: i64 = 30;

/// One of the most recent gym visits, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitEntry {
    pub date: NaiveDate,
    /// English weekday name ("Monday", ...).
    pub weekday: String,
    /// Earliest present sample recorded on that date.
    pub entry_time: DateTime<Utc>,
}

/// Attendance-day count for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Month key, `YYYY-MM`.
    pub month: String,
    pub days: u32,
}

/// Derived attendance statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    /// Calendar dates that qualify as gym visits.
    pub attendance_days: BTreeSet<NaiveDate>,
    /// Cardinality of `attendance_days` (windowed to the payment date when
    /// one is set, otherwise over the full log).
    pub count_since_payment: usize,
    /// `max(0, 30 - days elapsed since payment)`; 0 when no payment is
    /// recorded.
    pub days_until_next_payment: u32,
    /// Up to three most recent visits, date descending.
    pub recent_visits: Vec<VisitEntry>,
    /// Trailing three calendar months including the current one, most
    /// recent month first.
    pub monthly_attendance: Vec<MonthlyCount>,
}

/// Round a timestamp down to the start of its containing hour.
///
/// This is the granularity unit for the whole engine: samples are recorded
/// hour-aligned and attendance detection compares aligned timestamps.
pub fn align_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// The set of calendar dates qualifying as attendance days.
///
/// A date qualifies iff, among its present samples sorted ascending, some
/// adjacent pair is exactly one hour apart. Duplicate same-hour samples
/// produce a zero gap between neighbors and therefore never qualify a day
/// on their own.
pub fn attendance_days(
    samples: &[PresenceSample],
    since: Option<DateTime<Utc>>,
) -> BTreeSet<NaiveDate> {
    let mut by_day: BTreeMap<NaiveDate, Vec<DateTime<Utc>>> = BTreeMap::new();
    for sample in samples {
        if !sample.is_present {
            continue;
        }
        if let Some(bound) = since {
            if sample.timestamp < bound {
                continue;
            }
        }
        by_day
            .entry(sample.timestamp.date_naive())
            .or_default()
            .push(sample.timestamp);
    }

    let mut days = BTreeSet::new();
    for (date, mut stamps) in by_day {
        stamps.sort_unstable();
        let qualifies = stamps
            .windows(2)
            .any(|pair| pair[1] - pair[0] == Duration::hours(1));
        if qualifies {
            days.insert(date);
        }
    }
    days
}

/// Compute the full statistics block rendered by the gym screen.
///
/// `since` is the last payment date; when `None` the attendance window is
/// the whole log and the payment countdown reports zero.
pub fn compute_attendance_stats(
    samples: &[PresenceSample],
    since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AttendanceStats {
    let days = attendance_days(samples, since);

    let days_until_next_payment = match since {
        Some(payment) => {
            let elapsed = (now - payment).num_days();
            (PAYMENT_PERIOD_DAYS - elapsed).max(0) as u32
        }
        None => 0,
    };

    let recent_visits = recent_visits(samples, &days);
    let monthly_attendance = monthly_attendance(&days, now);

    AttendanceStats {
        count_since_payment: days.len(),
        days_until_next_payment,
        recent_visits,
        monthly_attendance,
        attendance_days: days,
    }
}

/// Up to three most recent attendance days, newest first, each with the
/// earliest present timestamp of that date as the entry time.
fn recent_visits(samples: &[PresenceSample], days: &BTreeSet<NaiveDate>) -> Vec<VisitEntry> {
    days.iter()
        .rev()
        .take(3)
        .filter_map(|&date| {
            let entry_time = samples
                .iter()
                .filter(|s| s.is_present && s.timestamp.date_naive() == date)
                .map(|s| s.timestamp)
                .min()?;
            Some(VisitEntry {
                date,
                weekday: date.format("%A").to_string(),
                entry_time,
            })
        })
        .collect()
}

/// Per-month attendance counts for the current month and the two before
/// it, most recent month first. Days outside the window land in no bucket.
fn monthly_attendance(days: &BTreeSet<NaiveDate>, now: DateTime<Utc>) -> Vec<MonthlyCount> {
    let today = now.date_naive();
    let mut buckets: Vec<MonthlyCount> = (0..3)
        .map(|i| {
            let month = today
                .checked_sub_months(Months::new(i))
                .unwrap_or(today);
            MonthlyCount {
                month: format!("{:04}-{:02}", month.year(), month.month()),
                days: 0,
            }
        })
        .collect();

    for day in days {
        let key = format!("{:04}-{:02}", day.year(), day.month());
        if let Some(bucket) = buckets.iter_mut().find(|b| b.month == key) {
            bucket.days += 1;
        }
    }
    buckets
}
