//! Calendar and cooldown arithmetic shared by the recurrence and cooldown
//! evaluators.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{Result, RuleError};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Adds whole calendar days.
pub fn add_days(base: NaiveDateTime, days: u64) -> Result<NaiveDateTime> {
    base.checked_add_days(chrono::Days::new(days))
        .ok_or_else(|| RuleError::out_of_range(format!("add {days} days"), base))
}

/// Adds calendar months, keeping the day-of-month when it exists in the
/// target month and otherwise clamping to that month's last day.
pub fn add_months_clamped(base: NaiveDateTime, months: u32) -> Result<NaiveDateTime> {
    // chrono clamps to the end of the target month rather than rolling over.
    base.checked_add_months(Months::new(months))
        .ok_or_else(|| RuleError::out_of_range(format!("add {months} months"), base))
}

/// Number of days in the given month. `month` is 1-based.
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.pred_opt()?.day())
}

/// Fractional days from `now` until the start (00:00 UTC) of `date`.
/// Negative once that instant has passed, so an item is already expired
/// during its expiry day.
pub fn days_until(date: NaiveDate, now: DateTime<Utc>) -> f64 {
    let expires_at = date.and_time(NaiveTime::MIN).and_utc();
    expires_at.signed_duration_since(now).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// A missing `last` timestamp always satisfies the cooldown.
pub fn cooldown_satisfied(last: Option<DateTime<Utc>>, now: DateTime<Utc>, hours: f64) -> bool {
    match last {
        None => true,
        Some(last) => elapsed_millis(last, now) >= window_millis(hours),
    }
}

/// Time left before the cooldown expires, or `None` when already eligible.
pub fn cooldown_remaining(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    hours: f64,
) -> Option<Duration> {
    let last = last?;
    let window = window_millis(hours);
    let elapsed = elapsed_millis(last, now);
    (elapsed < window).then(|| Duration::milliseconds(window - elapsed))
}

fn window_millis(hours: f64) -> i64 {
    // Float-to-int casts saturate, so huge windows stay huge.
    (hours * MILLIS_PER_HOUR).round() as i64
}

fn elapsed_millis(last: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(last).num_milliseconds()
}
