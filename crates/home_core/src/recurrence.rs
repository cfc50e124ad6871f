use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::time;

/// Upper bound on the steps `next_after` will take while catching up.
pub const MAX_CATCH_UP_STEPS: u32 = 10_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrencePattern {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            other => Err(RuleError::invalid(format!(
                "unknown recurrence pattern `{other}`"
            ))),
        }
    }
}

/// One "advance the due date" question: every `interval` units of `pattern`
/// starting from `base`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRequest {
    pub base: NaiveDateTime,
    pub pattern: RecurrencePattern,
    pub interval: u32,
}

impl RecurrenceRequest {
    pub fn new(base: NaiveDateTime, pattern: RecurrencePattern, interval: u32) -> Self {
        Self {
            base,
            pattern,
            interval,
        }
    }

    pub fn compute_next(&self) -> Result<NaiveDateTime> {
        compute_next(self.base, self.pattern, self.interval)
    }

    /// Successive occurrences after `base`, each computed from the previous
    /// one. Monthly clamps therefore carry forward (Jan 31, Feb 28, Mar 28).
    pub fn occurrences(&self) -> Occurrences {
        Occurrences {
            current: self.base,
            pattern: self.pattern,
            interval: self.interval,
            done: false,
        }
    }
}

/// Next occurrence after `base`. Time-of-day is preserved.
///
/// Monthly steps keep the day-of-month when the target month has it and
/// clamp to the target month's last day otherwise, so Jan 31 + 1 month is
/// Feb 28 (Feb 29 in leap years), never early March.
pub fn compute_next(
    base: NaiveDateTime,
    pattern: RecurrencePattern,
    interval: u32,
) -> Result<NaiveDateTime> {
    if interval == 0 {
        return Err(RuleError::invalid("recurrence interval must be at least 1"));
    }
    match pattern {
        RecurrencePattern::Daily => time::add_days(base, u64::from(interval)),
        RecurrencePattern::Weekly => time::add_days(base, u64::from(interval) * 7),
        RecurrencePattern::Monthly => time::add_months_clamped(base, interval),
    }
}

/// Date-only variant of [`compute_next`].
pub fn compute_next_date(
    base: NaiveDate,
    pattern: RecurrencePattern,
    interval: u32,
) -> Result<NaiveDate> {
    compute_next(base.and_time(NaiveTime::MIN), pattern, interval).map(|next| next.date())
}

/// First occurrence strictly after `now`, walking forward from the request's
/// base. Always advances at least once, so a base already in the future
/// still yields its successor. Returns the occurrence and the number of
/// steps taken.
pub fn next_after(
    request: &RecurrenceRequest,
    now: NaiveDateTime,
) -> Result<(NaiveDateTime, u32)> {
    let mut steps = 0;
    for next in request.occurrences() {
        let next = next?;
        steps += 1;
        if next > now {
            return Ok((next, steps));
        }
        if steps >= MAX_CATCH_UP_STEPS {
            break;
        }
    }
    Err(RuleError::out_of_range(
        format!("catch up past {now} within {MAX_CATCH_UP_STEPS} steps"),
        request.base,
    ))
}

/// UTC-instant variant of [`next_after`] for due dates stored as instants.
pub fn next_after_utc(
    due: DateTime<Utc>,
    pattern: RecurrencePattern,
    interval: u32,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, u32)> {
    let request = RecurrenceRequest::new(due.naive_utc(), pattern, interval);
    next_after(&request, now.naive_utc()).map(|(next, steps)| (next.and_utc(), steps))
}

/// Iterator returned by [`RecurrenceRequest::occurrences`]. Yields a single
/// error and then stops when a step fails.
#[derive(Debug, Clone)]
pub struct Occurrences {
    current: NaiveDateTime,
    pattern: RecurrencePattern,
    interval: u32,
    done: bool,
}

impl Iterator for Occurrences {
    type Item = Result<NaiveDateTime>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match compute_next(self.current, self.pattern, self.interval) {
            Ok(next) => {
                self.current = next;
                Some(Ok(next))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
