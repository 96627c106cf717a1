//! Synthesis of the new commit timestamps.
//!
//! Commits are spread evenly over the range, each nudged by a few days of
//! jitter and given a random time of day. The generated timestamps are then
//! sorted, so the assignment is monotonic in original commit order no matter
//! how the jitter fell.

use chrono::{Duration, NaiveDateTime};
use rand::Rng;

use crate::error::ConfigError;

/// Maximum day-level jitter applied in either direction.
pub const JITTER_DAYS: i64 = 2;

/// Earliest hour of day a commit may be placed at.
pub const FIRST_HOUR: i64 = 9;

/// Latest hour of day a commit may be placed at.
pub const LAST_HOUR: i64 = 22;

/// Inclusive range the rewritten history must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    /// Builds a range, rejecting `start >= end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ConfigError> {
        if start >= end {
            return Err(ConfigError::EmptyRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Whole days between start and end, rounded down.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// One synthesized timestamp per commit, indexed by original commit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDateAssignment {
    dates: Vec<NaiveDateTime>,
}

impl CommitDateAssignment {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Timestamp for the commit at zero-based position `index`.
    pub fn get(&self, index: usize) -> Option<NaiveDateTime> {
        self.dates.get(index).copied()
    }

    pub fn as_slice(&self) -> &[NaiveDateTime] {
        &self.dates
    }
}

/// Even-spacing day offset for position `index` out of `count`.
///
/// A single commit sits on day zero.
pub fn base_day(index: usize, count: usize, span_days: i64) -> i64 {
    if count > 1 {
        span_days * index as i64 / (count as i64 - 1)
    } else {
        0
    }
}

/// Generates `commit_count` timestamps inside `range`, ascending.
///
/// For each position the even-spacing baseline gets a uniform jitter in
/// `[-JITTER_DAYS, JITTER_DAYS]`, clamped to the span, plus a uniform hour in
/// `[FIRST_HOUR, LAST_HOUR]` and minute in `[0, 59]` as wall-clock time on
/// that day, whatever time the range starts at. Timestamps falling before the
/// start or after the end (possible on the first and last day) are pinned to
/// the nearest bound.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use git_backdate::schedule::{DateRange, assign_dates};
/// use rand::{SeedableRng, rngs::StdRng};
///
/// let start = NaiveDate::from_ymd_opt(2025, 8, 26).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let end = NaiveDate::from_ymd_opt(2025, 11, 13).unwrap().and_hms_opt(23, 59, 0).unwrap();
/// let range = DateRange::new(start, end).unwrap();
///
/// let dates = assign_dates(5, &range, &mut StdRng::seed_from_u64(7));
/// assert_eq!(dates.len(), 5);
/// assert!(dates.as_slice().windows(2).all(|w| w[0] <= w[1]));
/// ```
pub fn assign_dates<R: Rng>(
    commit_count: usize,
    range: &DateRange,
    rng: &mut R,
) -> CommitDateAssignment {
    let span = range.span_days();
    let first_midnight = range.start.date().and_hms_opt(0, 0, 0).unwrap_or(range.start);

    let mut dates: Vec<NaiveDateTime> = (0..commit_count)
        .map(|i| {
            let jitter = rng.gen_range(-JITTER_DAYS..=JITTER_DAYS);
            let day = (base_day(i, commit_count, span) + jitter).clamp(0, span);
            let hour = rng.gen_range(FIRST_HOUR..=LAST_HOUR);
            let minute = rng.gen_range(0..=59);

            let t = first_midnight
                + Duration::days(day)
                + Duration::hours(hour)
                + Duration::minutes(minute);
            t.clamp(range.start, range.end)
        })
        .collect();

    // Ordering comes from this sort, not from the day offsets.
    dates.sort();

    CommitDateAssignment { dates }
}
