//! Pure recurrence computations: occurrence dates and the transactions they produce.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use super::{
    schedule::{Schedule, ScheduleException, ScheduleExceptions},
    time_interval::TimeInterval,
    transaction::{SpawnOrigin, Transaction},
};

/// Lazy iterator over the recurrence dates of a schedule inside a date window.
///
/// Always finite since it is bounded by the window's upper date. Cloning it (or calling
/// [`occurrences_in_range`] again) restarts the sequence.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    schedule: &'a Schedule,
    interval: TimeInterval,
    index: u32,
    lower: NaiveDate,
    upper: NaiveDate,
    done: bool,
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let anchor = self.schedule.start_date();
        while !self.done {
            let period = self.interval.period_start(anchor, self.index);
            if !matches!(period, Some(start) if start <= self.upper) {
                self.done = true;
                break;
            }
            let candidate = self.interval.nth_date(anchor, self.index);
            match self.index.checked_add(1) {
                Some(next) => self.index = next,
                None => self.done = true,
            }
            match candidate {
                Some(date) if date > self.upper => self.done = true,
                Some(date) if date >= self.lower => return Some(date),
                _ => continue,
            }
        }
        None
    }
}

/// Recurrence dates `d` of `schedule` with `max(start, from) <= d <= min(stop, to)`.
pub fn occurrences_in_range(schedule: &Schedule, from: NaiveDate, to: NaiveDate) -> Occurrences<'_> {
    let interval = schedule.interval();
    let anchor = schedule.start_date();
    let lower = from.max(anchor);
    let upper = schedule.stop_date().map_or(to, |stop| stop.min(to));
    Occurrences {
        schedule,
        interval,
        index: interval.index_floor(anchor, lower),
        lower,
        upper,
        done: lower > upper,
    }
}

/// Stamps the schedule template with `date`, honouring `exceptions`.
///
/// Returns `None` when the occurrence is skipped. The date is not checked against the
/// recurrence; callers pass dates obtained from [`occurrences_in_range`].
pub fn materialize(
    schedule: &Schedule,
    date: NaiveDate,
    exceptions: &ScheduleExceptions,
) -> Option<Transaction> {
    let origin = SpawnOrigin {
        schedule_id: schedule.id,
        recurrence_date: date,
    };
    match exceptions.get(date) {
        Some(ScheduleException::Skipped) => return None,
        Some(ScheduleException::Override(txn)) => {
            let mut txn = txn.clone();
            txn.spawn = Some(origin);
            return Some(txn);
        }
        None => {}
    }
    let (template, delta) = match exceptions.global_change_for(date) {
        Some(change) => (&change.template, change.date_delta_days),
        None => (&schedule.template, 0),
    };
    let mut txn = template.clone();
    txn.id = Uuid::new_v4();
    txn.date = date
        .checked_add_signed(Duration::days(delta))
        .unwrap_or(date);
    txn.spawn = Some(origin);
    Some(txn)
}

/// Every spawn whose effective date lies in `[from, to]`, sorted by date.
///
/// Overrides and global changes can move a spawn away from its recurrence date, so the
/// scan window is widened by the largest shift in either direction.
pub fn spawns_in_range(schedule: &Schedule, from: NaiveDate, to: NaiveDate) -> Vec<Transaction> {
    if from > to {
        return Vec::new();
    }
    let exceptions = schedule.exceptions();
    let (forward, backward) = exceptions.date_shift_bounds();
    let scan_from = from
        .checked_sub_signed(Duration::days(forward))
        .unwrap_or(NaiveDate::MIN);
    let scan_to = to
        .checked_add_signed(Duration::days(backward))
        .unwrap_or(NaiveDate::MAX);
    let mut spawns: Vec<Transaction> = occurrences_in_range(schedule, scan_from, scan_to)
        .filter_map(|date| materialize(schedule, date, exceptions))
        .filter(|txn| txn.date >= from && txn.date <= to)
        .collect();
    spawns.sort_by_key(|txn| txn.date);
    spawns
}
