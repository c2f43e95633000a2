use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    account::AccountRef,
    recurring::{self, Occurrences},
    time_interval::{RepeatType, TimeInterval},
    transaction::{SpawnOrigin, Transaction},
};
use crate::errors::{EngineError, Result};

/// Per-occurrence deviation from the schedule template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScheduleException {
    Skipped,
    Override(Transaction),
}

/// Change applied to an occurrence and every occurrence after it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalChange {
    pub template: Transaction,
    pub date_delta_days: i64,
}

/// Sparse maps of occurrence overrides, keyed by recurrence date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleExceptions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    local: BTreeMap<NaiveDate, ScheduleException>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    global: BTreeMap<NaiveDate, GlobalChange>,
}

impl ScheduleExceptions {
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.global.is_empty()
    }

    pub fn get(&self, recurrence_date: NaiveDate) -> Option<&ScheduleException> {
        self.local.get(&recurrence_date)
    }

    pub fn skip(&mut self, recurrence_date: NaiveDate) {
        self.local
            .insert(recurrence_date, ScheduleException::Skipped);
    }

    pub fn override_with(&mut self, recurrence_date: NaiveDate, transaction: Transaction) {
        self.local
            .insert(recurrence_date, ScheduleException::Override(transaction));
    }

    pub fn remove(&mut self, recurrence_date: NaiveDate) -> Option<ScheduleException> {
        self.local.remove(&recurrence_date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &ScheduleException)> {
        self.local.iter()
    }

    /// Latest global change that applies to `recurrence_date`.
    pub fn global_change_for(&self, recurrence_date: NaiveDate) -> Option<&GlobalChange> {
        self.global
            .range(..=recurrence_date)
            .next_back()
            .map(|(_, change)| change)
    }

    pub fn global_changes(&self) -> impl Iterator<Item = (&NaiveDate, &GlobalChange)> {
        self.global.iter()
    }

    /// Largest forward and backward shifts, in days, between a recurrence date and the
    /// date its spawn ends up on.
    pub(crate) fn date_shift_bounds(&self) -> (i64, i64) {
        let overrides = self.local.iter().filter_map(|(key, exception)| match exception {
            ScheduleException::Override(txn) => Some((txn.date - *key).num_days()),
            ScheduleException::Skipped => None,
        });
        let globals = self.global.values().map(|change| change.date_delta_days);
        overrides
            .chain(globals)
            .fold((0, 0), |(forward, backward), delta| {
                (forward.max(delta), backward.max(-delta))
            })
    }

    fn clear_from(&mut self, recurrence_date: NaiveDate, keep_skips: bool) {
        self.global.retain(|date, _| *date < recurrence_date);
        self.local.retain(|date, exception| {
            *date < recurrence_date || (keep_skips && matches!(exception, ScheduleException::Skipped))
        });
    }

    fn reassign_account(&mut self, account: AccountRef, replacement: Option<AccountRef>) -> bool {
        let mut changed = false;
        for exception in self.local.values_mut() {
            if let ScheduleException::Override(txn) = exception {
                changed |= txn.reassign_account(account, replacement);
            }
        }
        for change in self.global.values_mut() {
            changed |= change.template.reassign_account(account, replacement);
        }
        changed
    }
}

/// Whether an occurrence edit targets only that occurrence or it and every later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleScope {
    Local,
    Global,
}

/// Outcome of deleting an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Only the occurrence was suppressed.
    Skipped,
    /// The schedule now stops the day before the deleted occurrence.
    Truncated,
    /// No occurrence would remain; the caller should drop the schedule.
    Exhausted,
}

/// A recurring transaction template.
///
/// Recurrence parameters are only reachable through constructors and validated setters,
/// so every `Schedule` in memory satisfies `repeat_every >= 1` and `stop_date >= start_date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "ScheduleRecord", into = "ScheduleRecord")]
pub struct Schedule {
    pub id: Uuid,
    pub template: Transaction,
    start_date: NaiveDate,
    interval: TimeInterval,
    stop_date: Option<NaiveDate>,
    exceptions: ScheduleExceptions,
}

/// Serialized form of [`Schedule`]; validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduleRecord {
    id: Uuid,
    template: Transaction,
    start_date: NaiveDate,
    repeat_type: RepeatType,
    repeat_every: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stop_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "ScheduleExceptions::is_empty")]
    exceptions: ScheduleExceptions,
}

impl TryFrom<ScheduleRecord> for Schedule {
    type Error = EngineError;

    fn try_from(record: ScheduleRecord) -> Result<Self> {
        let mut schedule = Schedule::new(
            record.template,
            record.start_date,
            record.repeat_type,
            record.repeat_every,
            record.stop_date,
        )?;
        schedule.id = record.id;
        schedule.exceptions = record.exceptions;
        Ok(schedule)
    }
}

impl From<Schedule> for ScheduleRecord {
    fn from(schedule: Schedule) -> Self {
        Self {
            id: schedule.id,
            template: schedule.template,
            start_date: schedule.start_date,
            repeat_type: schedule.interval.unit,
            repeat_every: schedule.interval.every,
            stop_date: schedule.stop_date,
            exceptions: schedule.exceptions,
        }
    }
}

impl Schedule {
    /// Builds a schedule, rejecting malformed recurrence parameters.
    pub fn new(
        template: Transaction,
        start_date: NaiveDate,
        repeat_type: RepeatType,
        repeat_every: u32,
        stop_date: Option<NaiveDate>,
    ) -> Result<Self> {
        validate_recurrence(start_date, repeat_every, stop_date)?;
        let mut template = template;
        template.date = start_date;
        template.spawn = None;
        Ok(Self {
            id: Uuid::new_v4(),
            template,
            start_date,
            interval: TimeInterval::new(repeat_type, repeat_every),
            stop_date,
            exceptions: ScheduleExceptions::default(),
        })
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_exceptions(mut self, exceptions: ScheduleExceptions) -> Self {
        self.exceptions = exceptions;
        self
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn repeat_type(&self) -> RepeatType {
        self.interval.unit
    }

    pub fn repeat_every(&self) -> u32 {
        self.interval.every
    }

    pub fn stop_date(&self) -> Option<NaiveDate> {
        self.stop_date
    }

    pub fn interval(&self) -> TimeInterval {
        self.interval
    }

    pub fn exceptions(&self) -> &ScheduleExceptions {
        &self.exceptions
    }

    pub fn set_stop_date(&mut self, stop_date: Option<NaiveDate>) -> Result<()> {
        validate_recurrence(self.start_date, self.interval.every, stop_date)?;
        self.stop_date = stop_date;
        if let Some(stop) = stop_date {
            if let Some(after) = stop.succ_opt() {
                self.exceptions.clear_from(after, false);
            }
        }
        Ok(())
    }

    /// Drops every local exception and global change.
    pub fn reset_exceptions(&mut self) {
        self.exceptions = ScheduleExceptions::default();
    }

    /// Recurrence dates between `from` and `to`, both inclusive.
    pub fn occurrences_in_range(&self, from: NaiveDate, to: NaiveDate) -> Occurrences<'_> {
        recurring::occurrences_in_range(self, from, to)
    }

    pub fn is_occurrence(&self, date: NaiveDate) -> bool {
        self.occurrences_in_range(date, date).next().is_some()
    }

    /// Transaction produced on `recurrence_date`, with this schedule's exceptions applied.
    pub fn materialize(&self, recurrence_date: NaiveDate) -> Option<Transaction> {
        recurring::materialize(self, recurrence_date, &self.exceptions)
    }

    /// Spawns whose effective date falls between `from` and `to`.
    pub fn spawns_in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<Transaction> {
        recurring::spawns_in_range(self, from, to)
    }

    /// Records an edit of the occurrence on `recurrence_date`.
    pub fn change_occurrence(
        &mut self,
        recurrence_date: NaiveDate,
        transaction: Transaction,
        scope: ScheduleScope,
    ) -> Result<()> {
        self.ensure_occurrence(recurrence_date)?;
        let mut transaction = transaction;
        match scope {
            ScheduleScope::Local => {
                transaction.spawn = Some(SpawnOrigin {
                    schedule_id: self.id,
                    recurrence_date,
                });
                self.exceptions.override_with(recurrence_date, transaction);
            }
            ScheduleScope::Global if recurrence_date == self.start_date => {
                if transaction.date != self.start_date {
                    validate_recurrence(transaction.date, self.interval.every, self.stop_date)?;
                    self.start_date = transaction.date;
                    self.reset_exceptions();
                } else {
                    self.exceptions.clear_from(recurrence_date, true);
                }
                transaction.spawn = None;
                self.template = transaction;
            }
            ScheduleScope::Global => {
                let date_delta_days = (transaction.date - recurrence_date).num_days();
                transaction.spawn = None;
                self.exceptions.clear_from(recurrence_date, true);
                self.exceptions.global.insert(
                    recurrence_date,
                    GlobalChange {
                        template: transaction,
                        date_delta_days,
                    },
                );
            }
        }
        Ok(())
    }

    /// Deletes the occurrence on `recurrence_date`.
    pub fn delete_occurrence(
        &mut self,
        recurrence_date: NaiveDate,
        scope: ScheduleScope,
    ) -> Result<Removal> {
        self.ensure_occurrence(recurrence_date)?;
        match scope {
            ScheduleScope::Local => {
                self.exceptions.skip(recurrence_date);
                Ok(Removal::Skipped)
            }
            ScheduleScope::Global => {
                if recurrence_date <= self.start_date {
                    return Ok(Removal::Exhausted);
                }
                let stop = recurrence_date - Duration::days(1);
                self.set_stop_date(Some(stop))?;
                Ok(Removal::Truncated)
            }
        }
    }

    /// Turns one spawn into a standalone transaction and suppresses the occurrence.
    pub fn detach(&mut self, recurrence_date: NaiveDate) -> Option<Transaction> {
        if !self.is_occurrence(recurrence_date) {
            return None;
        }
        let mut txn = self.materialize(recurrence_date)?;
        self.exceptions.skip(recurrence_date);
        txn.id = Uuid::new_v4();
        txn.spawn = None;
        Some(txn)
    }

    /// Replaces `account` in the template and every exception.
    pub fn reassign_account(&mut self, account: AccountRef, replacement: Option<AccountRef>) -> bool {
        let template_changed = self.template.reassign_account(account, replacement);
        let exceptions_changed = self.exceptions.reassign_account(account, replacement);
        template_changed || exceptions_changed
    }

    fn ensure_occurrence(&self, recurrence_date: NaiveDate) -> Result<()> {
        if self.is_occurrence(recurrence_date) {
            Ok(())
        } else {
            Err(EngineError::Validation(format!(
                "{} is not an occurrence of schedule {}",
                recurrence_date, self.id
            )))
        }
    }
}

fn validate_recurrence(
    start_date: NaiveDate,
    repeat_every: u32,
    stop_date: Option<NaiveDate>,
) -> Result<()> {
    if repeat_every < 1 {
        return Err(EngineError::InvalidSchedule(
            "repeat_every must be at least 1".into(),
        ));
    }
    if let Some(stop) = stop_date {
        if stop < start_date {
            return Err(EngineError::InvalidSchedule(format!(
                "stop date {} is earlier than start date {}",
                stop, start_date
            )));
        }
    }
    Ok(())
}
