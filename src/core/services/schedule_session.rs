//! Buffered editing of a single schedule: new/load, field edits, save or cancel.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::SessionState;
use crate::{
    config::Config,
    core::time::Clock,
    errors::{EngineError, Result},
    ledger::{
        time_interval::shift_month, AccountRef, CurrencyCode, RepeatType, Schedule, Split,
        Transaction,
    },
    storage::LedgerStore,
};

/// Field values being edited; nothing here is persisted until `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleBuffer {
    pub start_date: NaiveDate,
    pub repeat_type: RepeatType,
    pub repeat_every: u32,
    pub stop_date: Option<NaiveDate>,
    pub description: String,
    pub payee: String,
    pub checkno: String,
    pub notes: String,
    pub currency: Option<CurrencyCode>,
    pub splits: Vec<Split>,
}

impl ScheduleBuffer {
    fn from_schedule(schedule: &Schedule) -> Self {
        let template = &schedule.template;
        Self {
            start_date: schedule.start_date(),
            repeat_type: schedule.repeat_type(),
            repeat_every: schedule.repeat_every(),
            stop_date: schedule.stop_date(),
            description: template.description.clone(),
            payee: template.payee.clone(),
            checkno: template.checkno.clone(),
            notes: template.notes.clone(),
            currency: template.currency.clone(),
            splits: template.splits.clone(),
        }
    }

    fn template(&self) -> Transaction {
        let mut txn = Transaction::new(self.start_date);
        txn.description = self.description.clone();
        txn.payee = self.payee.clone();
        txn.checkno = self.checkno.clone();
        txn.notes = self.notes.clone();
        txn.currency = self.currency.clone();
        txn.splits = self.splits.clone();
        txn
    }

    fn imbalance(&self) -> Decimal {
        self.splits.iter().map(|split| split.amount).sum()
    }
}

/// Editing session behind the schedule panel, used for both new and existing schedules.
#[derive(Debug, Clone)]
pub struct ScheduleEditingSession {
    buffer: ScheduleBuffer,
    baseline: ScheduleBuffer,
    source: Option<Schedule>,
    state: SessionState,
}

impl ScheduleEditingSession {
    /// Fresh buffer: today, weekly, every 1, no stop date, no splits.
    pub fn new(clock: &dyn Clock) -> Self {
        Self::with_config(clock, &Config::default())
    }

    /// Fresh buffer using the configured repeat defaults and currency.
    pub fn with_config(clock: &dyn Clock, config: &Config) -> Self {
        let buffer = ScheduleBuffer {
            start_date: clock.today(),
            repeat_type: config.default_repeat_type,
            repeat_every: config.default_repeat_every.max(1),
            stop_date: None,
            description: String::new(),
            payee: String::new(),
            checkno: String::new(),
            notes: String::new(),
            currency: Some(config.currency()),
            splits: Vec::new(),
        };
        Self::from_buffer(buffer, None)
    }

    /// New monthly schedule modelled on an existing transaction, starting one month
    /// after it so that the first spawn does not duplicate the transaction itself.
    pub fn new_from_transaction(transaction: &Transaction) -> Self {
        let buffer = ScheduleBuffer {
            start_date: shift_month(transaction.date, 1).unwrap_or(transaction.date),
            repeat_type: RepeatType::Monthly,
            repeat_every: 1,
            stop_date: None,
            description: transaction.description.clone(),
            payee: transaction.payee.clone(),
            checkno: transaction.checkno.clone(),
            notes: transaction.notes.clone(),
            currency: transaction.currency.clone(),
            splits: transaction.splits.clone(),
        };
        Self::from_buffer(buffer, None)
    }

    fn from_buffer(buffer: ScheduleBuffer, source: Option<Schedule>) -> Self {
        Self {
            baseline: buffer.clone(),
            buffer,
            source,
            state: SessionState::Clean,
        }
    }

    /// Loads an existing schedule, discarding any unsaved edits.
    pub fn load(&mut self, schedule: &Schedule) {
        debug!(schedule = %schedule.id, "loading schedule into editing session");
        *self = Self::from_buffer(ScheduleBuffer::from_schedule(schedule), Some(schedule.clone()));
    }

    pub fn buffer(&self) -> &ScheduleBuffer {
        &self.buffer
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == SessionState::Dirty
    }

    /// Schedule being edited, `None` for a new one.
    pub fn source(&self) -> Option<&Schedule> {
        self.source.as_ref()
    }

    fn edit<F>(&mut self, mutator: F)
    where
        F: FnOnce(&mut ScheduleBuffer),
    {
        let before = self.buffer.clone();
        mutator(&mut self.buffer);
        if self.buffer != before {
            self.state = SessionState::Dirty;
        }
    }

    pub fn set_start_date(&mut self, date: NaiveDate) {
        self.edit(|buffer| buffer.start_date = date);
    }

    pub fn set_repeat_type(&mut self, repeat_type: RepeatType) {
        self.edit(|buffer| buffer.repeat_type = repeat_type);
    }

    pub fn set_repeat_every(&mut self, every: u32) {
        self.edit(|buffer| buffer.repeat_every = every);
    }

    pub fn set_stop_date(&mut self, date: Option<NaiveDate>) {
        self.edit(|buffer| buffer.stop_date = date);
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|buffer| buffer.description = value);
    }

    pub fn set_payee(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|buffer| buffer.payee = value);
    }

    pub fn set_checkno(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|buffer| buffer.checkno = value);
    }

    pub fn set_notes(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|buffer| buffer.notes = value);
    }

    pub fn set_currency(&mut self, currency: Option<CurrencyCode>) {
        self.edit(|buffer| buffer.currency = currency);
    }

    pub fn add_split(&mut self, account: Option<AccountRef>, amount: Decimal) {
        self.edit(|buffer| buffer.splits.push(Split::new(account, amount)));
    }

    pub fn update_split(
        &mut self,
        index: usize,
        account: Option<AccountRef>,
        amount: Decimal,
    ) -> Result<()> {
        if index >= self.buffer.splits.len() {
            return Err(EngineError::Validation(format!("no split at index {index}")));
        }
        self.edit(|buffer| {
            let split = &mut buffer.splits[index];
            split.account = account;
            split.amount = amount;
        });
        Ok(())
    }

    pub fn remove_split(&mut self, index: usize) -> Result<Split> {
        if index >= self.buffer.splits.len() {
            return Err(EngineError::Validation(format!("no split at index {index}")));
        }
        let removed = self.buffer.splits.remove(index);
        self.state = SessionState::Dirty;
        Ok(removed)
    }

    /// Labels for the repeat choice, in [`RepeatType::ALL`] order, for the current start date.
    pub fn repeat_options(&self) -> Vec<(RepeatType, String)> {
        RepeatType::ALL
            .iter()
            .map(|repeat_type| (*repeat_type, repeat_type.label(self.buffer.start_date)))
            .collect()
    }

    /// Unit label shown next to the "repeat every" field.
    pub fn repeat_every_description(&self) -> &'static str {
        self.buffer
            .repeat_type
            .unit_label(self.buffer.repeat_every)
    }

    /// At least one split, balanced splits and `repeat_every >= 1`.
    ///
    /// Recurrence parameters are checked by [`Schedule::new`], so `save` can still fail
    /// with `InvalidSchedule` (a stop date before the start date) when this is true.
    pub fn can_save(&self) -> bool {
        self.validation_error().is_none()
    }

    fn validation_error(&self) -> Option<String> {
        if self.buffer.splits.is_empty() {
            return Some("a schedule needs at least one split".into());
        }
        let imbalance = self.buffer.imbalance();
        if !imbalance.is_zero() {
            return Some(format!("splits are unbalanced by {imbalance}"));
        }
        if self.buffer.repeat_every < 1 {
            return Some("repeat every must be at least 1".into());
        }
        None
    }

    /// Validates the buffer and commits it as a new schedule or as a replacement for the
    /// loaded one. Fails without side effects when the buffer cannot be saved.
    pub fn save<S: LedgerStore + ?Sized>(&mut self, store: &mut S) -> Result<Schedule> {
        if let Some(reason) = self.validation_error() {
            return Err(EngineError::Validation(reason));
        }
        let buffer = &self.buffer;
        let mut schedule = Schedule::new(
            buffer.template(),
            buffer.start_date,
            buffer.repeat_type,
            buffer.repeat_every,
            buffer.stop_date,
        )?;
        if let Some(source) = &self.source {
            schedule = schedule.with_id(source.id);
            let recurrence_changed = source.start_date() != buffer.start_date
                || source.repeat_type() != buffer.repeat_type
                || source.repeat_every() != buffer.repeat_every;
            if recurrence_changed {
                debug!(schedule = %source.id, "recurrence changed, dropping exceptions");
            } else {
                schedule = schedule.with_exceptions(source.exceptions().clone());
                // Re-applies the stop date so exceptions past it are pruned.
                schedule.set_stop_date(buffer.stop_date)?;
            }
        }
        store.commit_schedule(schedule.clone())?;
        info!(schedule = %schedule.id, repeat = %schedule.repeat_type(), "schedule saved");
        self.baseline = self.buffer.clone();
        self.source = Some(schedule.clone());
        self.state = SessionState::Clean;
        Ok(schedule)
    }

    /// Discards edits and restores the last loaded (or initial) values.
    pub fn cancel(&mut self) {
        self.buffer = self.baseline.clone();
        self.state = SessionState::Clean;
    }
}
