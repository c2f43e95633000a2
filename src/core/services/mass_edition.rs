//! Batch overwrite of selected fields across several entries.

use std::collections::{btree_map::Entry, BTreeMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::SessionState;
use crate::{
    errors::{EngineError, Result},
    ledger::{AccountRef, CurrencyCode, Schedule, ScheduleScope, Transaction},
    storage::LedgerStore,
};

/// A field of the mass edition panel: only enabled fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOverride<T> {
    pub enabled: bool,
    pub value: T,
}

impl<T> FieldOverride<T> {
    pub fn disabled(value: T) -> Self {
        Self {
            enabled: false,
            value,
        }
    }

    pub fn set(value: T) -> Self {
        Self {
            enabled: true,
            value,
        }
    }

    pub fn active(&self) -> Option<&T> {
        self.enabled.then_some(&self.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MassEditionSpec {
    pub date: FieldOverride<NaiveDate>,
    pub description: FieldOverride<String>,
    pub payee: FieldOverride<String>,
    pub checkno: FieldOverride<String>,
    pub from_account: FieldOverride<Option<AccountRef>>,
    pub to_account: FieldOverride<Option<AccountRef>>,
    pub amount: FieldOverride<Decimal>,
    pub currency: FieldOverride<CurrencyCode>,
}

impl MassEditionSpec {
    pub fn is_noop(&self) -> bool {
        !(self.date.enabled
            || self.description.enabled
            || self.payee.enabled
            || self.checkno.enabled
            || self.from_account.enabled
            || self.to_account.enabled
            || self.amount.enabled
            || self.currency.enabled)
    }
}

/// Applies every enabled field of `spec` to `entries`.
///
/// Entries are staged first; nothing is written back unless every staged entry passes
/// validation. Returns the number of entries that actually changed.
pub fn apply(spec: &MassEditionSpec, entries: &mut [Transaction]) -> Result<usize> {
    if spec.is_noop() {
        return Ok(0);
    }
    let mut staged = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let mut draft = entry.clone();
        stage_entry(spec, &mut draft)?;
        if draft != *entry {
            validate_entry(spec, index, &draft)?;
        }
        staged.push(draft);
    }

    let mut changed = 0;
    for (entry, draft) in entries.iter_mut().zip(staged) {
        if *entry != draft {
            *entry = draft;
            changed += 1;
        }
    }
    debug!(changed, total = entries.len(), "mass edition applied");
    Ok(changed)
}

fn assign<T: PartialEq + Clone>(field: &mut T, value: &T) -> bool {
    if field == value {
        return false;
    }
    *field = value.clone();
    true
}

fn stage_entry(spec: &MassEditionSpec, draft: &mut Transaction) -> Result<()> {
    if let Some(date) = spec.date.active() {
        assign(&mut draft.date, date);
    }
    if let Some(description) = spec.description.active() {
        assign(&mut draft.description, description);
    }
    if let Some(payee) = spec.payee.active() {
        assign(&mut draft.payee, payee);
    }
    if let Some(checkno) = spec.checkno.active() {
        assign(&mut draft.checkno, checkno);
    }
    if let Some(currency) = spec.currency.active() {
        if !currency.is_blank() {
            assign(&mut draft.currency, &Some(currency.clone()));
        }
    }
    if spec.amount.enabled {
        let resolvable = draft
            .currency
            .as_ref()
            .is_some_and(|currency| !currency.is_blank());
        if !resolvable {
            return Err(EngineError::CurrencyRequired { entry: draft.id });
        }
    }
    stage_main_splits(spec, draft);
    Ok(())
}

/// Writes the amount and account overrides to the entry's from/to legs.
///
/// The legs are resolved once, before anything is written, and every override targets
/// the same pair. The amount is a magnitude: the from leg gets `-amount` and the to leg
/// `+amount`. When a write happens the from leg is moved ahead of the to leg, so the same
/// legs are found again even when both amounts are zero.
fn stage_main_splits(spec: &MassEditionSpec, draft: &mut Transaction) {
    let amount = spec.amount.active().map(|amount| amount.abs());
    let from_account = spec.from_account.active();
    let to_account = spec.to_account.active();
    if amount.is_none() && from_account.is_none() && to_account.is_none() {
        return;
    }

    let mut legs = draft.clone();
    let (from, to) = legs.ensure_main_splits();
    let mut touched = false;
    if let Some(amount) = amount {
        touched |= assign(&mut legs.splits[from].amount, &(Decimal::ZERO - amount));
        touched |= assign(&mut legs.splits[to].amount, &amount);
    }
    if let Some(account) = from_account {
        touched |= assign(&mut legs.splits[from].account, account);
    }
    if let Some(account) = to_account {
        touched |= assign(&mut legs.splits[to].account, account);
    }
    if touched {
        if from > to {
            legs.splits.swap(from, to);
        }
        draft.splits = legs.splits;
    }
}

fn validate_entry(spec: &MassEditionSpec, index: usize, draft: &Transaction) -> Result<()> {
    let imbalance = draft.imbalance();
    if !imbalance.is_zero() {
        return Err(EngineError::BatchValidation {
            index,
            entry: draft.id,
            reason: format!("splits are unbalanced by {imbalance}"),
        });
    }
    let touches_accounts = spec.from_account.enabled || spec.to_account.enabled;
    if touches_accounts {
        if let Some(from) = draft.from_account() {
            if draft.to_account() == Some(from) {
                return Err(EngineError::BatchValidation {
                    index,
                    entry: draft.id,
                    reason: format!("from and to accounts are both {from}"),
                });
            }
        }
    }
    Ok(())
}

/// Value shared by every entry, if any.
fn shared<T, F>(entries: &[Transaction], field: F) -> Option<T>
where
    T: PartialEq,
    F: Fn(&Transaction) -> T,
{
    let mut values = entries.iter().map(field);
    let first = values.next()?;
    values.all(|value| value == first).then_some(first)
}

/// Mass edition panel lifecycle over a fixed selection of entries.
#[derive(Debug, Clone)]
pub struct MassEditionSession {
    entries: Vec<Transaction>,
    spec: MassEditionSpec,
    baseline: MassEditionSpec,
    state: SessionState,
}

impl MassEditionSession {
    /// Opens a session on `entries`; each field starts disabled and holds the value the
    /// entries have in common (or a blank value when they differ).
    pub fn load(entries: Vec<Transaction>) -> Result<Self> {
        let first = entries
            .first()
            .ok_or_else(|| EngineError::Validation("mass edition needs at least one entry".into()))?;
        let first_date = first.date;
        let spec = MassEditionSpec {
            date: FieldOverride::disabled(
                shared(&entries, |txn| txn.date).unwrap_or(first_date),
            ),
            description: FieldOverride::disabled(
                shared(&entries, |txn| txn.description.clone()).unwrap_or_default(),
            ),
            payee: FieldOverride::disabled(
                shared(&entries, |txn| txn.payee.clone()).unwrap_or_default(),
            ),
            checkno: FieldOverride::disabled(
                shared(&entries, |txn| txn.checkno.clone()).unwrap_or_default(),
            ),
            from_account: FieldOverride::disabled(
                shared(&entries, Transaction::from_account).flatten(),
            ),
            to_account: FieldOverride::disabled(shared(&entries, Transaction::to_account).flatten()),
            amount: FieldOverride::disabled(
                shared(&entries, Transaction::amount).unwrap_or(Decimal::ZERO),
            ),
            currency: FieldOverride::disabled(
                shared(&entries, |txn| txn.currency.clone())
                    .flatten()
                    .unwrap_or_else(|| CurrencyCode(String::new())),
            ),
        };
        debug!(count = entries.len(), "mass edition session loaded");
        Ok(Self {
            entries,
            baseline: spec.clone(),
            spec,
            state: SessionState::Clean,
        })
    }

    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn spec(&self) -> &MassEditionSpec {
        &self.spec
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn edit<F>(&mut self, mutator: F)
    where
        F: FnOnce(&mut MassEditionSpec),
    {
        let before = self.spec.clone();
        mutator(&mut self.spec);
        if self.spec != before {
            self.state = SessionState::Dirty;
        }
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.edit(|spec| spec.date = FieldOverride::set(date));
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|spec| spec.description = FieldOverride::set(value));
    }

    pub fn set_payee(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|spec| spec.payee = FieldOverride::set(value));
    }

    pub fn set_checkno(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|spec| spec.checkno = FieldOverride::set(value));
    }

    pub fn set_from_account(&mut self, account: Option<AccountRef>) {
        self.edit(|spec| spec.from_account = FieldOverride::set(account));
    }

    pub fn set_to_account(&mut self, account: Option<AccountRef>) {
        self.edit(|spec| spec.to_account = FieldOverride::set(account));
    }

    pub fn set_amount(&mut self, amount: Decimal) {
        self.edit(|spec| spec.amount = FieldOverride::set(amount));
    }

    pub fn set_currency(&mut self, currency: CurrencyCode) {
        self.edit(|spec| spec.currency = FieldOverride::set(currency));
    }

    /// Applies the enabled fields and commits the changed entries.
    ///
    /// Schedule spawns are recorded as local exceptions on their schedule; everything
    /// else is committed as regular entries. Both go to the store in one batch, so a
    /// failed commit leaves the store and the session as they were. Returns the number
    /// of changed entries.
    pub fn save<S: LedgerStore + ?Sized>(&mut self, store: &mut S) -> Result<usize> {
        let mut staged = self.entries.clone();
        let changed = apply(&self.spec, &mut staged)?;

        let mut regular = Vec::new();
        let mut schedules: BTreeMap<Uuid, Schedule> = BTreeMap::new();
        for (before, after) in self.entries.iter().zip(&staged) {
            if before == after {
                continue;
            }
            match after.spawn {
                Some(origin) => {
                    let schedule = match schedules.entry(origin.schedule_id) {
                        Entry::Occupied(slot) => slot.into_mut(),
                        Entry::Vacant(slot) => slot.insert(store.read_schedule(origin.schedule_id)?),
                    };
                    schedule.change_occurrence(
                        origin.recurrence_date,
                        after.clone(),
                        ScheduleScope::Local,
                    )?;
                }
                None => regular.push(after.clone()),
            }
        }

        let spawn_count = changed - regular.len();
        if changed > 0 {
            store.commit_batch(schedules.into_values().collect(), regular)?;
        }
        if changed == 0 {
            warn!("mass edition saved without changing any entry");
        } else {
            info!(changed, spawns = spawn_count, "mass edition saved");
        }

        self.entries = staged;
        self.baseline = self.spec.clone();
        self.state = SessionState::Clean;
        Ok(changed)
    }

    /// Discards field edits and restores the values loaded with the entries.
    pub fn cancel(&mut self) {
        self.spec = self.baseline.clone();
        self.state = SessionState::Clean;
    }
}
