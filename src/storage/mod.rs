pub mod json_backend;

use uuid::Uuid;

use crate::{
    errors::{EngineError, Result},
    ledger::{AccountRef, Ledger, Schedule, Transaction},
};

/// Persistence boundary the editing sessions commit through.
///
/// The engine never touches storage directly; every mutation of persisted state goes
/// through one of the `commit_*` calls.
pub trait LedgerStore {
    /// Inserts or replaces a schedule by id.
    fn commit_schedule(&mut self, schedule: Schedule) -> Result<()>;
    /// Inserts or replaces regular transactions by id.
    fn commit_entries(&mut self, entries: Vec<Transaction>) -> Result<()>;
    /// Commits schedules and regular transactions together: either all of them are
    /// stored or none are.
    fn commit_batch(&mut self, schedules: Vec<Schedule>, entries: Vec<Transaction>) -> Result<()>;
    fn list_accounts(&self) -> Result<Vec<AccountRef>>;
    fn read_schedules(&self) -> Result<Vec<Schedule>>;
    fn remove_schedule(&mut self, id: Uuid) -> Result<Schedule>;

    fn read_schedule(&self, id: Uuid) -> Result<Schedule> {
        self.read_schedules()?
            .into_iter()
            .find(|schedule| schedule.id == id)
            .ok_or(EngineError::ScheduleNotFound(id))
    }
}

impl LedgerStore for Ledger {
    fn commit_schedule(&mut self, schedule: Schedule) -> Result<()> {
        self.upsert_schedule(schedule);
        Ok(())
    }

    fn commit_entries(&mut self, entries: Vec<Transaction>) -> Result<()> {
        for entry in entries {
            self.upsert_transaction(entry);
        }
        Ok(())
    }

    fn commit_batch(&mut self, schedules: Vec<Schedule>, entries: Vec<Transaction>) -> Result<()> {
        for schedule in schedules {
            self.upsert_schedule(schedule);
        }
        for entry in entries {
            self.upsert_transaction(entry);
        }
        Ok(())
    }

    fn list_accounts(&self) -> Result<Vec<AccountRef>> {
        Ok(self.accounts.iter().map(|account| account.reference()).collect())
    }

    fn read_schedules(&self) -> Result<Vec<Schedule>> {
        Ok(self.schedules.clone())
    }

    fn remove_schedule(&mut self, id: Uuid) -> Result<Schedule> {
        Ledger::remove_schedule(self, id).ok_or(EngineError::ScheduleNotFound(id))
    }
}

pub use json_backend::{load_ledger_from_path, save_ledger_to_path, JsonLedgerStore};
