use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};
use uuid::Uuid;

use super::LedgerStore;
use crate::{
    errors::Result,
    ledger::{AccountRef, Ledger, Schedule, Transaction},
    utils::persistence::replace_file,
};

/// File-backed [`LedgerStore`]: keeps the ledger in memory and rewrites the JSON file
/// atomically after every commit.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
    ledger: Ledger,
}

impl JsonLedgerStore {
    /// Opens the ledger stored at `path`, or starts a new one named `name` when the file
    /// does not exist yet.
    pub fn open(path: impl Into<PathBuf>, name: &str) -> Result<Self> {
        let path = path.into();
        let ledger = if path.exists() {
            load_ledger_from_path(&path)?
        } else {
            let ledger = Ledger::new(name);
            save_ledger_to_path(&ledger, &path)?;
            ledger
        };
        info!(path = %path.display(), ledger = %ledger.name, "opened ledger store");
        Ok(Self { path, ledger })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Applies `mutator` to the ledger and persists the result.
    pub fn update<F>(&mut self, mutator: F) -> Result<()>
    where
        F: FnOnce(&mut Ledger),
    {
        let mut staged = self.ledger.clone();
        mutator(&mut staged);
        save_ledger_to_path(&staged, &self.path)?;
        self.ledger = staged;
        Ok(())
    }
}

impl LedgerStore for JsonLedgerStore {
    fn commit_schedule(&mut self, schedule: Schedule) -> Result<()> {
        debug!(schedule = %schedule.id, "committing schedule");
        self.update(|ledger| ledger.upsert_schedule(schedule))
    }

    fn commit_entries(&mut self, entries: Vec<Transaction>) -> Result<()> {
        debug!(count = entries.len(), "committing entries");
        self.update(|ledger| {
            for entry in entries {
                ledger.upsert_transaction(entry);
            }
        })
    }

    fn commit_batch(&mut self, schedules: Vec<Schedule>, entries: Vec<Transaction>) -> Result<()> {
        debug!(
            schedules = schedules.len(),
            entries = entries.len(),
            "committing batch"
        );
        self.update(|ledger| {
            for schedule in schedules {
                ledger.upsert_schedule(schedule);
            }
            for entry in entries {
                ledger.upsert_transaction(entry);
            }
        })
    }

    fn list_accounts(&self) -> Result<Vec<AccountRef>> {
        self.ledger.list_accounts()
    }

    fn read_schedules(&self) -> Result<Vec<Schedule>> {
        self.ledger.read_schedules()
    }

    fn remove_schedule(&mut self, id: Uuid) -> Result<Schedule> {
        let mut staged = self.ledger.clone();
        let removed = LedgerStore::remove_schedule(&mut staged, id)?;
        save_ledger_to_path(&staged, &self.path)?;
        self.ledger = staged;
        Ok(removed)
    }
}

/// Writes the ledger to `path` by staging to a temporary file and renaming it.
pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(ledger)?;
    replace_file(path, &json)?;
    Ok(())
}

pub fn load_ledger_from_path(path: &Path) -> Result<Ledger> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

