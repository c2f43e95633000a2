use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    account::{Account, AccountRef},
    schedule::Schedule,
    transaction::Transaction,
};

const CURRENT_SCHEMA_VERSION: u8 = 1;

/// In-memory document holding accounts, regular transactions and schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            accounts: Vec::new(),
            transactions: Vec::new(),
            schedules: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_account(&mut self, account: Account) -> AccountRef {
        let reference = account.reference();
        self.accounts.push(account);
        self.touch();
        reference
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Uuid {
        let id = transaction.id;
        self.transactions.push(transaction);
        self.touch();
        id
    }

    pub fn account(&self, reference: AccountRef) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.id == reference.0)
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn schedule(&self, id: Uuid) -> Option<&Schedule> {
        self.schedules.iter().find(|schedule| schedule.id == id)
    }

    pub fn schedule_mut(&mut self, id: Uuid) -> Option<&mut Schedule> {
        self.schedules.iter_mut().find(|schedule| schedule.id == id)
    }

    /// Inserts or replaces a schedule by id.
    pub fn upsert_schedule(&mut self, schedule: Schedule) {
        match self.schedule_mut(schedule.id) {
            Some(existing) => *existing = schedule,
            None => self.schedules.push(schedule),
        }
        self.touch();
    }

    /// Inserts or replaces a regular transaction by id.
    pub fn upsert_transaction(&mut self, transaction: Transaction) {
        match self.transactions.iter_mut().find(|txn| txn.id == transaction.id) {
            Some(existing) => *existing = transaction,
            None => self.transactions.push(transaction),
        }
        self.touch();
    }

    pub fn remove_schedule(&mut self, id: Uuid) -> Option<Schedule> {
        let idx = self.schedules.iter().position(|schedule| schedule.id == id)?;
        let removed = self.schedules.remove(idx);
        self.touch();
        Some(removed)
    }

    /// Removes an account, moving its splits to `reassign_to` (or leaving them unassigned)
    /// in transactions, schedule templates and schedule exceptions.
    pub fn remove_account(
        &mut self,
        reference: AccountRef,
        reassign_to: Option<AccountRef>,
    ) -> Option<Account> {
        let idx = self
            .accounts
            .iter()
            .position(|account| account.id == reference.0)?;
        let removed = self.accounts.remove(idx);
        for txn in self.transactions.iter_mut() {
            txn.reassign_account(reference, reassign_to);
        }
        for schedule in self.schedules.iter_mut() {
            schedule.reassign_account(reference, reassign_to);
        }
        self.touch();
        Some(removed)
    }

    /// Regular transactions and schedule spawns dated between `from` and `to`, by date.
    pub fn cooked_transactions(&self, from: NaiveDate, to: NaiveDate) -> Vec<Transaction> {
        let mut cooked: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|txn| txn.date >= from && txn.date <= to)
            .cloned()
            .collect();
        for schedule in &self.schedules {
            cooked.extend(schedule.spawns_in_range(from, to));
        }
        // Stable sort keeps regular transactions ahead of spawns on the same day.
        cooked.sort_by_key(|txn| txn.date);
        cooked
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
