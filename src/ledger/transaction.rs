use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountRef;

/// ISO 4217 style currency code, stored upper-cased.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank code never resolves a currency.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

/// One leg of a double-entry transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Split {
    pub account: Option<AccountRef>,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memo: String,
}

impl Split {
    pub fn new(account: Option<AccountRef>, amount: Decimal) -> Self {
        Self {
            account,
            amount,
            memo: String::new(),
        }
    }
}

/// Links a spawned transaction back to the schedule occurrence it came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpawnOrigin {
    pub schedule_id: Uuid,
    pub recurrence_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub payee: String,
    #[serde(default)]
    pub checkno: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    #[serde(default)]
    pub splits: Vec<Split>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<SpawnOrigin>,
}

impl Transaction {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            description: String::new(),
            payee: String::new(),
            checkno: String::new(),
            notes: String::new(),
            currency: None,
            splits: Vec::new(),
            spawn: None,
        }
    }

    /// Builds a two-split transaction moving `amount` from `from` to `to`.
    pub fn transfer(
        date: NaiveDate,
        from: Option<AccountRef>,
        to: Option<AccountRef>,
        amount: Decimal,
    ) -> Self {
        let mut txn = Self::new(date);
        txn.splits = vec![Split::new(from, -amount), Split::new(to, amount)];
        txn
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Sum of all split amounts; zero for a balanced transaction.
    pub fn imbalance(&self) -> Decimal {
        self.splits.iter().map(|split| split.amount).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }

    /// Transaction amount as shown for a simple transfer: the sum of the positive legs.
    pub fn amount(&self) -> Decimal {
        self.splits
            .iter()
            .map(|split| split.amount)
            .filter(|amount| amount.is_sign_positive() && !amount.is_zero())
            .sum()
    }

    pub fn is_spawn(&self) -> bool {
        self.spawn.is_some()
    }

    /// Indexes of the "from" and "to" main splits.
    ///
    /// "from" is the first negative split (or the first split), "to" the first positive
    /// split other than "from" (or the next available split).
    pub fn main_split_indexes(&self) -> (Option<usize>, Option<usize>) {
        let from = self
            .splits
            .iter()
            .position(|split| split.amount.is_sign_negative() && !split.amount.is_zero())
            .or(if self.splits.is_empty() { None } else { Some(0) });
        let to = self
            .splits
            .iter()
            .enumerate()
            .position(|(idx, split)| {
                Some(idx) != from && split.amount.is_sign_positive() && !split.amount.is_zero()
            })
            .or_else(|| (0..self.splits.len()).find(|idx| Some(*idx) != from));
        (from, to)
    }

    pub fn from_account(&self) -> Option<AccountRef> {
        self.main_split_indexes()
            .0
            .and_then(|idx| self.splits[idx].account)
    }

    pub fn to_account(&self) -> Option<AccountRef> {
        self.main_split_indexes()
            .1
            .and_then(|idx| self.splits[idx].account)
    }

    /// Guarantees that both main splits exist, appending unassigned legs as needed.
    pub fn ensure_main_splits(&mut self) -> (usize, usize) {
        while self.splits.len() < 2 {
            self.splits.push(Split::new(None, Decimal::ZERO));
        }
        let (from, to) = self.main_split_indexes();
        (from.unwrap_or(0), to.unwrap_or(1))
    }

    /// Replaces `account` in every split, returning whether anything changed.
    pub fn reassign_account(&mut self, account: AccountRef, replacement: Option<AccountRef>) -> bool {
        let mut changed = false;
        for split in self.splits.iter_mut() {
            if split.account == Some(account) {
                split.account = replacement;
                changed = true;
            }
        }
        changed
    }
}
