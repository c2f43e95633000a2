
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::ledger::{Account, AccountKind, AccountRef, Ledger};

pub(super) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub(super) fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

pub(super) fn ledger_with_accounts() -> (Ledger, AccountRef, AccountRef, AccountRef) {
    let mut ledger = Ledger::new("Test");
    let checking = ledger.add_account(Account::new("Checking", AccountKind::Asset));
    let rent = ledger.add_account(Account::new("Rent", AccountKind::Expense));
    let salary = ledger.add_account(Account::new("Salary", AccountKind::Income));
    (ledger, checking, rent, salary)
}
