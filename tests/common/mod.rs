#![allow(dead_code)]

use std::str::FromStr;

use chrono::NaiveDate;
use moneyguru_core::ledger::{
    Account, AccountKind, AccountRef, CurrencyCode, Ledger, RepeatType, Schedule, Transaction,
};
use rust_decimal::Decimal;

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn amount(value: &str) -> Decimal {
    Decimal::from_str(value).expect("valid amount")
}

pub struct Fixture {
    pub ledger: Ledger,
    pub checking: AccountRef,
    pub rent: AccountRef,
    pub groceries: AccountRef,
}

/// Ledger with a checking account and two expense accounts.
pub fn sample_ledger() -> Fixture {
    let mut ledger = Ledger::new("Household");
    let checking = ledger.add_account(Account::new("Checking", AccountKind::Asset));
    let rent = ledger.add_account(Account::new("Rent", AccountKind::Expense));
    let groceries = ledger.add_account(Account::new("Groceries", AccountKind::Expense));
    Fixture {
        ledger,
        checking,
        rent,
        groceries,
    }
}

pub fn schedule(
    fixture: &Fixture,
    start: NaiveDate,
    repeat_type: RepeatType,
    every: u32,
    stop: Option<NaiveDate>,
) -> Schedule {
    let template = Transaction::transfer(
        start,
        Some(fixture.checking),
        Some(fixture.rent),
        amount("800.00"),
    )
    .with_description("Rent")
    .with_currency(CurrencyCode::new("USD"));
    Schedule::new(template, start, repeat_type, every, stop).expect("valid schedule")
}

pub fn dates(spawns: &[Transaction]) -> Vec<NaiveDate> {
    spawns.iter().map(|txn| txn.date).collect()
}
