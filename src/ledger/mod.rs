//! Ledger domain models, recurrence computations and the in-memory ledger.

pub mod account;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod recurring;
pub mod schedule;
pub mod time_interval;
pub mod transaction;

pub use account::{Account, AccountKind, AccountRef};
pub use ledger::Ledger;
pub use recurring::{materialize, occurrences_in_range, spawns_in_range, Occurrences};
pub use schedule::{
    GlobalChange, Removal, Schedule, ScheduleException, ScheduleExceptions, ScheduleScope,
};
pub use time_interval::{RepeatType, TimeInterval};
pub use transaction::{CurrencyCode, SpawnOrigin, Split, Transaction};
