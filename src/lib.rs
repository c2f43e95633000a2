#![doc(test(attr(deny(warnings))))]

//! moneyguru core: the recurring-schedule engine plus the schedule and mass edition
//! sessions that sit behind the schedule and mass edition panels.

pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use errors::{EngineError, Result};

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    init_with(&config::Config::default());
}

/// Like [`init`], honouring the configured log filter. Only the first call has an effect.
pub fn init_with(config: &config::Config) {
    utils::init_tracing_with(config.log_filter.as_deref());
}
