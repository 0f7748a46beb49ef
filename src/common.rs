//! Modules shared across the analyzer: errors, settings file, timing.
pub mod box_error;
pub mod config;
pub mod stream_time_stat;

use std::time::{SystemTime, UNIX_EPOCH};

pub fn get_micro_time() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_micros()
}
