//! Helpers for testing the space drain.

pub mod fixtures;

use log::LevelFilter;

/// Initialize logging for tests, may be called multiple times.
pub fn init() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(LevelFilter::Debug)
        .try_init();
}
