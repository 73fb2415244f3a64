// Library surface for the binary, headless integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod palette;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod stroop;
pub mod trial_generator;
pub mod ui;

pub use error::{Error, Result};

/// How often the loop wakes up without input, in milliseconds
pub const TICK_RATE_MS: u64 = 25;
