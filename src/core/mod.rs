//! # Core Module
//!
//! Configuration and shared constants for the goalkeeper bot.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod config;

// Re-export commonly used items
pub use config::Config;

/// Seconds in a day; a fired reminder renews itself this far into the future.
pub const DAY_SECS: i64 = 86_400;
