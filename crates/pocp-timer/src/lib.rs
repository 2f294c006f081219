//! Round Timer - elapsed-time display for a mining round
//!
//! Tracks wall-clock time since the round started and publishes render
//! frames at a fixed tick:
//! - `progress` holds the pure math (saturating ratio, severity bands, formatting)
//! - `timer` owns the periodic renderer task and its start/stop control

pub mod progress;
pub mod timer;

pub use progress::{format_elapsed, progress_ratio, Severity, TimerFrame};
pub use timer::{RoundTimer, TimerConfig};

/// Render tick in milliseconds
pub const TICK_MS: u64 = 50;

/// Nominal round length in milliseconds, used only to scale the progress bar
pub const NOMINAL_ROUND_MS: u64 = 10_000;
