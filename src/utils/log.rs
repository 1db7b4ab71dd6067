//! Diagnostics for the generator.
//!
//! The emitted Brainfuck program owns stdout, so every diagnostic goes to
//! stderr. Generator runs are one-shot and short, so lines are stamped
//! with the time elapsed since the first message instead of wall-clock
//! dates.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Message severity, in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

/// Minimum severity that gets written.
static THRESHOLD: AtomicU8 = AtomicU8::new(0);

/// Start of the run, fixed when the first message arrives.
static STARTED: OnceLock<Instant> = OnceLock::new();

/// Drops subsequent messages below `level`.
pub fn set_threshold(level: Level) {
    THRESHOLD.store(level as u8, Ordering::Relaxed);
}

/// Returns true if `level` clears the current threshold.
fn passes(level: Level) -> bool {
    level as u8 >= THRESHOLD.load(Ordering::Relaxed)
}

/// Writes one stderr line if `level` clears the threshold.
pub fn write(level: Level, message: &str) {
    if !passes(level) {
        return;
    }
    let elapsed = STARTED.get_or_init(Instant::now).elapsed();
    eprintln!(
        "[{:8.3}s {:5}] {}",
        elapsed.as_secs_f64(),
        level.tag(),
        message
    );
}

/// Logs an info-level message.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::utils::log::write($crate::utils::log::Level::Info, &format!($($arg)*))
    };
}

/// Logs a warning-level message.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::utils::log::write($crate::utils::log::Level::Warn, &format!($($arg)*))
    };
}

/// Logs an error-level message.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::utils::log::write($crate::utils::log::Level::Error, &format!($($arg)*))
    };
}
