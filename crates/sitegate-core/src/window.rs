//! Daily block window evaluation.
//!
//! A window is a pair of whole hours. Three shapes exist:
//!
//! - **Daytime** (`start < end`, e.g. 9-17): active for `[start, end)`
//! - **Overnight** (`start > end`, e.g. 22-6): active from `start` until
//!   midnight and from midnight until `end`
//! - **Empty** (`start == end`): never active
//!
//! Hours are wall-clock hours of the local timezone, read through a [`Clock`]
//! so callers and tests can pin the current hour.

use chrono::{DateTime, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Check whether `current_hour` falls inside the window `[start_hour, end_hour)`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidHour`] if any argument is outside 0-23.
pub fn is_blocking(start_hour: u8, end_hour: u8, current_hour: u8) -> Result<bool, ValidationError> {
    let window = BlockWindow::new(start_hour, end_hour)?;
    Ok(window.contains(check_hour("current_hour", current_hour.into())?))
}

fn check_hour(field: &'static str, value: i64) -> Result<u8, ValidationError> {
    if (0..24).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ValidationError::InvalidHour { field, value })
    }
}

/// A validated daily window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWindow {
    start_hour: u8,
    end_hour: u8,
}

impl BlockWindow {
    /// Build a window, rejecting hours outside 0-23.
    pub fn new(start_hour: u8, end_hour: u8) -> Result<Self, ValidationError> {
        Self::from_raw(start_hour.into(), end_hour.into())
    }

    /// Build a window from unchecked stored integers.
    pub fn from_raw(start_hour: i64, end_hour: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            start_hour: check_hour("start_hour", start_hour)?,
            end_hour: check_hour("end_hour", end_hour)?,
        })
    }

    pub fn start_hour(&self) -> u8 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u8 {
        self.end_hour
    }

    /// Whether the window crosses midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.start_hour > self.end_hour
    }

    /// Zero-width windows never block.
    pub fn is_empty(&self) -> bool {
        self.start_hour == self.end_hour
    }

    /// Check if an hour (0-23) is inside the window.
    pub fn contains(&self, hour: u8) -> bool {
        if self.is_empty() {
            return false;
        }

        // Overnight window (e.g., 22:00 - 06:00)
        if self.wraps_midnight() {
            return hour >= self.start_hour || hour < self.end_hour;
        }

        // Daytime window (e.g., 09:00 - 17:00)
        hour >= self.start_hour && hour < self.end_hour
    }

    /// Check a point in time against the window using its wall-clock hour.
    pub fn contains_time<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> bool {
        self.contains(time.hour() as u8)
    }
}

impl std::fmt::Display for BlockWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

/// Source of the current wall-clock hour.
pub trait Clock: Send + Sync {
    /// Current hour, 0-23.
    fn current_hour(&self) -> u8;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_hour(&self) -> u8 {
        Local::now().hour() as u8
    }
}

/// A clock stuck at one hour.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u8);

impl Clock for FixedClock {
    fn current_hour(&self) -> u8 {
        self.0
    }
}
