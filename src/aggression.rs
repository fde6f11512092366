use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How probes for one host are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// One probe at a time in ascending port order, with a pause between probes.
    Sequential,
    /// A bounded pool of concurrent probes, no pause, no ordering guarantee.
    Pool,
}

/// Discrete 0-4 knob trading politeness for speed.
///
/// | level | mode       | concurrency | delay  |
/// |-------|------------|-------------|--------|
/// | 0     | sequential | 1           | 500ms  |
/// | 1     | sequential | 1           | 200ms  |
/// | 2     | sequential | 1           | 100ms  |
/// | 3     | pool       | 10          | 0      |
/// | 4     | pool       | 50          | 0      |
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct AggressionLevel(u8);

impl AggressionLevel {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 4;
    pub const DEFAULT: u8 = 1;

    /// Clamp any integer into the valid level range.
    pub fn clamped(level: i64) -> Self {
        Self(level.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    /// Numeric input is clamped; anything else yields `None`.
    pub fn try_from_input(input: &str) -> Option<Self> {
        input.trim().parse::<i64>().ok().map(Self::clamped)
    }

    /// Like [`try_from_input`](Self::try_from_input) but falls back to level 1.
    pub fn from_input(input: &str) -> Self {
        Self::try_from_input(input).unwrap_or_default()
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn mode(self) -> ScheduleMode {
        if self.0 >= 3 {
            ScheduleMode::Pool
        } else {
            ScheduleMode::Sequential
        }
    }

    /// Maximum number of probes in flight at once.
    pub fn concurrency(self) -> usize {
        match self.0 {
            0..=2 => 1,
            3 => 10,
            _ => 50,
        }
    }

    /// Pause inserted between sequential probes.
    pub fn delay(self) -> Duration {
        let ms = match self.0 {
            0 => 500,
            1 => 200,
            2 => 100,
            _ => 0,
        };
        Duration::from_millis(ms)
    }
}

impl Default for AggressionLevel {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u8> for AggressionLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            return Err(format!("aggression level {value} out of range 0-4"));
        }
        Ok(Self(value))
    }
}

impl From<AggressionLevel> for u8 {
    fn from(level: AggressionLevel) -> Self {
        level.0
    }
}

impl fmt::Display for AggressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_table() {
        let expected = [
            (0, ScheduleMode::Sequential, 1, 500),
            (1, ScheduleMode::Sequential, 1, 200),
            (2, ScheduleMode::Sequential, 1, 100),
            (3, ScheduleMode::Pool, 10, 0),
            (4, ScheduleMode::Pool, 50, 0),
        ];
        for (level, mode, conc, delay_ms) in expected {
            let l = AggressionLevel::clamped(level);
            assert_eq!(l.mode(), mode, "level {level}");
            assert_eq!(l.concurrency(), conc, "level {level}");
            assert_eq!(l.delay(), Duration::from_millis(delay_ms), "level {level}");
        }
    }

    #[test]
    fn numeric_input_is_clamped() {
        assert_eq!(AggressionLevel::from_input("9").value(), 4);
        assert_eq!(AggressionLevel::from_input("-3").value(), 0);
        assert_eq!(AggressionLevel::from_input(" 3 ").value(), 3);
    }

    #[test]
    fn non_numeric_input_falls_back_to_one() {
        assert_eq!(AggressionLevel::try_from_input("fast"), None);
        assert_eq!(AggressionLevel::from_input("fast").value(), 1);
        assert_eq!(AggressionLevel::from_input("").value(), 1);
        assert_eq!(AggressionLevel::from_input("2.5").value(), 1);
    }

    #[test]
    fn out_of_range_u8_rejected() {
        assert!(AggressionLevel::try_from(5u8).is_err());
        assert_eq!(AggressionLevel::try_from(4u8).unwrap().value(), 4);
    }
}
