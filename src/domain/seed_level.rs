//! Seed hopper level as last observed by the sensor monitor.
//!
//! [`SeedLevel`] is written only by the monitor and read by every session
//! and by the command processor's safety check, so it is lock-free: a
//! single atomic holds the last raw sensor level (or "unset").

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

const UNSET: u8 = 0;
const LEVEL_LOW: u8 = 1;
const LEVEL_HIGH: u8 = 2;

/// Hopper status pushed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedStatus {
    /// Sensor blocked (level high): no seeds.
    Empty,
    /// Sensor clear (level low): seeds available.
    Normal,
}

impl SeedStatus {
    /// Maps a raw sensor level to a status. High means blocked.
    #[must_use]
    pub const fn from_level(level: bool) -> Self {
        if level { Self::Empty } else { Self::Normal }
    }

    /// Returns the status line written to clients.
    #[must_use]
    pub const fn wire_line(self) -> &'static str {
        match self {
            Self::Empty => "SEED_STATUS:EMPTY",
            Self::Normal => "SEED_STATUS:NORMAL",
        }
    }
}

impl fmt::Display for SeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_line())
    }
}

/// Shared seed level.
///
/// Until the first reading is recorded the level is unset and the hopper is
/// reported as [`SeedStatus::Normal`].
#[derive(Debug)]
pub struct SeedLevel {
    last_level: AtomicU8,
}

impl SeedLevel {
    /// Creates a level with no reading recorded yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_level: AtomicU8::new(UNSET),
        }
    }

    /// Records a raw sensor reading.
    ///
    /// Returns the new status when the reading differs from the previous
    /// one (the first reading always counts), `None` otherwise.
    pub fn record(&self, level: bool) -> Option<SeedStatus> {
        let encoded = if level { LEVEL_HIGH } else { LEVEL_LOW };
        let previous = self.last_level.swap(encoded, Ordering::AcqRel);
        (previous != encoded).then(|| SeedStatus::from_level(level))
    }

    /// Returns `true` if the last reading reported an empty hopper.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_level.load(Ordering::Acquire) == LEVEL_HIGH
    }

    /// Returns the last raw level, or `None` if nothing was recorded yet.
    #[must_use]
    pub fn last_known_level(&self) -> Option<bool> {
        match self.last_level.load(Ordering::Acquire) {
            LEVEL_HIGH => Some(true),
            LEVEL_LOW => Some(false),
            _ => None,
        }
    }

    /// Current status for a client's initial status line.
    #[must_use]
    pub fn status(&self) -> SeedStatus {
        if self.is_empty() {
            SeedStatus::Empty
        } else {
            SeedStatus::Normal
        }
    }
}

impl Default for SeedLevel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_level_reports_normal() {
        let level = SeedLevel::new();
        assert_eq!(level.last_known_level(), None);
        assert!(!level.is_empty());
        assert_eq!(level.status(), SeedStatus::Normal);
    }

    #[test]
    fn first_reading_is_a_transition() {
        let level = SeedLevel::new();
        assert_eq!(level.record(false), Some(SeedStatus::Normal));
        assert_eq!(level.last_known_level(), Some(false));
    }

    #[test]
    fn only_edges_are_reported() {
        let level = SeedLevel::new();
        let emitted: Vec<SeedStatus> = [false, false, true, true, false]
            .into_iter()
            .filter_map(|raw| level.record(raw))
            .collect();
        assert_eq!(
            emitted,
            vec![SeedStatus::Normal, SeedStatus::Empty, SeedStatus::Normal]
        );
    }

    #[test]
    fn high_level_marks_empty() {
        let level = SeedLevel::new();
        let _ = level.record(true);
        assert!(level.is_empty());
        assert_eq!(level.status(), SeedStatus::Empty);
    }

    #[test]
    fn wire_lines() {
        assert_eq!(SeedStatus::Empty.wire_line(), "SEED_STATUS:EMPTY");
        assert_eq!(SeedStatus::Normal.wire_line(), "SEED_STATUS:NORMAL");
    }
}
