use std::time::Duration;

/// One scheduled step of the simulated progress curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    /// Offset from submission time at which this step fires.
    pub at: Duration,
    pub percent: u8,
}

impl Milestone {
    pub const fn new(seconds: u64, percent: u8) -> Self {
        Self {
            at: Duration::from_secs(seconds),
            percent,
        }
    }
}

/// Default simulated curve: front-loaded early motion, then a slow crawl
/// toward 100 at 165s, roughly tracking how long a cold deployment takes.
pub const DEFAULT_MILESTONES: &[Milestone] = &[
    Milestone::new(0, 1),
    Milestone::new(5, 7),
    Milestone::new(12, 16),
    Milestone::new(20, 26),
    Milestone::new(30, 38),
    Milestone::new(45, 52),
    Milestone::new(60, 64),
    Milestone::new(80, 74),
    Milestone::new(100, 82),
    Milestone::new(120, 89),
    Milestone::new(140, 94),
    Milestone::new(155, 98),
    Milestone::new(165, 100),
];

/// Fallback generator cadence: +5 points every 5 seconds, never past 90.
/// Armed only when the primary curve has produced no motion at all.
pub const FALLBACK_STEP: u8 = 5;
pub const FALLBACK_PERIOD: Duration = Duration::from_secs(5);
pub const FALLBACK_CAP: u8 = 90;

/// Poll ticks the bar may sit at zero while processing before the fallback
/// generator is armed.
pub const STALL_TICK_THRESHOLD: u32 = 2;

/// Total span of a milestone schedule.
pub fn schedule_total(milestones: &[Milestone]) -> Duration {
    milestones.last().map(|m| m.at).unwrap_or(Duration::ZERO)
}

/// Whole seconds left before the schedule finishes; advisory display only.
pub fn remaining_seconds(total: Duration, elapsed: Duration) -> u64 {
    total.saturating_sub(elapsed).as_secs()
}

/// A usable schedule is non-empty, opens at `(0, 1)` or later than zero
/// percent, and is strictly increasing in both offset and percent.
pub fn schedule_is_valid(milestones: &[Milestone]) -> bool {
    let Some(first) = milestones.first() else {
        return false;
    };
    if first.percent == 0 {
        return false;
    }
    milestones
        .windows(2)
        .all(|pair| pair[0].at < pair[1].at && pair[0].percent < pair[1].percent)
}

#[cfg(test)]
#[path = "tests/progress_tests.rs"]
mod tests;
