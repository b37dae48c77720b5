//! Host time. The scheduler counts in ticks; by host convention 20 ticks
//! make one second.

/// Scheduler ticks.
pub type Ticks = u32;

/// Ticks in one second of host time.
pub const TICKS_PER_SECOND: Ticks = 20;

/// Unit for refresh cadence values handed to the hologram builder.
///
/// `Milliseconds` values are passed through as raw tick counts; the name is
/// kept for compatibility with existing callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSetting {
    Milliseconds,
    Seconds,
    Minutes,
}

impl TimeSetting {
    /// Convert `value` in this unit to scheduler ticks.
    pub fn to_ticks(self, value: u32) -> Ticks {
        match self {
            TimeSetting::Milliseconds => value,
            TimeSetting::Seconds => value * TICKS_PER_SECOND,
            TimeSetting::Minutes => value * TICKS_PER_SECOND * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_table() {
        assert_eq!(TimeSetting::Milliseconds.to_ticks(7), 7);
        assert_eq!(TimeSetting::Seconds.to_ticks(2), 40);
        assert_eq!(TimeSetting::Minutes.to_ticks(3), 3600);
    }

    #[test]
    fn test_minutes_equal_raw_ticks() {
        // two minutes and 2400 "milliseconds" schedule the same cadence
        assert_eq!(
            TimeSetting::Minutes.to_ticks(2),
            TimeSetting::Milliseconds.to_ticks(2400)
        );
    }
}
