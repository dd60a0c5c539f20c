//! Interval advisor: the polling interval callers should throttle to.
//!
//! Two independent signals each propose an interval and the larger one wins:
//!
//! | available slots | base     |   | calls in 15 s | frequency |
//! |-----------------|----------|---|---------------|-----------|
//! | < 10            | 30000 ms |   | > 20          | 15000 ms  |
//! | < 30            | 15000 ms |   | > 10          | 8000 ms   |
//! | < 50            | 8000 ms  |   | > 5           | 5000 ms   |
//! | otherwise       | 3000 ms  |   | otherwise     | 3000 ms   |

use std::time::Duration;

use crate::config::{MAX_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL};

/// Interval justified by the remaining minute budget.
pub fn base_interval(available_slots: usize) -> Duration {
    if available_slots < 10 {
        MAX_REFRESH_INTERVAL
    } else if available_slots < 30 {
        Duration::from_millis(15000)
    } else if available_slots < 50 {
        Duration::from_millis(8000)
    } else {
        MIN_REFRESH_INTERVAL
    }
}

/// Interval justified by recent call frequency across all endpoint kinds.
pub fn frequency_interval(total_calls: usize) -> Duration {
    if total_calls > 20 {
        Duration::from_millis(15000)
    } else if total_calls > 10 {
        Duration::from_millis(8000)
    } else if total_calls > 5 {
        Duration::from_millis(5000)
    } else {
        MIN_REFRESH_INTERVAL
    }
}

/// The more conservative of the two signals.
pub fn recommended_interval(available_slots: usize, total_calls: usize) -> Duration {
    base_interval(available_slots).max(frequency_interval(total_calls))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_interval_thresholds() {
        assert_eq!(base_interval(0), Duration::from_millis(30000));
        assert_eq!(base_interval(9), Duration::from_millis(30000));
        assert_eq!(base_interval(10), Duration::from_millis(15000));
        assert_eq!(base_interval(29), Duration::from_millis(15000));
        assert_eq!(base_interval(30), Duration::from_millis(8000));
        assert_eq!(base_interval(49), Duration::from_millis(8000));
        assert_eq!(base_interval(50), Duration::from_millis(3000));
        assert_eq!(base_interval(100), Duration::from_millis(3000));
    }

    #[test]
    fn test_frequency_interval_thresholds() {
        assert_eq!(frequency_interval(0), Duration::from_millis(3000));
        assert_eq!(frequency_interval(5), Duration::from_millis(3000));
        assert_eq!(frequency_interval(6), Duration::from_millis(5000));
        assert_eq!(frequency_interval(10), Duration::from_millis(5000));
        assert_eq!(frequency_interval(11), Duration::from_millis(8000));
        assert_eq!(frequency_interval(20), Duration::from_millis(8000));
        assert_eq!(frequency_interval(21), Duration::from_millis(15000));
    }

    #[test]
    fn test_larger_signal_wins() {
        // Plenty of budget but a burst of hovering
        assert_eq!(recommended_interval(90, 25), Duration::from_millis(15000));
        // Quiet but nearly out of budget
        assert_eq!(recommended_interval(5, 0), Duration::from_millis(30000));
        assert_eq!(recommended_interval(100, 0), MIN_REFRESH_INTERVAL);
    }

    #[test]
    fn test_recommended_interval_monotonic_and_bounded() {
        for slots in 0..=100 {
            for calls in 0..=40 {
                let interval = recommended_interval(slots, calls);
                assert!(interval >= MIN_REFRESH_INTERVAL && interval <= MAX_REFRESH_INTERVAL);
                if slots > 0 {
                    assert!(recommended_interval(slots - 1, calls) >= interval);
                }
                assert!(recommended_interval(slots, calls + 1) >= interval);
            }
        }
    }
}
