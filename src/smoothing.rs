// Copyright 2026 Wayfare Modeling Group. All rights reserved.
// Wayfare Activity-Based Travel Model - Shadow Pricing Engine

//! Time-window smoothing of minute-of-day loads.
//!
//! A facility's instantaneous load at one minute undercounts true pressure
//! when arrivals scatter a few minutes either side of a peak; the windowed
//! peak prices local congestion instead of a single noisy sample.

/// Maximum of `loads` over `[minute - spread, minute + spread]`, clamped to
/// the array bounds. No wraparound across midnight; `spread = 0` degenerates
/// to the single-minute load.
pub fn windowed_peak(loads: &[f64], minute: usize, spread: usize) -> f64 {
    if loads.is_empty() {
        return 0.0;
    }
    let lo = minute.saturating_sub(spread);
    let hi = minute.saturating_add(spread).min(loads.len() - 1);

    loads[lo..=hi]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::state::MINUTES_PER_DAY;

    fn day_with_spike(minute: usize, height: f64) -> Vec<f64> {
        let mut loads = vec![0.0; MINUTES_PER_DAY];
        loads[minute] = height;
        loads
    }

    #[test]
    fn test_zero_spread_reads_single_minute() {
        let loads = day_with_spike(100, 7.0);
        assert_eq!(windowed_peak(&loads, 100, 0), 7.0);
        assert_eq!(windowed_peak(&loads, 101, 0), 0.0);
    }

    #[test]
    fn test_window_covers_both_sides() {
        let loads = day_with_spike(100, 7.0);
        assert_eq!(windowed_peak(&loads, 95, 5), 7.0);
        assert_eq!(windowed_peak(&loads, 105, 5), 7.0);
        assert_eq!(windowed_peak(&loads, 94, 5), 0.0);
        assert_eq!(windowed_peak(&loads, 106, 5), 0.0);
    }

    #[test]
    fn test_clamped_at_day_start() {
        // Window at minute 0 with spread 5 examines [0, 5] only.
        let mut loads = day_with_spike(5, 3.0);
        loads[6] = 9.0;
        assert_eq!(windowed_peak(&loads, 0, 5), 3.0);
    }

    #[test]
    fn test_clamped_at_day_end() {
        // Window at minute 1439 with spread 5 examines [1434, 1439] only.
        let mut loads = day_with_spike(1434, 4.0);
        loads[1433] = 9.0;
        assert_eq!(windowed_peak(&loads, MINUTES_PER_DAY - 1, 5), 4.0);
    }

    #[test]
    fn test_no_wraparound_across_midnight() {
        let loads = day_with_spike(0, 9.0);
        assert_eq!(windowed_peak(&loads, MINUTES_PER_DAY - 1, 5), 0.0);
        let loads = day_with_spike(MINUTES_PER_DAY - 1, 9.0);
        assert_eq!(windowed_peak(&loads, 0, 5), 0.0);
    }

    #[test]
    fn test_wide_spread_sees_whole_day() {
        let loads = day_with_spike(700, 2.5);
        assert_eq!(windowed_peak(&loads, 0, MINUTES_PER_DAY), 2.5);
    }

    #[test]
    fn test_extreme_spread_does_not_overflow() {
        let loads = day_with_spike(700, 2.5);
        assert_eq!(windowed_peak(&loads, MINUTES_PER_DAY - 1, usize::MAX), 2.5);
    }
}
