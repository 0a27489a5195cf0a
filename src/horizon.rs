//! Lead-time (horizon) computation for forecast rows.

use chrono::NaiveDateTime;

/// Hourly reconciliation only scores lead times inside this window. Rows at
/// horizon 0 (the generation hour itself) or beyond a day out are discarded.
pub const MIN_HORIZON_HOURS: i64 = 1;
pub const MAX_HORIZON_HOURS: i64 = 24;

/// Number of whole hours between a snapshot's generation time and a row's
/// target time, rounded half-to-even. The same rounding rule is applied
/// everywhere a horizon is derived.
///
/// # Arguments
///
/// * 'generation' - when the forecast snapshot was generated
/// * 'target' - the instant the row predicts
pub fn horizon_hours(generation: NaiveDateTime, target: NaiveDateTime) -> i64 {
    let seconds = (target - generation).num_seconds() as f64;
    (seconds / 3600.0).round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_whole_hour_horizons() {
        let generation = dt(1, 0, 0);
        assert_eq!(horizon_hours(generation, dt(1, 5, 0)), 5);
        assert_eq!(horizon_hours(generation, dt(1, 0, 0)), 0);
        assert_eq!(horizon_hours(generation, dt(2, 1, 0)), 25);
    }

    #[test]
    fn test_window_bounds() {
        let window = MIN_HORIZON_HOURS..=MAX_HORIZON_HOURS;
        assert!(!window.contains(&0));
        assert!(window.contains(&1));
        assert!(window.contains(&24));
        assert!(!window.contains(&25));
    }

    #[test]
    fn test_half_hours_round_to_even() {
        // 4.5h and 5.5h from generation: both round to the even neighbour
        let generation = dt(1, 10, 0);
        assert_eq!(horizon_hours(generation, dt(1, 14, 30)), 4);
        assert_eq!(horizon_hours(generation, dt(1, 15, 30)), 6);
        // 20 minutes off the hour still lands on the nearest hour
        assert_eq!(horizon_hours(generation, dt(1, 13, 40)), 4);
        assert_eq!(horizon_hours(generation, dt(1, 14, 20)), 4);
    }

    #[test]
    fn test_targets_before_generation_are_negative() {
        assert_eq!(horizon_hours(dt(2, 0, 0), dt(1, 21, 0)), -3);
        assert!(!(MIN_HORIZON_HOURS..=MAX_HORIZON_HOURS).contains(&-3));
    }
}
