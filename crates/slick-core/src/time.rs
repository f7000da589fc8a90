//! Conversions between `chrono` timestamps and `f64` seconds.
//!
//! Model times are [`NaiveDateTime`]; timesteps and durations are plain
//! seconds so sub-second partial steps stay exact enough for rate math.

use chrono::{NaiveDateTime, TimeDelta};

/// Signed seconds from `from` to `to`, with nanosecond resolution.
pub fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let d = to - from;
    d.num_seconds() as f64 + f64::from(d.subsec_nanos()) * 1e-9
}

/// `t` shifted by `secs` seconds, rounded to the nearest nanosecond.
///
/// Non-finite or out-of-range offsets saturate to the chrono limits.
pub fn add_seconds(t: NaiveDateTime, secs: f64) -> NaiveDateTime {
    let nanos = (secs * 1e9).round();
    let delta = if nanos >= i64::MAX as f64 {
        TimeDelta::MAX
    } else if nanos <= i64::MIN as f64 || nanos.is_nan() {
        TimeDelta::MIN
    } else {
        TimeDelta::nanoseconds(nanos as i64)
    };
    t.checked_add_signed(delta).unwrap_or(if secs >= 0.0 {
        NaiveDateTime::MAX
    } else {
        NaiveDateTime::MIN
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2012, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn seconds_between_is_signed() {
        let t1 = add_seconds(t0(), 3600.0);
        assert_eq!(seconds_between(t0(), t1), 3600.0);
        assert_eq!(seconds_between(t1, t0()), -3600.0);
    }

    #[test]
    fn sub_second_offsets_survive() {
        let t1 = add_seconds(t0(), 0.25);
        assert!((seconds_between(t0(), t1) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn negative_offsets_go_backward() {
        let t1 = add_seconds(t0(), -100.0);
        assert!(t1 < t0());
        assert_eq!(seconds_between(t1, t0()), 100.0);
    }
}
