//! Small scheduling helpers.

use chrono::{DateTime, Utc};

/// True when moving the clock to `a` should trigger something waiting
/// until `b`.
#[inline]
pub(crate) fn equal_or_after(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a >= b
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    #[test]
    fn boundary_is_inclusive() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(equal_or_after(t, t));
        assert!(equal_or_after(t + TimeDelta::nanoseconds(1), t));
        assert!(!equal_or_after(t - TimeDelta::nanoseconds(1), t));
    }
}
