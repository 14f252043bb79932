//! Time sources for the generator.
//!
//! A [`Clock`] reports milliseconds since the custom epoch. The generator only
//! ever compares successive readings, so any source can be plugged in: the
//! wall clock in production, a scripted clock in tests.

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{SnowflakeError, CUSTOM_EPOCH_MILLIS, MAX_TIMESTAMP};

/// A source of timestamps, in milliseconds since a fixed epoch.
///
/// # Example
///
/// ```
/// use uid64::Clock;
///
/// struct FixedTime;
/// impl Clock for FixedTime {
///     fn current_millis(&self) -> i64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds since the clock's epoch.
    fn current_millis(&self) -> i64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }
}

/// Wall-clock time source backed by [`SystemTime`].
///
/// Readings follow the system clock, including any backward adjustment
/// (NTP corrections, VM migration). The generator detects those and refuses to
/// issue IDs until the clock catches up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemClock {
    epoch: i64, // Unix milliseconds of t = 0
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { epoch: CUSTOM_EPOCH_MILLIS }
    }
}

impl SystemClock {
    /// Creates a clock whose origin is `epoch`, given in milliseconds since
    /// 1970-01-01 UTC.
    ///
    /// # Errors
    ///
    /// [`SnowflakeError::InvalidEpoch`] unless `epoch` is in the past and the
    /// time elapsed since it fits in the 41-bit timestamp field.
    pub fn with_epoch(epoch: i64) -> Result<Self, SnowflakeError> {
        let elapsed = Self::unix_millis().saturating_sub(epoch);
        if !(1 ..= MAX_TIMESTAMP).contains(&elapsed) {
            return Err(SnowflakeError::InvalidEpoch(epoch));
        }
        Ok(Self { epoch })
    }

    /// The origin of this clock in Unix milliseconds.
    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    fn unix_millis() -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            // System time before 1970 shows up as negative time.
            Err(err) => i64::try_from(err.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
        }
    }
}

impl Clock for SystemClock {
    fn current_millis(&self) -> i64 {
        Self::unix_millis().saturating_sub(self.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_past_custom_epoch() {
        let clock = SystemClock::default();
        assert_eq!(clock.epoch(), CUSTOM_EPOCH_MILLIS);
        assert!(clock.current_millis() > 0);
    }

    #[test]
    fn test_unix_epoch_clock_matches_system_time() {
        let clock = SystemClock::with_epoch(0).unwrap();
        let expected = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as i64;
        let got = clock.current_millis();
        assert!((got - expected).abs() < 1_000, "got {got}, expected about {expected}");
    }

    #[test]
    fn test_invalid_epoch() {
        let future = SystemClock::unix_millis() + 60_000;
        assert_eq!(SystemClock::with_epoch(future), Err(SnowflakeError::InvalidEpoch(future)));
        assert_eq!(
            SystemClock::with_epoch(i64::MAX),
            Err(SnowflakeError::InvalidEpoch(i64::MAX))
        );

        // Already more than 2^41 ms ago: IDs would overflow into the sign bit.
        let ancient = CUSTOM_EPOCH_MILLIS - (1 << 41);
        assert_eq!(SystemClock::with_epoch(ancient), Err(SnowflakeError::InvalidEpoch(ancient)));
    }

    #[test]
    fn test_recent_epoch() {
        let epoch = SystemClock::unix_millis() - 60_000;
        let clock = SystemClock::with_epoch(epoch).unwrap();
        assert_eq!(clock.epoch(), epoch);
        assert!(clock.current_millis() >= 60_000);
    }

    #[test]
    fn test_shared_clock_delegates() {
        let clock = Arc::new(SystemClock::default());
        assert!(clock.current_millis() > 0);
        assert!((&clock).current_millis() > 0);
    }
}
