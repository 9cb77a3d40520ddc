// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Sources of the current time.
//!
//! Services receive a `Clock` at construction time instead of querying the system time directly
//! so that the timestamps they record, such as the creation time of a ride, can be fixed in tests.

use time::OffsetDateTime;

/// Drops the sub-microsecond part of `ts`.
///
/// Timestamps are persisted and serialized with microsecond precision at most, so keeping the
/// nanoseconds around would make values differ after a round trip.
fn truncate_to_micros(ts: OffsetDateTime) -> OffsetDateTime {
    ts.replace_nanosecond(ts.nanosecond() / 1000 * 1000).unwrap_or(ts)
}

/// Generic definition of a clock.
pub trait Clock {
    /// Returns the current UTC time with microsecond precision.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Clock backed by the system time.
#[derive(Clone, Default)]
pub struct SystemClock {}

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        truncate_to_micros(OffsetDateTime::now_utc())
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// A clock that stays at a fixed instant until explicitly moved forward.
    pub struct SettableClock {
        /// The instant returned by `now_utc`.
        now: Mutex<OffsetDateTime>,
    }

    impl SettableClock {
        /// Creates a new clock stopped at `now`, truncated to microseconds.
        pub fn new(now: OffsetDateTime) -> Self {
            Self { now: Mutex::new(truncate_to_micros(now)) }
        }

        /// Moves the clock forward by `delta`, truncated to microseconds.
        pub fn advance(&self, delta: Duration) {
            let mut now = self.now.lock().unwrap();
            *now = truncate_to_micros(*now + delta);
        }
    }

    impl Clock for SettableClock {
        fn now_utc(&self) -> OffsetDateTime {
            *self.now.lock().unwrap()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use time::macros::datetime;

        #[test]
        fn test_settable_clock_stays_put() {
            let clock = SettableClock::new(datetime!(2023-10-16 08:30:15 UTC));
            assert_eq!(datetime!(2023-10-16 08:30:15 UTC), clock.now_utc());
            assert_eq!(datetime!(2023-10-16 08:30:15 UTC), clock.now_utc());
        }

        #[test]
        fn test_settable_clock_advance() {
            let clock = SettableClock::new(datetime!(2023-10-16 08:30:15 UTC));
            clock.advance(Duration::from_secs(60));
            assert_eq!(datetime!(2023-10-16 08:31:15 UTC), clock.now_utc());
            clock.advance(Duration::from_micros(5));
            assert_eq!(datetime!(2023-10-16 08:31:15.000005 UTC), clock.now_utc());
        }

        #[test]
        fn test_settable_clock_truncates_to_micros() {
            let clock = SettableClock::new(datetime!(2023-10-16 08:30:15.123456789 UTC));
            assert_eq!(datetime!(2023-10-16 08:30:15.123456 UTC), clock.now_utc());
            clock.advance(Duration::from_nanos(999));
            assert_eq!(datetime!(2023-10-16 08:30:15.123456 UTC), clock.now_utc());
        }
    }
}
