use core::ops::RangeInclusive;

use embedded_time::duration::Milliseconds;
use embedded_time::Instant;
use rand::{Rng, SeedableRng};

use crate::time::{millis_between, Clock, Millis};

/// A non-blocking timer that allows a fixed-delay retry,
/// that lives alongside some operation to retry.
///
/// The first attempt is assumed to have happened when the timer was created.
/// Each time the operation fails, ask [`RetryTimer::what_should_i_do`]:
/// it blocks (`WouldBlock`) until the next attempt is due, then says to
/// [`Retry`](YouShould::Retry), or to [`Cry`](YouShould::Cry) once
/// the final attempt has also had its full delay to succeed.
///
/// ```
/// use embedded_time::clock::Clock;
/// use embedded_time::duration::Milliseconds;
/// use iopi::retry;
///
/// let mut called = false;
/// let mut fails_once = || -> Result<(), ()> {
///   // ...
///   # if !called {
///   #   called = true;
///   #   Err(())
///   # } else {
///   #   Ok(())
///   # }
/// };
///
/// let clock = iopi::platform::Clock::new();
/// let now = || clock.try_now().unwrap();
/// let strategy = retry::Strategy::Delay { min: Milliseconds(1),
///                                         max: Milliseconds(2) };
/// let mut retry = retry::RetryTimer::new(now(), strategy, retry::Attempts(2));
///
/// while let Err(_) = fails_once() {
///   match nb::block!(retry.what_should_i_do(now())) {
///     | Ok(retry::YouShould::Retry) => continue,
///     | Ok(retry::YouShould::Cry) => panic!("no more attempts! it failed more than once!!"),
///     | Err(clock_err) => unreachable!(),
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryTimer<C: Clock> {
  start: Instant<C>,
  init: Millis,
  strategy: Strategy,
  attempts: Attempts,
  max_attempts: Attempts,
}

/// A number of attempts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attempts(pub u16);

/// Result of [`RetryTimer.what_should_i_do`].
///
/// This tells you if a retry should be attempted or not.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum YouShould {
  /// Attempts have been exhausted and the work that is
  /// being retried should be considered poisoned.
  Cry,
  /// A retry should be performed
  Retry,
}

impl<C: Clock> RetryTimer<C> {
  /// Create a new retrier
  pub fn new(start: Instant<C>, strategy: Strategy, max_attempts: Attempts) -> Self {
    Self { start,
           strategy,
           init: if strategy.has_jitter() {
             let seed = Millis::try_from(start.duration_since_epoch()).map(|Milliseconds(ms)| ms)
                                                                      .unwrap_or(0);
             let mut rand = rand_chacha::ChaCha8Rng::seed_from_u64(seed);

             Milliseconds(rand.gen_range(strategy.range()))
           } else {
             Milliseconds(*strategy.range().start())
           },
           max_attempts,
           attempts: Attempts(1) }
  }

  /// Number of attempts made so far, including the first
  pub fn attempts(&self) -> Attempts {
    self.attempts
  }

  /// When the thing we keep trying fails, invoke this to
  /// tell the retrytimer "it failed again! what do I do??"
  ///
  /// Returns `nb::Error::WouldBlock` when we have not yet
  /// waited the appropriate amount of time to retry.
  pub fn what_should_i_do(&mut self,
                          now: Instant<C>)
                          -> nb::Result<YouShould, embedded_time::clock::Error> {
    let passed = millis_between(self.start, now).map_err(nb::Error::Other)?;

    if !self.is_ready(passed, self.attempts.0) {
      Err(nb::Error::WouldBlock)
    } else if self.attempts >= self.max_attempts {
      Ok(YouShould::Cry)
    } else {
      self.attempts.0 += 1;
      Ok(YouShould::Retry)
    }
  }

  /// Check if the strategy says an appropriate time has passed
  pub fn is_ready(&self, Milliseconds(time_passed): Millis, attempts: u16) -> bool {
    if attempts == 0 {
      return true;
    }

    match self.strategy {
      | Strategy::Delay { .. } => time_passed >= (self.init.0 * attempts as u64),
    }
  }
}

/// Strategy to employ when retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
  /// Generate a random delay between `min` and `max`,
  /// and wait until this delay has passed between attempts.
  Delay {
    /// Minimum (inclusive) delay for attempts
    min: Millis,
    /// Maximum (inclusive) delay for attempts
    max: Millis,
  },
}

impl Strategy {
  /// A delay of exactly `ms` between attempts
  pub const fn fixed(ms: u64) -> Self {
    Self::Delay { min: Milliseconds(ms),
                  max: Milliseconds(ms) }
  }

  /// Are min & max delays the same? if so, we should probably skip the random number generation.
  pub fn has_jitter(&self) -> bool {
    let rng = self.range();
    rng.start() != rng.end()
  }

  /// Get the min & max durations as an inclusive range
  pub fn range(&self) -> RangeInclusive<u64> {
    match self {
      | &Self::Delay { min: Milliseconds(min),
                       max: Milliseconds(max), } => (min..=max),
    }
  }

  /// Get the amount of time this strategy will take if all attempts fail
  pub fn max_time(&self, max_attempts: Attempts) -> Millis {
    Milliseconds(match self {
                   | Self::Delay { max: Milliseconds(max),
                                   .. } => max * max_attempts.0 as u64,
                 })
  }
}

#[cfg(test)]
mod test {
  use embedded_time::Clock as _;

  use super::*;
  use crate::test::ClockMock;

  #[test]
  fn delay_retrier() {
    let clock = ClockMock::new();
    let now = || clock.try_now().unwrap();
    let mut retry = RetryTimer::new(now(), Strategy::fixed(1000), Attempts(4));

    // attempt 1 happens before asking what_should_i_do

    clock.set_millis(999);
    assert_eq!(retry.what_should_i_do(now()).unwrap_err(),
               nb::Error::WouldBlock);

    clock.set_millis(1000);
    assert_eq!(retry.what_should_i_do(now()).unwrap(), YouShould::Retry);
    // Fails again (attempt 2)

    clock.set_millis(1999);
    assert_eq!(retry.what_should_i_do(now()).unwrap_err(),
               nb::Error::WouldBlock);

    clock.set_millis(2000);
    assert_eq!(retry.what_should_i_do(now()).unwrap(), YouShould::Retry);
    // Fails again (attempt 3)

    clock.set_millis(3000);
    assert_eq!(retry.what_should_i_do(now()).unwrap(), YouShould::Retry);
    // Fails again (attempt 4), which gets its full delay too

    clock.set_millis(3999);
    assert_eq!(retry.what_should_i_do(now()).unwrap_err(),
               nb::Error::WouldBlock);
    assert_eq!(retry.attempts(), Attempts(4));

    clock.set_millis(4000);
    assert_eq!(retry.what_should_i_do(now()).unwrap(), YouShould::Cry);
  }

  #[test]
  fn jitter_stays_in_range() {
    let clock = ClockMock::new();
    clock.set_millis(1234);
    let strategy = Strategy::Delay { min: Milliseconds(100),
                                     max: Milliseconds(200) };
    let retry = RetryTimer::new(clock.try_now().unwrap(), strategy, Attempts(2));

    assert!(strategy.has_jitter());
    assert!(strategy.range().contains(&retry.init.0));
  }

  #[test]
  fn max_time() {
    assert_eq!(Strategy::fixed(1000).max_time(Attempts(4)), Milliseconds(4000u64));
    assert!(!Strategy::fixed(1000).has_jitter());
  }
}
