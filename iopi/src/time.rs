use embedded_time::clock::Error;
use embedded_time::duration::Milliseconds;
use embedded_time::Instant;

/// A duration, in milliseconds
pub type Millis = Milliseconds<u64>;

/// Supertrait of [`embedded_time::Clock`] pinning the
/// type of "ticks" to u64
pub trait Clock: embedded_time::Clock<T = u64> {}
impl<C: embedded_time::Clock<T = u64>> Clock for C {}

/// Milliseconds elapsed between `since` and `now`.
///
/// Yields zero if `now` is earlier than `since`.
pub fn millis_between<C: Clock>(since: Instant<C>, now: Instant<C>) -> Result<Millis, Error> {
  match now.checked_duration_since(&since) {
    | Some(dur) => Millis::try_from(dur).map_err(|_| Error::Unspecified),
    | None => Ok(Milliseconds(0)),
  }
}

#[cfg(test)]
mod tests {
  use embedded_time::Clock as _;

  use super::*;
  use crate::test::ClockMock;

  #[test]
  fn between() {
    let clock = ClockMock::new();
    let start = clock.try_now().unwrap();
    clock.advance_millis(1500);
    let now = clock.try_now().unwrap();

    assert_eq!(millis_between(start, now).unwrap(), Milliseconds(1500u64));
    assert_eq!(millis_between(now, start).unwrap(), Milliseconds(0u64));
  }
}
