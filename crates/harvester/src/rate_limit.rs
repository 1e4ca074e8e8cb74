//! Jittered delays used to stay under provider rate limits.

use rand::Rng;

use super::*;

/// A fixed delay plus a uniformly random jitter in `[0, jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimit {
  /// Minimum pause between requests
  pub delay:  Duration,
  /// Upper bound (exclusive) of the random extra pause
  pub jitter: Duration,
}

impl RateLimit {
  /// Creates a rate limit from a delay and a jitter bound.
  pub fn new(delay: Duration, jitter: Duration) -> Self { Self { delay, jitter } }

  /// Creates a rate limit from fractional seconds, clamping negatives to zero.
  ///
  /// # Errors
  ///
  /// Returns [`HarvesterError::Config`] for infinite or out-of-range values.
  pub fn from_secs_f64(delay: f64, jitter: f64) -> Result<Self> {
    Ok(Self::new(duration_from_secs(delay)?, duration_from_secs(jitter)?))
  }

  /// A rate limit that never waits.
  pub fn none() -> Self { Self::default() }

  /// Draws the next pause length.
  pub fn next_pause(&self) -> Duration {
    self.delay + self.jitter.mul_f64(rand::thread_rng().gen::<f64>())
  }

  /// Sleeps for [`RateLimit::next_pause`].
  pub async fn pause(&self) {
    let pause = self.next_pause();
    if pause.is_zero() {
      return;
    }
    trace!("Sleeping for {:.2}s", pause.as_secs_f64());
    tokio::time::sleep(pause).await;
  }
}

/// Converts fractional seconds into a [`Duration`], clamping negatives and NaN to zero.
///
/// # Errors
///
/// Returns [`HarvesterError::Config`] if `seconds` is infinite or too large for a [`Duration`].
pub fn duration_from_secs(seconds: f64) -> Result<Duration> {
  Duration::try_from_secs_f64(seconds.max(0.0))
    .map_err(|e| HarvesterError::Config(format!("invalid delay of {seconds} seconds: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pause_stays_within_bounds() {
    let limit = RateLimit::new(Duration::from_millis(50), Duration::from_millis(100));
    for _ in 0..1000 {
      let pause = limit.next_pause();
      assert!(pause >= Duration::from_millis(50));
      assert!(pause < Duration::from_millis(150));
    }
  }

  #[test]
  fn test_no_jitter_is_exact() {
    let limit = RateLimit::from_secs_f64(5.0, 0.0).unwrap();
    assert_eq!(limit.next_pause(), Duration::from_secs(5));
    assert_eq!(RateLimit::from_secs_f64(-1.0, -1.0).unwrap(), RateLimit::none());
  }

  #[test]
  fn test_unbounded_delays_are_rejected() {
    assert!(matches!(duration_from_secs(f64::INFINITY), Err(HarvesterError::Config(_))));
    assert!(matches!(duration_from_secs(1e300), Err(HarvesterError::Config(_))));
    assert!(matches!(RateLimit::from_secs_f64(1.0, f64::INFINITY), Err(HarvesterError::Config(_))));
    assert_eq!(duration_from_secs(f64::NAN).unwrap(), Duration::ZERO);
    assert_eq!(duration_from_secs(f64::NEG_INFINITY).unwrap(), Duration::ZERO);
  }

  #[tokio::test]
  async fn test_none_returns_immediately() {
    let started = std::time::Instant::now();
    RateLimit::none().pause().await;
    assert!(started.elapsed() < Duration::from_secs(1));
  }
}
