//! Staleness policy for cached snapshots.

use chrono::{DateTime, Duration, Utc};

/// Clock seam so validity decisions never read the wall clock directly.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Decides whether a snapshot taken at some instant is still trustworthy.
///
/// Validity is a pure function of `(timestamp, now)`: the policy holds no
/// mutable state and never consults a clock of its own.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
  max_age: Duration,
}

impl CachePolicy {
  pub fn new(max_age: Duration) -> Self {
    Self { max_age }
  }

  /// True iff `now` is strictly inside the staleness window.
  pub fn validate(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now < timestamp + self.max_age
  }
}

impl Default for CachePolicy {
  /// Seven days, matching the default snapshot lifetime.
  fn default() -> Self {
    Self {
      max_age: Duration::days(7),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn policy_of_days(days: i64) -> CachePolicy {
    CachePolicy::new(Duration::days(days))
  }

  #[test]
  fn test_valid_inside_window() {
    let now = Utc::now();
    let timestamp = now - Duration::days(6);

    assert!(policy_of_days(7).validate(timestamp, now));
  }

  #[test]
  fn test_invalid_exactly_at_expiry() {
    let now = Utc::now();
    let timestamp = now - Duration::days(7);

    // `now == timestamp + window` is already expired
    assert!(!policy_of_days(7).validate(timestamp, now));
  }

  #[test]
  fn test_invalid_past_expiry() {
    let now = Utc::now();
    let timestamp = now - Duration::days(7) - Duration::seconds(1);

    assert!(!policy_of_days(7).validate(timestamp, now));
  }

  #[test]
  fn test_future_timestamp_is_valid() {
    let now = Utc::now();
    let timestamp = now + Duration::minutes(1);

    assert!(policy_of_days(7).validate(timestamp, now));
  }

  #[test]
  fn test_zero_window_rejects_everything() {
    let now = Utc::now();

    assert!(!policy_of_days(0).validate(now, now));
  }
}
