//! Login Lockout Policy
//!
//! Pure state machine over `(attempts, lock_until)`. Nothing here reads the
//! clock: every transition takes `now` explicitly.
//!
//! ```text
//! Unlocked(attempts < 5) --5th failure--> Locked(until = now + 30m)
//! Locked(until) --failure after until--> Unlocked(attempts = 1)
//! any --success--> Unlocked(attempts = 0)
//! ```

use chrono::{DateTime, Duration, Utc};

pub const MAX_LOGIN_ATTEMPTS: u32 = 5;
pub const LOCK_DURATION_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockoutState {
    pub attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Locked {
        until: DateTime<Utc>,
        /// Whole minutes, rounded up
        minutes_remaining: i64,
    },
}

impl LockoutState {
    /// Rejection never touches the counter
    pub fn check_admission(&self, now: DateTime<Utc>) -> Admission {
        match self.lock_until {
            Some(until) if now <= until => {
                let millis = (until - now).num_milliseconds();
                Admission::Locked {
                    until,
                    minutes_remaining: ((millis + 59_999) / 60_000).max(1),
                }
            }
            _ => Admission::Admitted,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.check_admission(now), Admission::Locked { .. })
    }

    pub fn record_failure(self, now: DateTime<Utc>) -> Self {
        if let Some(until) = self.lock_until {
            if now > until {
                // The failing attempt seeds the new window
                return Self {
                    attempts: 1,
                    lock_until: None,
                };
            }
        }

        let attempts = self.attempts.saturating_add(1);
        let lock_until = if attempts >= MAX_LOGIN_ATTEMPTS && self.lock_until.is_none() {
            Some(now + Duration::minutes(LOCK_DURATION_MINUTES))
        } else {
            self.lock_until
        };

        Self {
            attempts,
            lock_until,
        }
    }

    pub fn record_success(self) -> Self {
        Self::default()
    }

    pub fn attempts_remaining(&self) -> u32 {
        MAX_LOGIN_ATTEMPTS.saturating_sub(self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fail_times(mut state: LockoutState, n: u32, now: DateTime<Utc>) -> LockoutState {
        for _ in 0..n {
            state = state.record_failure(now);
        }
        state
    }

    #[test]
    fn test_initial_state_admits() {
        let state = LockoutState::default();
        assert_eq!(state.check_admission(Utc::now()), Admission::Admitted);
        assert_eq!(state.attempts_remaining(), MAX_LOGIN_ATTEMPTS);
    }

    #[test]
    fn test_fifth_failure_locks() {
        let now = Utc::now();
        let state = fail_times(LockoutState::default(), 4, now);
        assert_eq!(state.attempts, 4);
        assert!(state.lock_until.is_none());
        assert_eq!(state.attempts_remaining(), 1);

        let state = state.record_failure(now);
        assert_eq!(state.attempts, 5);
        assert_eq!(state.attempts_remaining(), 0);
        assert_eq!(
            state.lock_until,
            Some(now + Duration::minutes(LOCK_DURATION_MINUTES))
        );

        match state.check_admission(now) {
            Admission::Locked {
                minutes_remaining, ..
            } => assert_eq!(minutes_remaining, 30),
            other => panic!("expected lock, got {:?}", other),
        }
    }

    #[test]
    fn test_lock_boundary_is_inclusive() {
        let now = Utc::now();
        let state = fail_times(LockoutState::default(), 5, now);
        let until = state.lock_until.unwrap();

        assert!(state.is_locked(until));
        assert!(!state.is_locked(until + Duration::milliseconds(1)));
    }

    #[test]
    fn test_minutes_remaining_rounds_up() {
        let now = Utc::now();
        let state = LockoutState {
            attempts: 5,
            lock_until: Some(now + Duration::seconds(61)),
        };
        assert!(matches!(
            state.check_admission(now),
            Admission::Locked {
                minutes_remaining: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_failure_after_expiry_restarts_counter() {
        let now = Utc::now();
        let locked = fail_times(LockoutState::default(), 5, now);
        let later = now + Duration::minutes(LOCK_DURATION_MINUTES + 1);

        assert_eq!(locked.check_admission(later), Admission::Admitted);

        let state = locked.record_failure(later);
        assert_eq!(state.attempts, 1);
        assert!(state.lock_until.is_none());
    }

    #[test]
    fn test_failure_during_lock_keeps_original_window() {
        let now = Utc::now();
        let locked = fail_times(LockoutState::default(), 5, now);
        let state = locked.record_failure(now + Duration::minutes(1));
        assert_eq!(state.lock_until, locked.lock_until);
    }

    #[test]
    fn test_success_resets() {
        let now = Utc::now();
        let state = fail_times(LockoutState::default(), 3, now).record_success();
        assert_eq!(state, LockoutState::default());
    }
}
