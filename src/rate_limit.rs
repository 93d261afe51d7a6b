// Denial is measured from the last admitted request, the counter reset from
// the window anchor. Existing clients depend on the gap between the two.

use dashmap::DashMap;
use serde::Serialize;

use crate::error::{GatewayError, GatewayResult};
use crate::identity::Identity;

pub const DEFAULT_MAX_PER_WINDOW: u32 = 4;
pub const DEFAULT_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_per_window: u32,
    pub window_secs: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_per_window: DEFAULT_MAX_PER_WINDOW,
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

// Counters for one identity, times in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateState {
    // admitted in the current window
    pub request_count: u32,
    // admitted ever, never reset
    pub visit_count: u64,
    pub last_request_time: u64,
    pub window_start_time: u64,
    pub remaining_quota: u32,
}

impl RateState {
    pub fn new(now: u64) -> Self {
        Self {
            request_count: 0,
            visit_count: 0,
            last_request_time: 0,
            window_start_time: now,
            remaining_quota: 0,
        }
    }

    // Check then commit. Over quota returns false with nothing changed.
    pub fn try_admit(&mut self, now: u64, policy: &RateLimitPolicy) -> bool {
        // a clock that steps backwards counts as zero elapsed
        let since_last = now.saturating_sub(self.last_request_time);
        if self.request_count >= policy.max_per_window && since_last < policy.window_secs {
            return false;
        }

        if now.saturating_sub(self.window_start_time) > policy.window_secs {
            self.request_count = 0;
            self.window_start_time = now;
        }

        self.request_count += 1;
        self.visit_count += 1;
        self.last_request_time = now;
        self.remaining_quota = policy.max_per_window.saturating_sub(self.request_count);
        true
    }
}

/// Storage for rate state. `admit` must be atomic per identity.
pub trait RateLimitStore: Send + Sync {
    fn admit(&self, identity: &Identity, now: u64) -> GatewayResult<RateState>;

    fn snapshot(&self, identity: &Identity) -> Option<RateState>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // returns how many identities were dropped
    fn evict_idle(&self, now: u64, idle_secs: u64) -> usize;

    fn policy(&self) -> RateLimitPolicy;
}

// In-process store keyed by identity
pub struct MemoryRateStore {
    entries: DashMap<Identity, RateState>,
    policy: RateLimitPolicy,
}

impl MemoryRateStore {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }
}

impl Default for MemoryRateStore {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}

impl RateLimitStore for MemoryRateStore {
    fn admit(&self, identity: &Identity, now: u64) -> GatewayResult<RateState> {
        // the entry guard holds the shard lock for the whole transition
        let mut entry = self
            .entries
            .entry(identity.clone())
            .or_insert_with(|| RateState::new(now));

        if entry.try_admit(now, &self.policy) {
            Ok(*entry)
        } else {
            Err(GatewayError::RateLimitExceeded {
                identity: identity.to_string(),
            })
        }
    }

    fn snapshot(&self, identity: &Identity) -> Option<RateState> {
        self.entries.get(identity).map(|entry| *entry)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn evict_idle(&self, now: u64, idle_secs: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, state| now.saturating_sub(state.last_request_time) < idle_secs);
        before.saturating_sub(self.entries.len())
    }

    fn policy(&self) -> RateLimitPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user(token: &str) -> Identity {
        Identity::from_token(token).unwrap()
    }

    #[test]
    fn first_request_is_admitted() {
        let store = MemoryRateStore::default();
        let state = store.admit(&user("USER900"), 1_000).unwrap();
        assert_eq!(state.request_count, 1);
        assert_eq!(state.visit_count, 1);
        assert_eq!(state.remaining_quota, DEFAULT_MAX_PER_WINDOW - 1);
        assert_eq!(state.window_start_time, 1_000);
        assert_eq!(state.last_request_time, 1_000);
    }

    #[test]
    fn fixed_window_scenario() {
        let store = MemoryRateStore::default();
        let id = user("USER001");

        for (t, left) in [(0, 3), (1, 2), (2, 1), (3, 0)] {
            assert_eq!(store.admit(&id, t).unwrap().remaining_quota, left, "t={t}");
        }

        let err = store.admit(&id, 4).unwrap_err();
        assert!(matches!(err, GatewayError::RateLimitExceeded { .. }));

        // past the anchor, but the last admit at t=3 is only 58s old
        assert!(store.admit(&id, 61).is_err());

        let state = store.admit(&id, 63).unwrap();
        assert_eq!(state.remaining_quota, 3);
        assert_eq!(state.request_count, 1);
        assert_eq!(state.window_start_time, 63);
        assert_eq!(state.visit_count, 5);
    }

    #[test]
    fn denial_does_not_mutate() {
        let store = MemoryRateStore::default();
        let id = user("USER002");
        for t in 0..4 {
            store.admit(&id, t).unwrap();
        }
        let before = store.snapshot(&id).unwrap();
        for t in 4..20 {
            assert!(store.admit(&id, t).is_err());
        }
        assert_eq!(store.snapshot(&id).unwrap(), before);
    }

    #[test]
    fn admission_uses_last_request_not_window_anchor() {
        let store = MemoryRateStore::default();
        let id = user("USER003");
        // anchor at 0, quota used up at 50
        for t in [0, 10, 20, 50] {
            store.admit(&id, t).unwrap();
        }
        // 60s after the anchor but only 10s after the last request
        assert!(store.admit(&id, 60).is_err());
        // 61s after the anchor still denied: last request was 11s ago
        assert!(store.admit(&id, 61).is_err());
        // exactly one window after the last request
        let state = store.admit(&id, 110).unwrap();
        assert_eq!(state.window_start_time, 110);
        assert_eq!(state.remaining_quota, 3);
    }

    #[test]
    fn boundary_admits_without_rollover() {
        let store = MemoryRateStore::default();
        let id = user("USER004");
        for _ in 0..4 {
            store.admit(&id, 0).unwrap();
        }
        // 60 - 0 is not < 60, so admitted; 60 - 0 is not > 60, so no reset
        let state = store.admit(&id, 60).unwrap();
        assert_eq!(state.request_count, 5);
        assert_eq!(state.window_start_time, 0);
        assert_eq!(state.remaining_quota, 0);
    }

    #[test]
    fn visit_count_ignores_denials() {
        let store = MemoryRateStore::default();
        let id = user("USER005");
        let mut admitted = 0;
        for t in 0..200 {
            if store.admit(&id, t).is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(store.snapshot(&id).unwrap().visit_count, admitted);
    }

    #[test]
    fn identities_are_independent() {
        let store = MemoryRateStore::new(RateLimitPolicy {
            max_per_window: 1,
            window_secs: 60,
        });
        assert!(store.admit(&user("USER010"), 0).is_ok());
        assert!(store.admit(&user("USER010"), 1).is_err());
        assert!(store.admit(&user("USER011"), 1).is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_admits_never_overshoot() {
        let store = Arc::new(MemoryRateStore::default());
        let admitted = Arc::new(AtomicUsize::new(0));
        let id = user("USER777");

        std::thread::scope(|scope| {
            for _ in 0..32 {
                let store = Arc::clone(&store);
                let admitted = Arc::clone(&admitted);
                let id = id.clone();
                scope.spawn(move || {
                    if store.admit(&id, 500).is_ok() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), DEFAULT_MAX_PER_WINDOW as usize);
        let state = store.snapshot(&id).unwrap();
        assert_eq!(state.request_count, DEFAULT_MAX_PER_WINDOW);
        assert_eq!(state.visit_count, u64::from(DEFAULT_MAX_PER_WINDOW));
    }

    #[test]
    fn evicts_only_idle_identities() {
        let store = MemoryRateStore::default();
        store.admit(&user("USER020"), 0).unwrap();
        store.admit(&user("USER021"), 100).unwrap();

        assert_eq!(store.evict_idle(110, 120), 0);
        assert_eq!(store.evict_idle(200, 120), 1);
        assert!(store.snapshot(&user("USER020")).is_none());
        assert!(store.snapshot(&user("USER021")).is_some());
    }
}
