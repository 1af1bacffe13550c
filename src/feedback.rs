//! Filter usage counting and the "request feedback" decision.
//!
//! Each filter change bumps a persisted counter. Once it reaches the
//! threshold the app may ask for a review. How often that happens is a
//! [`FeedbackPolicy`]:
//!
//! - [`FirstCrossing`](FeedbackPolicy::FirstCrossing): only on the change
//!   that brings the counter to the threshold, so once per preferences file.
//! - [`EveryTime`](FeedbackPolicy::EveryTime): on every change once the
//!   counter is at or past the threshold.

use crate::store::PreferenceStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackPolicy {
    #[default]
    FirstCrossing,
    EveryTime,
}

impl FeedbackPolicy {
    /// Whether a counter that just became `count` should trigger a request.
    pub fn should_request(self, count: u32, threshold: u32) -> bool {
        match self {
            FeedbackPolicy::FirstCrossing => count == threshold,
            FeedbackPolicy::EveryTime => count >= threshold,
        }
    }
}

/// Counts filter changes and decides when to ask for feedback.
#[derive(Debug, Clone)]
pub struct UsageTracker {
    store: PreferenceStore,
    threshold: u32,
    policy: FeedbackPolicy,
}

impl UsageTracker {
    pub fn new(store: PreferenceStore, threshold: u32, policy: FeedbackPolicy) -> Self {
        Self {
            store,
            threshold,
            policy,
        }
    }

    /// Record one filter change. Returns `true` when feedback should be
    /// requested.
    pub fn record_filter_change(&mut self) -> bool {
        let count = self.store.increment_filter_count();
        self.policy.should_request(count, self.threshold)
    }

    pub fn filter_count(&self) -> u32 {
        self.store.filter_count()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn policy(&self) -> FeedbackPolicy {
        self.policy
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new(PreferenceStore::in_memory(), 3, FeedbackPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requests(policy: FeedbackPolicy, changes: usize) -> Vec<bool> {
        let mut tracker = UsageTracker::new(PreferenceStore::in_memory(), 3, policy);
        (0..changes).map(|_| tracker.record_filter_change()).collect()
    }

    #[test]
    fn first_crossing_fires_once() {
        assert_eq!(
            requests(FeedbackPolicy::FirstCrossing, 6),
            vec![false, false, true, false, false, false]
        );
    }

    #[test]
    fn every_time_fires_from_threshold_on() {
        assert_eq!(
            requests(FeedbackPolicy::EveryTime, 5),
            vec![false, false, true, true, true]
        );
    }

    #[test]
    fn counter_resumes_from_persisted_value() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = crate::store::preferences_path(tmp.path());

        let mut first = UsageTracker::new(
            PreferenceStore::load(&path),
            3,
            FeedbackPolicy::FirstCrossing,
        );
        assert!(!first.record_filter_change());
        assert!(!first.record_filter_change());

        // New session: the third change overall crosses the threshold.
        let mut second = UsageTracker::new(
            PreferenceStore::load(&path),
            3,
            FeedbackPolicy::FirstCrossing,
        );
        assert_eq!(second.filter_count(), 2);
        assert!(second.record_filter_change());
        assert!(!second.record_filter_change());
    }

    #[test]
    fn policy_parses_from_kebab_case() {
        let p: FeedbackPolicy = serde_json::from_str("\"every-time\"").unwrap();
        assert_eq!(p, FeedbackPolicy::EveryTime);
    }

    #[test]
    fn default_tracker_matches_stock_settings() {
        let t = UsageTracker::default();
        assert_eq!(t.threshold(), 3);
        assert_eq!(t.policy(), FeedbackPolicy::FirstCrossing);
        assert_eq!(t.filter_count(), 0);
    }
}
