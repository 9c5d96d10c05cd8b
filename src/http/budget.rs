//! API call budget
//!
//! Hard ceiling on outbound calls for the lifetime of the process. Unlike
//! the pacing [`RateLimiter`](super::RateLimiter), a budget never waits: once
//! spent, every further request is refused.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared counter of issued API calls with a fixed ceiling.
///
/// Clones share the same counter, so one budget can be handed to several
/// concurrent runs.
#[derive(Debug, Clone)]
pub struct CallBudget {
    limit: u64,
    issued: Arc<AtomicU64>,
}

impl CallBudget {
    /// Create a budget allowing `limit` calls
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Reserve one call.
    ///
    /// Returns `true` and counts the call if doing so keeps the total within
    /// the limit; otherwise leaves the counter untouched and returns `false`.
    pub fn try_consume(&self) -> bool {
        self.issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |issued| {
                (issued < self.limit).then_some(issued + 1)
            })
            .is_ok()
    }

    /// Calls issued so far
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }

    /// Configured ceiling
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

#[cfg(test)]
mod budget_tests {
    use super::*;

    #[test]
    fn test_budget_allows_up_to_limit() {
        let budget = CallBudget::new(3);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert_eq!(budget.issued(), 3);
        assert!(!budget.try_consume());
    }

    #[test]
    fn test_budget_refusal_does_not_increment() {
        let budget = CallBudget::new(1);
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.issued(), 1);
    }

    #[test]
    fn test_zero_budget_refuses_everything() {
        let budget = CallBudget::new(0);
        assert!(!budget.try_consume());
        assert_eq!(budget.issued(), 0);
    }

    #[test]
    fn test_clones_share_counter() {
        let budget = CallBudget::new(2);
        let other = budget.clone();
        assert!(budget.try_consume());
        assert!(other.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(other.issued(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consumers_never_exceed_limit() {
        let budget = CallBudget::new(100);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let budget = budget.clone();
            handles.push(tokio::spawn(async move {
                let mut granted = 0u64;
                for _ in 0..50 {
                    if budget.try_consume() {
                        granted += 1;
                    }
                }
                granted
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert_eq!(total, 100);
        assert_eq!(budget.issued(), 100);
    }
}
