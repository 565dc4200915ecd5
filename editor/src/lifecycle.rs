//! Ordering and liveness guards for asynchronous UI work.
//!
//! A [`RequestSequence`] hands out increasing tokens; only the result
//! carrying the latest token is applied. A [`ViewScope`] marks the lifetime
//! of a view; continuations hold a [`ScopeHandle`] and drop their result
//! once the view is gone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }

    /// Makes every token issued so far stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

/// Lifetime marker owned by a view. Dropping it closes the scope.
#[derive(Debug)]
pub struct ViewScope {
    alive: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            alive: self.alive.clone(),
        }
    }

    pub fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Clone, Debug)]
pub struct ScopeHandle {
    alive: Arc<AtomicBool>,
}

impl ScopeHandle {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Runs `apply` with `value` only while the scope is alive. `None` means
    /// the view was gone and the value was dropped.
    pub fn deliver<T, R>(&self, value: T, apply: impl FnOnce(T) -> R) -> Option<R> {
        if !self.is_alive() {
            log::debug!("Dropping result for a closed view");
            return None;
        }
        Some(apply(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_token_is_current() {
        let mut sequence = RequestSequence::new();
        let first = sequence.next();
        let second = sequence.next();
        assert!(!sequence.is_latest(first));
        assert!(sequence.is_latest(second));
        assert!(second > first);
        sequence.invalidate();
        assert!(!sequence.is_latest(second));
    }

    #[test]
    fn closed_scope_drops_results() {
        let scope = ViewScope::new();
        let handle = scope.handle();
        let mut seen = Vec::new();
        assert_eq!(handle.deliver(1, |value| seen.push(value)), Some(()));
        drop(scope);
        assert!(!handle.is_alive());
        assert_eq!(handle.deliver(2, |value| seen.push(value)), None);
        assert_eq!(seen, vec![1]);
    }
}
