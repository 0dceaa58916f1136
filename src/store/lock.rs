//! Per-resource lock manager for the pessimistic store
//!
//! Tracks which resource rows are exclusively held and blocks claimants of
//! the same resource until release or deadline. Claimants of different
//! resources never contend. Release happens through RAII guards, so locks
//! are freed on every exit path, including panics.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::time::Instant;

/// Lock manager over resource names.
///
/// Only exclusive locks exist here: the claim transaction is the sole
/// writer of a resource row, and the read path is read-committed and
/// lock-free.
pub struct ResourceLockManager {
    /// Resource names currently held exclusively
    held: Mutex<HashSet<String>>,

    /// Signalled whenever a lock is released
    released: Condvar,
}

impl ResourceLockManager {
    pub fn new() -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }

    /// Acquire the exclusive lock on a resource, waiting until `deadline`.
    ///
    /// Returns a guard that releases the lock when dropped, or
    /// `Error::LockTimeout` if the holder did not release in time.
    pub fn acquire(&self, resource: &str, deadline: Instant) -> Result<ResourceLockGuard<'_>> {
        let mut held = self.held.lock();

        while held.contains(resource) {
            let timed_out = self.released.wait_until(&mut held, deadline).timed_out();
            if timed_out && held.contains(resource) {
                return Err(Error::LockTimeout);
            }
        }

        held.insert(resource.to_string());

        Ok(ResourceLockGuard {
            manager: self,
            resource: resource.to_string(),
        })
    }

    /// Whether a resource is currently locked (for visibility/debugging)
    pub fn is_locked(&self, resource: &str) -> bool {
        self.held.lock().contains(resource)
    }

    fn release(&self, resource: &str) {
        let mut held = self.held.lock();
        held.remove(resource);
        // Wake all waiters; losers go back to waiting on the next holder
        self.released.notify_all();
    }
}

impl Default for ResourceLockManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive hold on one resource row, released on drop.
pub struct ResourceLockGuard<'a> {
    manager: &'a ResourceLockManager,
    resource: String,
}

impl Drop for ResourceLockGuard<'_> {
    fn drop(&mut self) {
        self.manager.release(&self.resource);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn deadline(millis: u64) -> Instant {
        Instant::now() + Duration::from_millis(millis)
    }

    #[test]
    fn test_acquire_and_release_on_drop() {
        let manager = ResourceLockManager::new();

        let guard = manager.acquire("summer", deadline(100)).unwrap();
        assert!(manager.is_locked("summer"));

        drop(guard);
        assert!(!manager.is_locked("summer"));
    }

    #[test]
    fn test_conflicting_acquire_times_out() {
        let manager = ResourceLockManager::new();

        let _guard = manager.acquire("summer", deadline(100)).unwrap();
        let result = manager.acquire("summer", deadline(20));
        assert_eq!(result.err(), Some(Error::LockTimeout));
    }

    #[test]
    fn test_distinct_resources_do_not_block() {
        let manager = ResourceLockManager::new();

        let _summer = manager.acquire("summer", deadline(100)).unwrap();
        let _winter = manager.acquire("winter", deadline(100)).unwrap();

        assert!(manager.is_locked("summer"));
        assert!(manager.is_locked("winter"));
    }

    #[test]
    fn test_waiter_proceeds_after_release() {
        let manager = std::sync::Arc::new(ResourceLockManager::new());

        let guard = manager.acquire("summer", deadline(100)).unwrap();

        let waiter = {
            let manager = manager.clone();
            std::thread::spawn(move || {
                manager
                    .acquire("summer", Instant::now() + Duration::from_secs(5))
                    .is_ok()
            })
        };

        std::thread::sleep(Duration::from_millis(50));
        drop(guard);

        assert!(waiter.join().unwrap());
        assert!(!manager.is_locked("summer"));
    }
}
