//! Monotonic counter persisted in a namespace.

use super::Namespace;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use tracing::error;

/// A strictly increasing integer that is durable before it is handed out.
///
/// Values are never reused: every value returned by [`DurableCounter::next`]
/// has already been committed, so a crash between allocation and use only
/// burns the value.
pub struct DurableCounter {
    namespace: Mutex<Namespace>,
    key: String,
}

impl DurableCounter {
    /// Bind a counter to `key` inside `namespace`. Absent keys start at zero.
    pub fn open(namespace: Namespace, key: &str) -> Self {
        Self {
            namespace: Mutex::new(namespace),
            key: key.to_string(),
        }
    }

    /// Last value handed out (zero if none).
    pub fn current(&self) -> u64 {
        self.namespace.lock().get(&self.key).unwrap_or(0)
    }

    /// Increment, persist, then return the new value.
    pub fn next(&self) -> Result<u64> {
        let mut namespace = self.namespace.lock();
        let current = namespace.get(&self.key).unwrap_or(0);
        let next = current.checked_add(1).ok_or(Error::ResourceExhausted { limit: u64::MAX })?;

        namespace.set(&self.key, next);
        if let Err(e) = namespace.commit() {
            namespace.set(&self.key, current);
            error!(
                namespace = namespace.name(),
                key = %self.key,
                error = %e,
                "Counter commit failed; refusing to hand out a volatile value"
            );
            return Err(Error::CounterPersist(e.to_string()));
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn counter(dir: &TempDir) -> DurableCounter {
        let ns = Namespace::open(dir.path(), "storage").unwrap();
        DurableCounter::open(ns, "note_counter")
    }

    #[test]
    fn test_starts_at_one() {
        let dir = TempDir::new().unwrap();
        let counter = counter(&dir);
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.next().unwrap(), 1);
        assert_eq!(counter.next().unwrap(), 2);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let counter = counter(&dir);
            for _ in 0..5 {
                counter.next().unwrap();
            }
        }

        let counter = counter(&dir);
        assert_eq!(counter.current(), 5);
        assert_eq!(counter.next().unwrap(), 6);
    }

    #[test]
    fn test_commit_failure_surfaces_and_rolls_back() {
        let dir = TempDir::new().unwrap();
        let counter = counter(&dir);
        assert_eq!(counter.next().unwrap(), 1);

        // A directory squatting on the temp name makes the commit fail.
        fs::create_dir(dir.path().join("storage.kv.tmp")).unwrap();

        let result = counter.next();
        assert!(matches!(result, Err(Error::CounterPersist(_))));
        assert_eq!(counter.current(), 1);

        fs::remove_dir(dir.path().join("storage.kv.tmp")).unwrap();
        assert_eq!(counter.next().unwrap(), 2);
    }
}
