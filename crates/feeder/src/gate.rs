//! Bounded concurrency gates for clone and push operations.
//!
//! A [`Gate`] is a counting semaphore whose acquisition races against the
//! shutdown signal. Slots are handed out as [`GatePermit`] guards and go
//! back to the gate when the guard is dropped, whether the guarded
//! operation succeeded, failed or panicked.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::Cancelled;
use crate::shutdown::Shutdown;

/// A named, shared concurrency limit.
#[derive(Debug, Clone)]
pub struct Gate {
    name: &'static str,
    capacity: usize,
    semaphore: Arc<Semaphore>,
}

/// A held gate slot. Dropping it releases the slot.
#[derive(Debug)]
#[must_use = "the gate slot is released as soon as the permit is dropped"]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl Gate {
    /// Create a gate allowing `capacity` concurrent holders (at least one).
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Gate name, for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free slots right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a free slot unless shutdown fires first.
    ///
    /// A cancelled acquisition holds no slot.
    pub async fn acquire(&self, shutdown: &Shutdown) -> Result<GatePermit, Cancelled> {
        let permit = shutdown
            .race(Arc::clone(&self.semaphore).acquire_owned())
            .await?
            // The semaphore is never closed; treat closure like shutdown.
            .map_err(|_| Cancelled)?;

        tracing::trace!(gate = self.name, available = self.available(), "Gate acquired");
        Ok(GatePermit { _permit: permit })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn up_to_capacity_acquisitions_succeed_immediately() {
        let gate = Gate::new("clone", 3);
        let shutdown = Shutdown::new();

        let mut permits = Vec::new();
        for _ in 0..3 {
            let permit = tokio::time::timeout(Duration::from_millis(50), gate.acquire(&shutdown))
                .await
                .expect("acquire within capacity should not block")
                .expect("not cancelled");
            permits.push(permit);
        }

        assert_eq!(gate.available(), 0);
    }

    #[tokio::test]
    async fn acquisition_beyond_capacity_blocks_until_release() {
        let gate = Gate::new("push", 1);
        let shutdown = Shutdown::new();

        let first = gate.acquire(&shutdown).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), gate.acquire(&shutdown)).await;
        assert!(blocked.is_err(), "second acquisition should block");

        let waiter = {
            let gate = gate.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { gate.acquire(&shutdown).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be released")
            .unwrap();
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn cancelled_acquisition_consumes_no_slot() {
        let gate = Gate::new("clone", 1);
        let shutdown = Shutdown::new();

        let held = gate.acquire(&shutdown).await.unwrap();

        let waiter = {
            let gate = gate.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { gate.acquire(&shutdown).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should unwind promptly")
            .unwrap();
        assert_eq!(result, Err(Cancelled));

        drop(held);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn permit_is_released_when_guarded_task_panics() {
        let gate = Gate::new("push", 1);
        let shutdown = Shutdown::new();

        let task = {
            let gate = gate.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let _permit = gate.acquire(&shutdown).await.unwrap();
                panic!("guarded operation blew up");
            })
        };

        assert!(task.await.unwrap_err().is_panic());
        assert_eq!(gate.available(), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let gate = Gate::new("clone", 0);
        assert_eq!(gate.capacity(), 1);
        assert_eq!(gate.name(), "clone");
    }
}
