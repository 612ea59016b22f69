//! Cooperative shutdown signal shared by the dispatcher and all workers.
//!
//! Every suspension point in the pipeline (channel receive, gate
//! acquisition, rate limiter wait, subprocess execution) races against
//! [`Shutdown::triggered`], so a single [`Shutdown::trigger`] unwinds all of
//! them promptly.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::Cancelled;

/// Clonable handle to the process-wide shutdown flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Create a new, untriggered signal.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Fire the signal. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Check whether the signal has fired.
    #[inline]
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the signal fires.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        // The sender is owned by every clone of `self`, so it outlives this call.
        if rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Run `fut` to completion unless the signal fires first.
    ///
    /// When the signal wins, `fut` is dropped; subprocesses spawned with
    /// `kill_on_drop` are killed along with it.
    pub async fn race<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        if self.is_triggered() {
            return Err(Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.triggered() => Err(Cancelled),
            output = fut => Ok(output),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
