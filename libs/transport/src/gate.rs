//! The gate and the rendezvous
//!
//! Both are one-permit semaphores with a cancellable wait. The gate
//! serializes every read-modify-write of the ledger; holding a
//! [`GateGuard`] is the only way to call [`crate::mutate`]. The rendezvous
//! paces the supervisor: it waits on it before dispatching the next agent,
//! and each agent signals it once its parameters are copied out.

use crate::error::{Result, TransportError};
use crate::semaphore::{LocalSemaphore, NamedSemaphore, Semaphore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Poll `permit` until it yields or `cancel` fires
async fn wait_for_permit(
    permit: &dyn Semaphore,
    poll_interval: Duration,
    cancel: &CancellationToken,
    operation: &str,
) -> Result<()> {
    loop {
        if cancel.is_cancelled() {
            return Err(TransportError::cancelled(operation));
        }
        if permit.try_acquire()? {
            return Ok(());
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(TransportError::cancelled(operation)),
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}

/// Exclusive access to the ledger across every process
///
/// The permit is returned when the [`GateGuard`] drops, including on error
/// paths. A process killed while holding a guard never returns it: the
/// semaphore stays at 0 and every later [`Gate::acquire`] waits until
/// cancelled. There is no lease or timeout; recovering needs a fresh host,
/// which unlinks and recreates the named semaphore.
#[derive(Clone)]
pub struct Gate {
    permit: Arc<dyn Semaphore>,
    poll_interval: Duration,
}

impl Gate {
    pub fn new(permit: Arc<dyn Semaphore>, poll_interval: Duration) -> Self {
        Self {
            permit,
            poll_interval,
        }
    }

    /// Create the named gate, open
    pub fn create_named(name: &str, poll_interval: Duration) -> Result<Self> {
        Ok(Self::new(
            Arc::new(NamedSemaphore::create(name, 1)?),
            poll_interval,
        ))
    }

    /// Attach to a named gate created by the hosting process
    pub fn open_named(name: &str, poll_interval: Duration) -> Result<Self> {
        Ok(Self::new(
            Arc::new(NamedSemaphore::open(name)?),
            poll_interval,
        ))
    }

    /// In-process gate
    pub fn local(poll_interval: Duration) -> Self {
        Self::new(Arc::new(LocalSemaphore::new(1)), poll_interval)
    }

    /// Block until the gate is held or `cancel` fires
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<GateGuard<'_>> {
        wait_for_permit(
            self.permit.as_ref(),
            self.poll_interval,
            cancel,
            "acquiring the gate",
        )
        .await?;
        trace!("Gate acquired");
        Ok(GateGuard {
            gate: self,
            released: false,
        })
    }

    /// True when nobody holds the gate
    pub fn is_open(&self) -> Result<bool> {
        Ok(self.permit.available()? > 0)
    }
}

/// Proof that the gate is held; releases it when dropped
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard<'a> {
    gate: &'a Gate,
    released: bool,
}

impl GateGuard<'_> {
    /// Release now and report a failed post
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        trace!("Gate released");
        self.gate.permit.release()
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.gate.permit.release() {
                warn!("Failed to release gate: {}", e);
            }
        }
    }
}

/// Handoff pacing between the supervisor and a freshly launched agent
#[derive(Clone)]
pub struct Rendezvous {
    permit: Arc<dyn Semaphore>,
    poll_interval: Duration,
}

impl Rendezvous {
    pub fn new(permit: Arc<dyn Semaphore>, poll_interval: Duration) -> Self {
        Self {
            permit,
            poll_interval,
        }
    }

    /// Create the named rendezvous with one permit, so the first dispatch
    /// does not wait
    pub fn create_named(name: &str, poll_interval: Duration) -> Result<Self> {
        Ok(Self::new(
            Arc::new(NamedSemaphore::create(name, 1)?),
            poll_interval,
        ))
    }

    pub fn open_named(name: &str, poll_interval: Duration) -> Result<Self> {
        Ok(Self::new(
            Arc::new(NamedSemaphore::open(name)?),
            poll_interval,
        ))
    }

    pub fn local(poll_interval: Duration) -> Self {
        Self::new(Arc::new(LocalSemaphore::new(1)), poll_interval)
    }

    /// Supervisor side: wait until the previous agent took its parameters
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        wait_for_permit(
            self.permit.as_ref(),
            self.poll_interval,
            cancel,
            "waiting for the handoff",
        )
        .await
    }

    /// Supervisor side: consume the acknowledgment if it already arrived
    pub fn try_take(&self) -> Result<bool> {
        self.permit.try_acquire()
    }

    /// Agent side: parameters are copied, the next agent may be dispatched
    pub fn acknowledge(&self) -> Result<()> {
        self.permit.release()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const POLL: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let gate = Gate::local(POLL);
        let cancel = CancellationToken::new();

        let guard = gate.acquire(&cancel).await.unwrap();
        assert!(!gate.is_open().unwrap());
        drop(guard);
        assert!(gate.is_open().unwrap());

        gate.acquire(&cancel).await.unwrap().release().unwrap();
        assert!(gate.is_open().unwrap());
    }

    #[tokio::test]
    async fn test_acquire_is_cancellable() {
        let gate = Gate::local(POLL);
        let cancel = CancellationToken::new();
        let _held = gate.acquire(&cancel).await.unwrap();

        let waiter = CancellationToken::new();
        let trigger = waiter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = gate.acquire(&waiter).await.err().unwrap();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_abandoned_guard_keeps_gate_closed() {
        let gate = Gate::local(POLL);
        let cancel = CancellationToken::new();

        // a holder that dies never runs its guard's drop
        std::mem::forget(gate.acquire(&cancel).await.unwrap());
        assert!(!gate.is_open().unwrap());

        let waiter = CancellationToken::new();
        let trigger = waiter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });
        assert!(gate.acquire(&waiter).await.err().unwrap().is_cancelled());
        assert!(!gate.is_open().unwrap());
    }

    #[tokio::test]
    async fn test_gate_serializes_holders() {
        let gate = Gate::local(POLL);
        let inside = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            let inside = inside.clone();
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = gate.acquire(&cancel).await.unwrap();
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert!(gate.is_open().unwrap());
    }

    #[tokio::test]
    async fn test_rendezvous_paces_dispatch() {
        let rendezvous = Rendezvous::local(POLL);
        let cancel = CancellationToken::new();

        // first dispatch proceeds immediately
        rendezvous.wait(&cancel).await.unwrap();
        assert!(!rendezvous.try_take().unwrap());

        rendezvous.acknowledge().unwrap();
        assert!(rendezvous.try_take().unwrap());
    }
}
