//! Ledger transports
//!
//! A transport moves whole-ledger snapshots between an agent and wherever
//! the canonical ledger lives. Both implementations give the same
//! guarantees to a caller that holds the gate: `read` returns the latest
//! published ledger and `apply` publishes a complete replacement.

use crate::error::Result;
use crate::gate::GateGuard;
use async_trait::async_trait;
use hotel_config::TransportKind;
use hotel_types::RoomLedger;

pub mod broker;
pub mod brokered;
pub mod mapped;

pub use broker::LedgerBroker;
pub use brokered::BrokeredLedger;
pub use mapped::{MappedLedger, HANDOFF_OFFSET, REGION_SIZE};

/// Whole-snapshot access to the canonical ledger
///
/// Neither method is atomic with respect to other processes on its own;
/// callers pair them under the gate through [`mutate`].
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Current canonical ledger
    async fn read(&self) -> Result<RoomLedger>;

    /// Replace the canonical ledger and return what was published
    async fn apply(&self, ledger: &RoomLedger) -> Result<RoomLedger>;

    /// Which variant this is, for logging
    fn kind(&self) -> TransportKind;
}

/// Read the ledger, let `f` change it, and publish the result.
///
/// The guard argument ties the whole read-modify-write to a held gate.
pub async fn mutate<T, F, R>(transport: &T, _held: &GateGuard<'_>, f: F) -> Result<(RoomLedger, R)>
where
    T: LedgerTransport + ?Sized,
    F: FnOnce(&mut RoomLedger) -> R,
{
    let mut ledger = transport.read().await?;
    let outcome = f(&mut ledger);
    let published = transport.apply(&ledger).await?;
    Ok((published, outcome))
}
