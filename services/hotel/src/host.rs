//! Shared resources owned by the hosting process
//!
//! The host creates the gate and the ledger for the configured transport:
//! a mapped file, or a broker task serving the FIFOs. Everything it created
//! is removed again on teardown.

use crate::error::{HotelError, Result};
use hotel_config::{IpcConfig, TransportKind};
use hotel_transport::{Gate, LedgerBroker, MappedLedger, TransportError};
use hotel_types::RoomLedger;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The canonical ledger, in whichever form the transport needs
pub enum HostedLedger {
    Mapped(Arc<MappedLedger>),
    Brokered {
        serving: JoinHandle<(LedgerBroker, std::result::Result<(), TransportError>)>,
        stop: CancellationToken,
    },
}

pub struct HotelResources {
    pub gate: Gate,
    pub ledger: HostedLedger,
}

impl HotelResources {
    /// Create every named resource for `ipc`
    pub fn create(ipc: &IpcConfig) -> Result<Self> {
        let gate = Gate::create_named(&ipc.gate_name, ipc.poll_interval())?;

        let ledger = match ipc.transport {
            TransportKind::Mapped => {
                HostedLedger::Mapped(Arc::new(MappedLedger::create(&ipc.ledger_path)?))
            }
            TransportKind::Brokered => {
                let mut broker = LedgerBroker::bind(&ipc.request_fifo, &ipc.response_fifo)?;
                let stop = CancellationToken::new();
                let serving = tokio::spawn({
                    let stop = stop.clone();
                    async move {
                        let result = broker.serve(stop).await;
                        (broker, result)
                    }
                });
                HostedLedger::Brokered { serving, stop }
            }
        };

        info!(
            transport = %ipc.transport,
            gate = %ipc.gate_name,
            "🏨 Hotel open with {} rooms",
            RoomLedger::new().free_rooms()
        );
        Ok(Self { gate, ledger })
    }

    /// Mapping to use for the handoff area, if the transport has one
    pub fn region(&self) -> Option<Arc<MappedLedger>> {
        match &self.ledger {
            HostedLedger::Mapped(region) => Some(region.clone()),
            HostedLedger::Brokered { .. } => None,
        }
    }

    /// Stop the broker and release every named resource
    pub async fn teardown(self) {
        let HotelResources { gate, ledger } = self;

        match ledger {
            HostedLedger::Brokered { serving, stop } => {
                stop.cancel();
                match serving.await {
                    Ok((broker, Ok(()))) => {
                        info!("Broker served {} frame(s)", broker.frames_served())
                    }
                    Ok((_, Err(e))) => warn!("Broker stopped with error: {}", e),
                    Err(e) => warn!("Broker task failed: {}", e),
                }
            }
            HostedLedger::Mapped(region) => drop(region),
        }

        // the gate unlinks its name on drop
        drop(gate);
        info!("🧹 Shared resources removed");
    }
}

/// Standalone host: serve until a termination signal, then tear down.
///
/// Always ends in [`HotelError::Terminated`], the only way a host stops.
pub async fn run_host(ipc: &IpcConfig, cancel: CancellationToken) -> Result<()> {
    let resources = HotelResources::create(ipc)?;
    info!("Waiting for agents; stop with SIGTERM or Ctrl-C");

    cancel.cancelled().await;
    resources.teardown().await;
    Err(HotelError::Terminated)
}
