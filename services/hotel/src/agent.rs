//! Booking agent
//!
//! One agent serves one client: claim a room under the gate, hold it for
//! the rent duration with the gate free, then release it under the gate.
//! There are no retries; a transport failure ends the agent.

use crate::error::{HotelError, Result};
use hotel_transport::{mutate, Gate, LedgerTransport, MappedLedger, Rendezvous};
use hotel_types::{BookingOutcome, ClientRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Where an agent finds its client record
pub enum RequestSource<'a> {
    /// The handoff area of the shared mapping
    Handoff(&'a MappedLedger),
    /// Passed directly (launch arguments or an in-process call)
    Arguments(ClientRequest),
}

pub struct BookingAgent {
    gate: Gate,
    transport: Arc<dyn LedgerTransport>,
    rent_unit: Duration,
}

impl BookingAgent {
    pub fn new(gate: Gate, transport: Arc<dyn LedgerTransport>, rent_unit: Duration) -> Self {
        Self {
            gate,
            transport,
            rent_unit,
        }
    }

    /// Copy the client record, acknowledge the handoff, then book.
    pub async fn start(
        &self,
        source: RequestSource<'_>,
        rendezvous: Option<&Rendezvous>,
        cancel: &CancellationToken,
    ) -> Result<BookingOutcome> {
        let request = match source {
            RequestSource::Handoff(region) => region.read_handoff()?,
            RequestSource::Arguments(request) => request,
        };

        // The supervisor may overwrite the handoff area from here on
        if let Some(rendezvous) = rendezvous {
            rendezvous.acknowledge()?;
        }

        self.run(request, cancel).await
    }

    /// Claim, hold and release a room for `request`
    #[instrument(name = "agent", skip_all, fields(client_id = %request.id))]
    pub async fn run(
        &self,
        request: ClientRequest,
        cancel: &CancellationToken,
    ) -> Result<BookingOutcome> {
        info!(
            gender = %request.gender,
            rent = request.rent_duration,
            transport = %self.transport.kind(),
            "👤 Client arrived"
        );

        let guard = self.gate.acquire(cancel).await?;
        let (_, outcome) =
            mutate(self.transport.as_ref(), &guard, |ledger| ledger.claim(&request)).await?;
        guard.release()?;

        let Some((kind, index)) = outcome.room() else {
            info!(outcome = %outcome, "🚫 Out of service: no room available");
            return Ok(outcome);
        };
        info!(room_kind = %kind, room = index, outcome = %outcome, "🛏️ Room booked");

        tokio::select! {
            _ = cancel.cancelled() => {
                warn!(room_kind = %kind, room = index, "Terminated during stay, room stays booked");
                return Err(HotelError::Terminated);
            }
            _ = tokio::time::sleep(request.hold_time(self.rent_unit)) => {}
        }

        let guard = self.gate.acquire(cancel).await?;
        let (_, released) = mutate(self.transport.as_ref(), &guard, |ledger| {
            ledger.release(&request, outcome)
        })
        .await?;
        guard.release()?;
        let status = released?;

        info!(
            room_kind = %kind,
            room = index,
            status = ?status,
            "👋 Stay complete, room released"
        );
        Ok(outcome)
    }
}
