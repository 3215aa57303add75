//! # Hotel Transport
//!
//! IPC building blocks shared by the supervisor, the booking agents and the
//! standalone host:
//!
//! - [`Gate`]: the one-permit semaphore that serializes ledger mutations
//! - [`Rendezvous`]: paces the supervisor against agent startup
//! - [`LedgerTransport`]: whole-snapshot ledger access, implemented by
//!   [`MappedLedger`] (shared memory) and [`BrokeredLedger`] (FIFO client of
//!   a [`LedgerBroker`])
//!
//! Waits never block a thread: semaphores are polled with a short sleep so
//! a [`tokio_util::sync::CancellationToken`] can interrupt them.

pub mod error;
pub mod gate;
pub mod semaphore;
pub mod transports;

pub use error::{Result, TransportError};
pub use gate::{Gate, GateGuard, Rendezvous};
pub use semaphore::{LocalSemaphore, NamedSemaphore, Semaphore};
pub use transports::{
    mutate, BrokeredLedger, LedgerBroker, LedgerTransport, MappedLedger, HANDOFF_OFFSET,
    REGION_SIZE,
};
