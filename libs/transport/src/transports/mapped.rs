//! Mapped ledger transport
//!
//! Every process maps the same file (normally under `/dev/shm`). The region
//! holds the encoded ledger followed by the handoff record:
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────┐
//! │ ledger (LEDGER_WIRE_SIZE)    │ handoff record (12 bytes)    │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```

use super::LedgerTransport;
use crate::error::{Result, TransportError};
use async_trait::async_trait;
use hotel_codec::{decode_ledger, decode_request, encode_ledger, encode_request};
use hotel_codec::{LEDGER_WIRE_SIZE, REQUEST_WIRE_SIZE};
use hotel_config::TransportKind;
use hotel_types::{ClientRequest, RoomLedger};
use memmap2::{MmapMut, MmapOptions};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Offset of the handoff record inside the region
pub const HANDOFF_OFFSET: usize = LEDGER_WIRE_SIZE;

/// Total size of the mapped region
pub const REGION_SIZE: usize = HANDOFF_OFFSET + REQUEST_WIRE_SIZE;

/// Ledger held in memory shared by every process
pub struct MappedLedger {
    region: Mutex<MmapMut>,
    backing: Option<PathBuf>,
    owner: bool,
}

impl MappedLedger {
    /// Create (or truncate) the backing file and publish an all-free ledger.
    /// The creator removes the file on drop.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| {
                TransportError::setup_with_source(format!("Failed to create {}", path.display()), e)
            })?;
        file.set_len(REGION_SIZE as u64).map_err(|e| {
            TransportError::setup_with_source(format!("Failed to size {}", path.display()), e)
        })?;

        let region = unsafe { MmapMut::map_mut(&file) }.map_err(|e| {
            TransportError::setup_with_source(format!("Failed to map {}", path.display()), e)
        })?;

        let ledger = Self {
            region: Mutex::new(region),
            backing: Some(path.to_path_buf()),
            owner: true,
        };
        ledger.store(&RoomLedger::new());

        info!("📒 Ledger mapped at {} ({} bytes)", path.display(), REGION_SIZE);
        Ok(ledger)
    }

    /// Map a ledger file created by the hosting process
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                TransportError::setup_with_source(format!("Failed to open {}", path.display()), e)
            })?;

        let len = file
            .metadata()
            .map_err(|e| TransportError::io(format!("Failed to stat {}", path.display()), e))?
            .len();
        if len < REGION_SIZE as u64 {
            return Err(TransportError::setup(format!(
                "{} is {} bytes, expected at least {}",
                path.display(),
                len,
                REGION_SIZE
            )));
        }

        let region = unsafe { MmapMut::map_mut(&file) }.map_err(|e| {
            TransportError::setup_with_source(format!("Failed to map {}", path.display()), e)
        })?;

        debug!("Attached to ledger at {}", path.display());
        Ok(Self {
            region: Mutex::new(region),
            backing: Some(path.to_path_buf()),
            owner: false,
        })
    }

    /// Anonymous mapping for processes that never fork
    pub fn anonymous() -> Result<Self> {
        let region = MmapOptions::new()
            .len(REGION_SIZE)
            .map_anon()
            .map_err(|e| TransportError::setup_with_source("Failed to map anonymous ledger", e))?;

        let ledger = Self {
            region: Mutex::new(region),
            backing: None,
            owner: true,
        };
        ledger.store(&RoomLedger::new());
        Ok(ledger)
    }

    /// Decode the ledger currently in the region
    pub fn snapshot(&self) -> Result<RoomLedger> {
        let region = self.region.lock();
        Ok(decode_ledger(&mut &region[..HANDOFF_OFFSET])?)
    }

    /// Overwrite the ledger in the region
    pub fn store(&self, ledger: &RoomLedger) {
        let mut region = self.region.lock();
        let mut dst = &mut region[..HANDOFF_OFFSET];
        encode_ledger(ledger, &mut dst);
    }

    /// Place the next agent's parameters in the handoff area
    pub fn write_handoff(&self, request: &ClientRequest) {
        let mut region = self.region.lock();
        let mut dst = &mut region[HANDOFF_OFFSET..REGION_SIZE];
        encode_request(request, &mut dst);
    }

    /// Copy the parameters out of the handoff area
    pub fn read_handoff(&self) -> Result<ClientRequest> {
        let region = self.region.lock();
        Ok(decode_request(&mut &region[HANDOFF_OFFSET..REGION_SIZE])?)
    }
}

#[async_trait]
impl LedgerTransport for MappedLedger {
    async fn read(&self) -> Result<RoomLedger> {
        self.snapshot()
    }

    async fn apply(&self, ledger: &RoomLedger) -> Result<RoomLedger> {
        self.store(ledger);
        self.snapshot()
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Mapped
    }
}

impl Drop for MappedLedger {
    fn drop(&mut self) {
        if !self.owner {
            return;
        }
        if let Some(path) = &self.backing {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed ledger file {}", path.display()),
                Err(e) => warn!("Failed to remove ledger file {}: {}", path.display(), e),
            }
        }
    }
}
