//! Brokered ledger transport, agent side
//!
//! Requests go out on one FIFO and replies come back on another. Every
//! agent shares the same reply FIFO, so an exchange is only safe while the
//! gate is held.

use super::LedgerTransport;
use crate::error::{Result, TransportError};
use async_trait::async_trait;
use hotel_codec::{FrameTag, LedgerFrame, ProtocolError, FRAME_SIZE};
use hotel_config::TransportKind;
use hotel_types::RoomLedger;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe;
use tokio::sync::Mutex;
use tracing::{debug, trace};

struct Channel {
    requests: pipe::Sender,
    replies: pipe::Receiver,
}

/// Client of a [`super::LedgerBroker`]
pub struct BrokeredLedger {
    channel: Mutex<Channel>,
    request_path: PathBuf,
}

impl BrokeredLedger {
    /// Attach to the broker's FIFOs. Both must already exist.
    pub fn connect(request_fifo: impl AsRef<Path>, response_fifo: impl AsRef<Path>) -> Result<Self> {
        let request_fifo = request_fifo.as_ref();
        let response_fifo = response_fifo.as_ref();

        // read-write opens never block on a missing peer
        let requests = pipe::OpenOptions::new()
            .read_write(true)
            .open_sender(request_fifo)
            .map_err(|e| open_error(request_fifo, e))?;
        let replies = pipe::OpenOptions::new()
            .read_write(true)
            .open_receiver(response_fifo)
            .map_err(|e| open_error(response_fifo, e))?;

        debug!(
            "Connected to ledger broker via {} / {}",
            request_fifo.display(),
            response_fifo.display()
        );
        Ok(Self {
            channel: Mutex::new(Channel { requests, replies }),
            request_path: request_fifo.to_path_buf(),
        })
    }

    /// One request frame out, one reply frame back
    async fn exchange(&self, frame: LedgerFrame) -> Result<LedgerFrame> {
        let mut channel = self.channel.lock().await;

        channel
            .requests
            .write_all(&frame.encode())
            .await
            .map_err(|e| TransportError::io("Failed to send ledger frame", e))?;

        let mut buf = [0u8; FRAME_SIZE];
        channel
            .replies
            .read_exact(&mut buf)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => {
                    TransportError::closed(format!("broker at {}", self.request_path.display()))
                }
                _ => TransportError::io("Failed to receive ledger frame", e),
            })?;

        let reply = LedgerFrame::decode(&buf)?;
        trace!("Exchanged {:?} for {:?} reply", frame.tag, reply.tag);
        Ok(reply)
    }
}

fn open_error(path: &Path, source: io::Error) -> TransportError {
    TransportError::setup_with_source(format!("Failed to open FIFO {}", path.display()), source)
}

#[async_trait]
impl LedgerTransport for BrokeredLedger {
    async fn read(&self) -> Result<RoomLedger> {
        Ok(self.exchange(LedgerFrame::get()).await?.ledger)
    }

    async fn apply(&self, ledger: &RoomLedger) -> Result<RoomLedger> {
        let reply = self.exchange(LedgerFrame::set(*ledger)).await?;
        if reply.tag != FrameTag::Set || reply.ledger != *ledger {
            return Err(ProtocolError::AckMismatch(
                "broker did not echo the ledger it was sent".to_string(),
            )
            .into());
        }
        Ok(reply.ledger)
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Brokered
    }
}
